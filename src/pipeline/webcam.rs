// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer pipeline for webcam preview
//!
//! Creates a pipeline that:
//! 1. Captures frames from the configured source (v4l2src by default)
//! 2. Constrains them to the configured caps (capsfilter)
//! 3. Converts format as needed (videoconvert)
//! 4. Displays them (xvimagesink by default)

use super::layout::{PipelineLayout, Property, PropertyValue, StageSpec};
use crate::bus::BusMessage;
use crate::constants::BUS_DRAIN_TIMEOUT_MS;
use crate::errors::{AppError, AppResult, AssemblyError};
use crate::lifecycle::Container;
use gstreamer::glib;
use gstreamer::prelude::*;
use std::str::FromStr;
use tracing::{debug, info};

/// Assembled capture pipeline
///
/// Owns the pipeline and its four stage elements. Nothing is started until
/// [`Container::start`] is called.
pub struct WebcamPipeline {
    pipeline: gstreamer::Pipeline,
    stages: Vec<gstreamer::Element>,
}

impl WebcamPipeline {
    /// Create, configure, add and link every stage of `layout`
    ///
    /// GStreamer must already be initialised. Any failure aborts the whole
    /// assembly; no partially linked pipeline is returned.
    pub fn build(layout: &PipelineLayout) -> AppResult<Self> {
        layout.validate()?;
        info!("Creating webcam pipeline");

        let pipeline = gstreamer::Pipeline::new();

        let stages = layout
            .stages()
            .iter()
            .map(make_stage)
            .collect::<Result<Vec<_>, _>>()?;

        pipeline
            .add_many(&stages)
            .map_err(|e| AssemblyError::AddFailed(e.to_string()))?;

        for (upstream, downstream) in stages.iter().zip(stages.iter().skip(1)) {
            upstream
                .link(downstream)
                .map_err(|_| AssemblyError::LinkFailed {
                    upstream: upstream.name().to_string(),
                    downstream: downstream.name().to_string(),
                })?;
            debug!(
                upstream = %upstream.name(),
                downstream = %downstream.name(),
                "Linked stages"
            );
        }

        let webcam = Self { pipeline, stages };
        info!(
            chain = %webcam.stage_names().join(" -> "),
            "Webcam pipeline created successfully"
        );

        Ok(webcam)
    }

    /// Message bus of the pipeline
    pub fn bus(&self) -> AppResult<gstreamer::Bus> {
        self.pipeline
            .bus()
            .ok_or_else(|| AssemblyError::NoBus.into())
    }

    /// Element names in link order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|e| e.name().to_string()).collect()
    }

    /// Stage elements in link order
    pub fn stages(&self) -> &[gstreamer::Element] {
        &self.stages
    }

    pub fn pipeline(&self) -> &gstreamer::Pipeline {
        &self.pipeline
    }

    /// Current state without waiting for pending transitions
    pub fn current_state(&self) -> gstreamer::State {
        self.pipeline.current_state()
    }
}

impl Container for WebcamPipeline {
    fn start(&self) -> AppResult<()> {
        debug!("Starting webcam pipeline");
        let result = self.pipeline.set_state(gstreamer::State::Playing)?;
        info!(?result, "Webcam pipeline set to Playing");
        Ok(())
    }

    fn stop(&self) -> AppResult<()> {
        debug!("Stopping webcam pipeline");
        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| AppError::State(format!("Failed to stop pipeline: {}", e)))?;
        info!("Webcam pipeline stopped");
        Ok(())
    }

    fn pending_messages(&self) -> Vec<BusMessage> {
        let Some(bus) = self.pipeline.bus() else {
            return Vec::new();
        };
        std::iter::from_fn(|| {
            bus.timed_pop_filtered(
                gstreamer::ClockTime::from_mseconds(BUS_DRAIN_TIMEOUT_MS),
                &[
                    gstreamer::MessageType::Error,
                    gstreamer::MessageType::Warning,
                ],
            )
        })
        .map(|message| BusMessage::from_gst(&message))
        .collect()
    }
}

/// Create one element from the registry and apply its properties
fn make_stage(spec: &StageSpec) -> Result<gstreamer::Element, AssemblyError> {
    if gstreamer::ElementFactory::find(&spec.factory).is_none() {
        return Err(AssemblyError::ElementUnavailable {
            factory: spec.factory.clone(),
        });
    }

    let mut builder = gstreamer::ElementFactory::make(&spec.factory);
    if let Some(name) = &spec.name {
        builder = builder.name(name.as_str());
    }
    let element = builder
        .build()
        .map_err(|e| AssemblyError::ElementCreation {
            factory: spec.factory.clone(),
            reason: e.to_string(),
        })?;

    for property in &spec.properties {
        apply_property(&element, property)?;
    }

    debug!(
        role = %spec.role,
        factory = %spec.factory,
        name = %element.name(),
        "Created stage"
    );
    Ok(element)
}

/// Set a property, checking it exists and that the value converts
///
/// `set_property` panics on both conditions, so they are checked up front.
fn apply_property(
    element: &gstreamer::Element,
    property: &Property,
) -> Result<(), AssemblyError> {
    let element_name = element.name().to_string();

    let pspec = element
        .find_property(&property.name)
        .filter(|pspec| pspec.flags().contains(glib::ParamFlags::WRITABLE))
        .ok_or_else(|| AssemblyError::UnknownProperty {
            element: element_name.clone(),
            property: property.name.clone(),
        })?;

    let value = match &property.value {
        PropertyValue::Caps(caps) => {
            let caps =
                gstreamer::Caps::from_str(caps).map_err(|e| AssemblyError::InvalidCaps {
                    caps: caps.clone(),
                    reason: e.to_string(),
                })?;
            if pspec.value_type() != gstreamer::Caps::static_type() {
                return Err(AssemblyError::InvalidPropertyValue {
                    element: element_name,
                    property: property.name.clone(),
                    value: property.value.as_str().to_string(),
                });
            }
            caps.to_value()
        }
        PropertyValue::Text(text) => glib::Value::deserialize(text, pspec.value_type())
            .map_err(|_| AssemblyError::InvalidPropertyValue {
                element: element_name.clone(),
                property: property.name.clone(),
                value: text.clone(),
            })?,
    };

    element.set_property_from_value(&property.name, &value);
    debug!(
        element = %element_name,
        property = %property.name,
        value = %property.value.as_str(),
        "Set property"
    );
    Ok(())
}
