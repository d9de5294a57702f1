// SPDX-License-Identifier: GPL-3.0-only

//! Declarative description of the capture pipeline
//!
//! The layout is plain data: building it never touches GStreamer, which
//! keeps ordering and configuration checks testable without plugins.

use crate::config::Config;
use crate::constants::{element_names, factories, properties};
use crate::errors::{AppError, AppResult};
use std::collections::HashSet;
use std::fmt;

/// Position of a stage in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageRole {
    /// Capture source
    Source,
    /// Caps filter
    Filter,
    /// Format converter
    Converter,
    /// Display sink
    Sink,
}

impl StageRole {
    /// All roles in link order
    pub const ALL: [StageRole; 4] = [
        StageRole::Source,
        StageRole::Filter,
        StageRole::Converter,
        StageRole::Sink,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            StageRole::Source => "source",
            StageRole::Filter => "filter",
            StageRole::Converter => "converter",
            StageRole::Sink => "sink",
        }
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Value assigned to an element property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Caps string, parsed before it is set
    Caps(String),
    /// Any other value, deserialized by GStreamer according to the property type
    Text(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyValue::Caps(s) | PropertyValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Text(value.into()),
        }
    }

    pub fn caps(caps: impl Into<String>) -> Self {
        Self {
            name: properties::CAPS.to_string(),
            value: PropertyValue::Caps(caps.into()),
        }
    }
}

/// One stage of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub role: StageRole,
    /// Registry factory name, e.g. `v4l2src`
    pub factory: String,
    /// Element name inside the pipeline
    pub name: Option<String>,
    /// Properties applied in order right after creation
    pub properties: Vec<Property>,
}

impl StageSpec {
    pub fn new(role: StageRole, factory: impl Into<String>) -> Self {
        Self {
            role,
            factory: factory.into(),
            name: None,
            properties: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Name used in diagnostics: the element name, else the factory
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.factory)
    }
}

/// Source → filter → converter → sink
///
/// The array length fixes the stage count; the order of `stages` is the
/// link order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineLayout {
    stages: [StageSpec; 4],
}

impl PipelineLayout {
    pub fn new(source: StageSpec, filter: StageSpec, converter: StageSpec, sink: StageSpec) -> Self {
        Self {
            stages: [source, filter, converter, sink],
        }
    }

    /// Build the layout described by a configuration
    pub fn from_config(config: &Config) -> Self {
        let mut source = StageSpec::new(StageRole::Source, &config.source)
            .named(element_names::SOURCE);
        if !config.device.is_empty() {
            source = source.with_property(Property::text(properties::DEVICE, &config.device));
        }
        for (name, value) in &config.source_properties {
            source = source.with_property(Property::text(name, value));
        }

        let filter = StageSpec::new(StageRole::Filter, factories::FILTER)
            .named(element_names::FILTER)
            .with_property(Property::caps(&config.caps));

        let converter =
            StageSpec::new(StageRole::Converter, &config.converter).named(element_names::CONVERTER);

        let mut sink = StageSpec::new(StageRole::Sink, &config.sink).named(element_names::SINK);
        for (name, value) in &config.sink_properties {
            sink = sink.with_property(Property::text(name, value));
        }

        Self::new(source, filter, converter, sink)
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn stage(&self, role: StageRole) -> &StageSpec {
        match role {
            StageRole::Source => &self.stages[0],
            StageRole::Filter => &self.stages[1],
            StageRole::Converter => &self.stages[2],
            StageRole::Sink => &self.stages[3],
        }
    }

    /// Adjacent (upstream, downstream) pairs in link order
    pub fn links(&self) -> impl Iterator<Item = (&StageSpec, &StageSpec)> {
        self.stages.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Checks that need no GStreamer registry
    pub fn validate(&self) -> AppResult<()> {
        for (stage, role) in self.stages.iter().zip(StageRole::ALL) {
            if stage.role != role {
                return Err(AppError::Config(format!(
                    "stage '{}' is a {} but sits in the {} slot",
                    stage.label(),
                    stage.role,
                    role
                )));
            }
            if stage.factory.trim().is_empty() {
                return Err(AppError::Config(format!("{} factory name is empty", role)));
            }
            for property in &stage.properties {
                if let PropertyValue::Caps(caps) = &property.value
                    && caps.trim().is_empty()
                {
                    return Err(AppError::Config(format!(
                        "caps for '{}' are empty",
                        stage.label()
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for name in self.stages.iter().filter_map(|s| s.name.as_deref()) {
            if !seen.insert(name) {
                return Err(AppError::Config(format!(
                    "element name '{}' is used twice",
                    name
                )));
            }
        }

        Ok(())
    }
}
