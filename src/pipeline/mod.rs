// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipeline assembly
//!
//! - [`layout`]: what the pipeline looks like (pure data)
//! - [`webcam`]: turning a layout into GStreamer elements

pub mod layout;
pub mod webcam;

pub use layout::{PipelineLayout, Property, PropertyValue, StageRole, StageSpec};
pub use webcam::WebcamPipeline;
