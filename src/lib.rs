// SPDX-License-Identifier: GPL-3.0-only

//! playwebcam - webcam preview through a GStreamer pipeline
//!
//! Assembles `v4l2src ! capsfilter ! videoconvert ! xvimagesink` (each stage
//! configurable), then runs a GLib main loop that reacts to bus messages
//! until end-of-stream, error, a fault, or Ctrl+C.
//!
//! # Architecture
//!
//! - [`pipeline`]: declarative layout and its GStreamer assembly
//! - [`bus`]: bus message dispatch
//! - [`lifecycle`]: start / run / stop around the main loop
//! - [`config`]: user configuration handling

pub mod bus;
pub mod config;
pub mod constants;
pub mod errors;
pub mod lifecycle;
pub mod pipeline;

// Re-export commonly used types
pub use bus::{BusMessage, LoopControl, Report, Termination};
pub use config::Config;
pub use errors::{AppError, AppResult, AssemblyError};
pub use lifecycle::{Container, EventLoop, Framework, LoopHandle, LoopState, Session};
pub use pipeline::{PipelineLayout, WebcamPipeline};
