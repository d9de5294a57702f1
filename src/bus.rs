// SPDX-License-Identifier: GPL-3.0-only

//! Bus message dispatch
//!
//! Messages from the pipeline bus are narrowed to [`BusMessage`] and handled
//! by [`handle_message`], which prints diagnostics and asks the loop to quit
//! through an explicit [`LoopControl`] handle.

use crate::constants::END_OF_STREAM_NOTICE;
use gstreamer::glib;
use gstreamer::prelude::*;
use std::any::Any;
use std::backtrace::Backtrace;
use std::io::{self, Write};
use tracing::{error, info, warn};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Pipeline reached end-of-stream
    EndOfStream,
    /// Pipeline posted an error
    Error,
    /// Uncaught fault while the loop was running
    Fault,
    /// Quit requested from outside (Ctrl+C)
    Interrupted,
}

impl Termination {
    /// Whether the run counts as a success for the exit code
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::EndOfStream | Termination::Interrupted)
    }
}

/// Something that can be asked to stop the message loop
pub trait LoopControl {
    fn quit(&self, reason: Termination);
}

impl<T: LoopControl + ?Sized> LoopControl for &T {
    fn quit(&self, reason: Termination) {
        (**self).quit(reason)
    }
}

/// Error or warning payload, passed through unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub message: String,
    pub debug: Option<String>,
    /// Path of the element that posted the message
    pub source: Option<String>,
}

impl Report {
    pub fn new(message: impl Into<String>, debug: Option<String>) -> Self {
        Self {
            message: message.into(),
            debug,
            source: None,
        }
    }

    /// `<message> <debug>`, or just the message when there is no detail
    pub fn line(&self) -> String {
        match &self.debug {
            Some(debug) => format!("{} {}", self.message, debug),
            None => self.message.clone(),
        }
    }
}

/// Bus messages the loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    EndOfStream,
    Error(Report),
    Warning(Report),
    /// Every other kind; ignored
    Other(gstreamer::MessageType),
}

impl BusMessage {
    pub fn from_gst(message: &gstreamer::MessageRef) -> Self {
        use gstreamer::MessageView;

        let source = message.src().map(|s| s.path_string().to_string());
        match message.view() {
            MessageView::Eos(_) => BusMessage::EndOfStream,
            MessageView::Error(err) => BusMessage::Error(Report {
                message: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
                source,
            }),
            MessageView::Warning(warning) => BusMessage::Warning(Report {
                message: warning.error().to_string(),
                debug: warning.debug().map(|d| d.to_string()),
                source,
            }),
            _ => BusMessage::Other(message.type_()),
        }
    }
}

/// Apply the dispatch policy to one message
///
/// | kind    | output             | loop     |
/// |---------|--------------------|----------|
/// | EOS     | `End of stream`    | quit     |
/// | Error   | message and debug  | quit     |
/// | Warning | message and debug  | continue |
/// | other   | nothing            | continue |
///
/// Always returns [`glib::ControlFlow::Continue`]; stopping goes through
/// `control`. An `Err` means the diagnostics could not be written.
pub fn handle_message<L, W>(
    message: &BusMessage,
    control: &L,
    out: &mut W,
) -> io::Result<glib::ControlFlow>
where
    L: LoopControl + ?Sized,
    W: Write + ?Sized,
{
    match message {
        BusMessage::EndOfStream => {
            info!("End of stream reached");
            writeln!(out, "{}", END_OF_STREAM_NOTICE)?;
            control.quit(Termination::EndOfStream);
        }
        BusMessage::Error(report) => {
            error!(
                error = %report.message,
                debug = ?report.debug,
                source = ?report.source,
                "GStreamer error"
            );
            // Quit before writing so a broken stdout cannot keep the loop alive
            control.quit(Termination::Error);
            writeln!(out, "{}", report.line())?;
        }
        BusMessage::Warning(report) => {
            warn!(
                warning = %report.message,
                debug = ?report.debug,
                source = ?report.source,
                "GStreamer warning"
            );
            writeln!(out, "{}", report.line())?;
        }
        BusMessage::Other(_) => {}
    }
    out.flush()?;
    Ok(glib::ControlFlow::Continue)
}

/// Print a fault with a full backtrace
pub fn report_fault<W: Write + ?Sized>(out: &mut W, description: &str) {
    let backtrace = Backtrace::force_capture();
    error!(fault = %description, "Unhandled fault in message loop");
    // Nothing left to report to if this fails
    let _ = writeln!(out, "Unhandled fault: {}\n{}", description, backtrace);
    let _ = out.flush();
}

/// Text of a panic payload
pub fn panic_description(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
