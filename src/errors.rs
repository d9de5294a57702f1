// SPDX-License-Identifier: GPL-3.0-only

//! Error types for pipeline setup and the lifecycle loop

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// GStreamer could not be initialised
    Init(String),
    /// Configuration could not be read or is invalid
    Config(String),
    /// Pipeline assembly failed
    Assembly(AssemblyError),
    /// A pipeline state change was rejected
    State(String),
    /// I/O error
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Pipeline assembly errors
///
/// All of these are fatal: the pipeline is never run partially linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// Factory is not present in the GStreamer registry
    ElementUnavailable { factory: String },
    /// Factory exists but building the element failed
    ElementCreation { factory: String, reason: String },
    /// Property does not exist on the element or is not writable
    UnknownProperty { element: String, property: String },
    /// Value could not be converted to the property's type
    InvalidPropertyValue {
        element: String,
        property: String,
        value: String,
    },
    /// Caps string did not parse
    InvalidCaps { caps: String, reason: String },
    /// Adding elements to the pipeline failed
    AddFailed(String),
    /// Adjacent stages could not be linked
    LinkFailed { upstream: String, downstream: String },
    /// Pipeline has no bus
    NoBus,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Init(msg) => write!(f, "GStreamer initialization failed: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Assembly(e) => write!(f, "Pipeline assembly failed: {}", e),
            AppError::State(msg) => write!(f, "State change failed: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::ElementUnavailable { factory } => {
                write!(f, "element '{}' is not available (missing plugin?)", factory)
            }
            AssemblyError::ElementCreation { factory, reason } => {
                write!(f, "failed to create '{}': {}", factory, reason)
            }
            AssemblyError::UnknownProperty { element, property } => {
                write!(f, "'{}' has no writable property '{}'", element, property)
            }
            AssemblyError::InvalidPropertyValue {
                element,
                property,
                value,
            } => write!(
                f,
                "invalid value '{}' for property '{}' of '{}'",
                value, property, element
            ),
            AssemblyError::InvalidCaps { caps, reason } => {
                write!(f, "invalid caps '{}': {}", caps, reason)
            }
            AssemblyError::AddFailed(msg) => write!(f, "failed to add elements: {}", msg),
            AssemblyError::LinkFailed {
                upstream,
                downstream,
            } => write!(f, "failed to link '{}' to '{}'", upstream, downstream),
            AssemblyError::NoBus => write!(f, "pipeline has no bus"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for AssemblyError {}

impl From<AssemblyError> for AppError {
    fn from(err: AssemblyError) -> Self {
        AppError::Assembly(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<gstreamer::glib::Error> for AppError {
    fn from(err: gstreamer::glib::Error) -> Self {
        AppError::Init(err.to_string())
    }
}

impl From<gstreamer::StateChangeError> for AppError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        AppError::State(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_failure_names_both_elements() {
        let err = AppError::from(AssemblyError::LinkFailed {
            upstream: "webcam_caps".into(),
            downstream: "webcam_convert".into(),
        });
        let text = err.to_string();
        assert!(text.contains("webcam_caps"));
        assert!(text.contains("webcam_convert"));
    }

    #[test]
    fn io_errors_map_to_io_variant() {
        let err = AppError::from(std::io::Error::other("pipe closed"));
        assert_eq!(err, AppError::Io("pipe closed".into()));
    }
}
