// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Capture device opened when nothing else is configured
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Frame constraint negotiated between the source and the converter
pub const DEFAULT_CAPS: &str = "video/x-raw,width=1280,height=720";

/// GStreamer element factories for each stage
pub mod factories {
    /// V4L2 capture source
    pub const SOURCE: &str = "v4l2src";
    /// Caps filter; the filter stage is always this element
    pub const FILTER: &str = "capsfilter";
    /// Colour-space / format converter
    pub const CONVERTER: &str = "videoconvert";
    /// X11 video display sink
    pub const SINK: &str = "xvimagesink";
}

/// Element names given to the stages inside the pipeline
pub mod element_names {
    pub const SOURCE: &str = "webcam_source";
    pub const FILTER: &str = "webcam_caps";
    pub const CONVERTER: &str = "webcam_convert";
    pub const SINK: &str = "webcam_sink";
}

/// Property names set during assembly
pub mod properties {
    /// Device node on the capture source
    pub const DEVICE: &str = "device";
    /// Caps constraint on the filter
    pub const CAPS: &str = "caps";
}

/// Notice printed when the pipeline signals end-of-stream
pub const END_OF_STREAM_NOTICE: &str = "End of stream";

/// Default `RUST_LOG` filter when the variable is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// How long to wait for each pending error when draining the bus after a failed start
pub const BUS_DRAIN_TIMEOUT_MS: u64 = 100;
