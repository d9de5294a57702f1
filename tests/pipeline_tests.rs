// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests against a real GStreamer installation
//!
//! Most tests use core elements only (`fakesrc`, `capsfilter`, `identity`,
//! `fakesink`, `filesrc`), which ship with GStreamer itself, so they always
//! run. Tests needing gst-plugins-base are `#[ignore]`d; run them with
//! `cargo test -- --ignored`.

use gstreamer::glib;
use gstreamer::prelude::*;
use playwebcam::lifecycle::attach_bus_watch;
use playwebcam::{
    AppError, AssemblyError, Config, LoopControl, LoopHandle, PipelineLayout, Session,
    Termination, WebcamPipeline,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

const TEST_CAPS: &str = "application/x-playwebcam-test";

fn init() {
    gstreamer::init().expect("GStreamer core must be installed");
}

/// Fails instead of skipping when the plugins are missing
fn require_plugins(factories: &[&str]) {
    init();
    let missing: Vec<_> = factories
        .iter()
        .filter(|f| gstreamer::ElementFactory::find(f).is_none())
        .collect();
    assert!(missing.is_empty(), "missing GStreamer elements {:?}", missing);
}

fn core_config(num_buffers: u32) -> Config {
    Config {
        device: String::new(),
        caps: TEST_CAPS.into(),
        source: "fakesrc".into(),
        converter: "identity".into(),
        sink: "fakesink".into(),
        source_properties: BTreeMap::from([("num-buffers".into(), num_buffers.to_string())]),
        sink_properties: BTreeMap::from([("sync".into(), "false".into())]),
    }
}

fn build(config: &Config) -> Result<WebcamPipeline, AppError> {
    WebcamPipeline::build(&PipelineLayout::from_config(config))
}

fn downstream_of(element: &gstreamer::Element) -> Option<String> {
    element
        .static_pad("src")?
        .peer()?
        .parent_element()
        .map(|e| e.name().to_string())
}

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_assembly_links_four_stages_in_order() {
    init();

    let pipeline = build(&core_config(1)).expect("pipeline should build");
    assert_eq!(
        pipeline.stage_names(),
        ["webcam_source", "webcam_caps", "webcam_convert", "webcam_sink"]
    );
    assert_eq!(pipeline.pipeline().children().len(), 4);

    let stages = pipeline.stages();
    for pair in stages.windows(2) {
        assert_eq!(
            downstream_of(&pair[0]).as_deref(),
            Some(pair[1].name().as_str())
        );
    }
    assert!(stages[3].static_pad("src").is_none());

    let caps = stages[1].property::<gstreamer::Caps>("caps");
    assert_eq!(caps, TEST_CAPS.parse::<gstreamer::Caps>().unwrap());
    assert_eq!(stages[0].property::<i32>("num-buffers"), 1);
}

#[test]
fn test_missing_factory_is_reported() {
    init();

    let config = Config {
        source: "no-such-source-element".into(),
        ..core_config(1)
    };
    let err = build(&config).err().expect("build should fail");
    assert_eq!(
        err,
        AppError::Assembly(AssemblyError::ElementUnavailable {
            factory: "no-such-source-element".into()
        })
    );
}

#[test]
fn test_unknown_property_is_reported() {
    init();

    // fakesrc has no device property
    let config = Config {
        device: "/dev/video0".into(),
        ..core_config(1)
    };
    let err = build(&config).err().expect("build should fail");
    assert_eq!(
        err,
        AppError::Assembly(AssemblyError::UnknownProperty {
            element: "webcam_source".into(),
            property: "device".into()
        })
    );
}

#[test]
fn test_unparsable_property_value_is_reported() {
    init();

    let mut config = core_config(1);
    config
        .source_properties
        .insert("num-buffers".into(), "lots".into());
    let err = build(&config).err().expect("build should fail");
    assert!(matches!(
        err,
        AppError::Assembly(AssemblyError::InvalidPropertyValue { .. })
    ));
}

#[test]
fn test_invalid_caps_are_reported() {
    init();

    let config = Config {
        caps: "video/x-raw,width=(int)wide".into(),
        ..core_config(1)
    };
    let err = build(&config).err().expect("build should fail");
    assert!(matches!(
        err,
        AppError::Assembly(AssemblyError::InvalidCaps { .. })
    ));
}

#[test]
#[ignore = "needs gst-plugins-base (videotestsrc, videoconvert)"]
fn test_incompatible_caps_fail_to_link() {
    require_plugins(&["videotestsrc", "videoconvert"]);

    let config = Config {
        caps: "audio/x-raw".into(),
        source: "videotestsrc".into(),
        converter: "videoconvert".into(),
        ..core_config(1)
    };
    let err = build(&config).err().expect("build should fail");
    assert_eq!(
        err,
        AppError::Assembly(AssemblyError::LinkFailed {
            upstream: "webcam_source".into(),
            downstream: "webcam_caps".into()
        })
    );
}

#[test]
fn test_failed_start_prints_framework_error() {
    init();

    let config = Config {
        source: "filesrc".into(),
        source_properties: BTreeMap::from([(
            "location".into(),
            "/nonexistent/playwebcam-test".into(),
        )]),
        ..core_config(1)
    };
    let pipeline = build(&config).expect("pipeline should build");
    let out = SharedBuffer::default();

    let termination = Session::new(&pipeline, LoopHandle::with_context(&glib::MainContext::new()))
        .with_output(out.clone())
        .run()
        .expect("the posted error ends the session");

    assert_eq!(termination, Termination::Error);
    assert!(
        out.contents().contains("/nonexistent/playwebcam-test"),
        "debug detail should be printed, got {:?}",
        out.contents()
    );
    assert_eq!(pipeline.current_state(), gstreamer::State::Null);
}

#[test]
fn test_runs_to_end_of_stream_and_stops() {
    init();

    let pipeline = build(&core_config(10)).expect("pipeline should build");
    let context = glib::MainContext::new();
    let (termination, out) = context
        .with_thread_default(|| {
            let handle = LoopHandle::with_context(&context);
            let out = SharedBuffer::default();
            let bus = pipeline.bus().expect("pipeline bus");
            let _watch = attach_bus_watch(&bus, handle.clone(), out.clone()).expect("bus watch");

            let guard = handle.clone();
            let _timeout = glib::timeout_add_local_once(Duration::from_secs(10), move || {
                guard.quit(Termination::Fault)
            });

            let termination = Session::new(&pipeline, handle.clone())
                .run()
                .expect("session should run");
            assert!(!handle.is_running());
            (termination, out.contents())
        })
        .expect("test main context is free");

    assert_eq!(termination, Termination::EndOfStream);
    assert_eq!(out, "End of stream\n");
    assert_eq!(pipeline.current_state(), gstreamer::State::Null);
}
