// SPDX-License-Identifier: GPL-3.0-only

//! Ctrl+C handling, in its own test binary since the signal handler is
//! process-wide

use gstreamer::glib;
use playwebcam::lifecycle::install_interrupt_handler;
use playwebcam::{AppResult, Container, LoopControl, LoopHandle, Session, Termination};
use std::cell::Cell;
use std::process::Command;
use std::time::Duration;

#[derive(Default)]
struct CountingContainer {
    stops: Cell<u32>,
}

impl Container for CountingContainer {
    fn start(&self) -> AppResult<()> {
        Ok(())
    }

    fn stop(&self) -> AppResult<()> {
        self.stops.set(self.stops.get() + 1);
        Ok(())
    }
}

#[test]
fn test_sigint_quits_the_loop() {
    let context = glib::MainContext::new();
    let (termination, stops) = context
        .with_thread_default(|| {
            let handle = LoopHandle::with_context(&context);
            install_interrupt_handler(handle.clone());

            let guard = handle.clone();
            let _timeout = glib::timeout_add_local_once(Duration::from_secs(10), move || {
                guard.quit(Termination::Fault)
            });

            let status = Command::new("kill")
                .args(["-INT", &std::process::id().to_string()])
                .status()
                .expect("run kill");
            assert!(status.success());

            let container = CountingContainer::default();
            let termination = Session::new(&container, handle).run().unwrap();
            (termination, container.stops.get())
        })
        .expect("test main context is free");

    assert_eq!(termination, Termination::Interrupted);
    assert_eq!(stops, 1);
}
