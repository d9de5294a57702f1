// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline lifecycle: start, run the message loop, stop
//!
//! [`Session::run`] sets the container to Playing, blocks in the event loop
//! until it is quit, then stops the container exactly once no matter how
//! the loop ended.

use crate::bus::{
    BusMessage, LoopControl, Termination, handle_message, panic_description, report_fault,
};
use crate::errors::{AppError, AppResult};
use gstreamer::glib;
use gstreamer::glib::translate::from_glib_full;
use std::ffi::{CStr, CString, c_char, c_int};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Object whose processing state the session drives
pub trait Container {
    /// Enter the playing state
    fn start(&self) -> AppResult<()>;
    /// Enter the fully stopped state
    fn stop(&self) -> AppResult<()>;
    /// Errors and warnings posted but not yet delivered, oldest first
    ///
    /// Used after a failed start, when the loop never ran to deliver them.
    fn pending_messages(&self) -> Vec<BusMessage> {
        Vec::new()
    }
}

impl<T: Container + ?Sized> Container for &T {
    fn start(&self) -> AppResult<()> {
        (**self).start()
    }

    fn stop(&self) -> AppResult<()> {
        (**self).stop()
    }

    fn pending_messages(&self) -> Vec<BusMessage> {
        (**self).pending_messages()
    }
}

/// Blocking dispatch loop
pub trait EventLoop: LoopControl {
    /// Block until the loop is quit
    fn run(&self);
    /// Reason recorded by the first quit request, if any
    fn termination(&self) -> Option<Termination>;
}

impl<T: EventLoop + ?Sized> EventLoop for &T {
    fn run(&self) {
        (**self).run()
    }

    fn termination(&self) -> Option<Termination> {
        (**self).termination()
    }
}

/// Run/quit state of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started yet
    Idle,
    Running,
    /// Terminal
    Stopped,
}

/// GLib main loop plus the reason it was asked to stop
///
/// Cloning yields another handle to the same loop, so one clone can live in
/// the bus watch and another in the Ctrl+C handler.
#[derive(Clone)]
pub struct LoopHandle {
    main_loop: glib::MainLoop,
    reason: Arc<Mutex<Option<Termination>>>,
}

impl LoopHandle {
    /// Loop on the default main context
    pub fn new() -> Self {
        Self::on_context(None)
    }

    /// Loop on a specific main context
    pub fn with_context(context: &glib::MainContext) -> Self {
        Self::on_context(Some(context))
    }

    fn on_context(context: Option<&glib::MainContext>) -> Self {
        Self {
            main_loop: glib::MainLoop::new(context, false),
            reason: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.main_loop.is_running()
    }
}

impl Default for LoopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopControl for LoopHandle {
    fn quit(&self, reason: Termination) {
        if let Ok(mut slot) = self.reason.lock()
            && slot.is_none()
        {
            debug!(?reason, "Loop termination requested");
            *slot = Some(reason);
        }
        self.main_loop.quit();
    }
}

impl EventLoop for LoopHandle {
    fn run(&self) {
        self.main_loop.run();
    }

    fn termination(&self) -> Option<Termination> {
        self.reason.lock().ok().and_then(|slot| *slot)
    }
}

/// Route bus messages into [`handle_message`] on the loop's thread
///
/// Diagnostics go to `out`. Write failures and panics inside the handler
/// are printed to stdout as faults and quit the loop. The watch is attached
/// to the thread-default main context and stays installed while the guard
/// is alive.
pub fn attach_bus_watch<W: Write + 'static>(
    bus: &gstreamer::Bus,
    handle: LoopHandle,
    mut out: W,
) -> AppResult<gstreamer::bus::BusWatchGuard> {
    bus.add_watch_local(move |_, message| {
        let message = BusMessage::from_gst(message);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handle_message(&message, &handle, &mut out)
        }));

        let fault = match result {
            Ok(Ok(flow)) => return flow,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_description(payload.as_ref()),
        };
        report_fault(&mut io::stdout().lock(), &fault);
        handle.quit(Termination::Fault);
        glib::ControlFlow::Continue
    })
    .map_err(|e| AppError::Other(format!("Failed to watch pipeline bus: {}", e)))
}

/// Quit the loop on Ctrl+C
///
/// Failing to install the handler is not fatal; the loop still ends on EOS
/// or error.
pub fn install_interrupt_handler(handle: LoopHandle) {
    let result = ctrlc::set_handler(move || {
        info!("Interrupt received, stopping");
        handle.quit(Termination::Interrupted);
    });
    if let Err(e) = result {
        warn!(error = %e, "Failed to install Ctrl+C handler");
    }
}

/// One start → run → stop cycle
pub struct Session<C: Container, L: EventLoop> {
    container: C,
    event_loop: L,
    state: LoopState,
    out: Box<dyn Write>,
}

impl<C: Container, L: EventLoop> Session<C, L> {
    /// Session printing its diagnostics to stdout
    pub fn new(container: C, event_loop: L) -> Self {
        Self {
            container,
            event_loop,
            state: LoopState::Idle,
            out: Box::new(io::stdout()),
        }
    }

    /// Print diagnostics to `out` instead of stdout
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Start the container, run the loop, stop the container
    ///
    /// The container is stopped exactly once on every path, including a
    /// failed start and a panic out of the loop. A loop that returns without
    /// a recorded reason was quit externally.
    ///
    /// When the start fails, errors the container already posted are printed
    /// like any other bus message; if one of them is an error the run ends
    /// with [`Termination::Error`] instead of the start failure.
    pub fn run(&mut self) -> AppResult<Termination> {
        if self.state == LoopState::Stopped {
            return Err(AppError::Other("session already finished".into()));
        }

        if let Err(e) = self.container.start() {
            error!(error = %e, "Failed to start pipeline");
            self.state = LoopState::Stopped;
            for message in self.container.pending_messages() {
                if let Err(write_err) = handle_message(&message, &self.event_loop, &mut self.out)
                {
                    warn!(error = %write_err, "Failed to print pending bus message");
                }
            }
            if let Err(stop_err) = self.container.stop() {
                warn!(error = %stop_err, "Teardown after failed start also failed");
            }
            return match self.event_loop.termination() {
                Some(Termination::Error) => Ok(Termination::Error),
                _ => Err(e),
            };
        }

        self.state = LoopState::Running;

        // A quit that arrived while starting would be lost once the loop runs
        if self.event_loop.termination().is_none() {
            info!("Running message loop");
            let event_loop = &self.event_loop;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| event_loop.run())) {
                report_fault(&mut self.out, &panic_description(payload.as_ref()));
                event_loop.quit(Termination::Fault);
            }
        } else {
            debug!("Quit requested during start, skipping message loop");
        }

        self.state = LoopState::Stopped;
        let termination = self
            .event_loop
            .termination()
            .unwrap_or(Termination::Interrupted);
        info!(?termination, "Message loop finished");

        self.container.stop()?;
        Ok(termination)
    }
}

/// Explicit GStreamer initialisation with a matching teardown
pub struct Framework {
    _private: (),
}

impl Framework {
    /// Initialise GStreamer, handing it the process arguments
    ///
    /// GStreamer consumes the options it knows (`--gst-debug-level`,
    /// `--gst-plugin-path`, ...); anything left over is logged and ignored.
    pub fn init(args: &[String]) -> AppResult<Self> {
        debug!(?args, "Initializing GStreamer");
        let unused = forward_framework_args(args)?;
        if !unused.is_empty() {
            warn!(args = ?unused, "Ignoring arguments GStreamer did not recognise");
        }
        gstreamer::init()?;
        info!(version = %gstreamer::version_string(), "GStreamer initialized");
        Ok(Self { _private: () })
    }

    /// Deinitialise GStreamer
    ///
    /// Every pipeline, element and bus watch must be dropped first.
    pub fn shutdown(self) {
        debug!("Deinitializing GStreamer");
        // SAFETY: consuming `self` after the caller dropped every GStreamer
        // object; nothing touches GStreamer afterwards.
        unsafe { gstreamer::deinit() };
    }
}

/// Run `gst_init_check` over `args` and return the arguments it left
///
/// The Rust bindings' `init` takes no argv, so the options are passed
/// through the C entry point. Once GStreamer is initialised, later calls
/// parse nothing and return `args` unchanged.
pub fn forward_framework_args(args: &[String]) -> AppResult<Vec<String>> {
    let owned = std::iter::once(env!("CARGO_PKG_NAME").to_string())
        .chain(args.iter().cloned())
        .map(|arg| {
            CString::new(arg).map_err(|e| AppError::Init(format!("invalid argument: {}", e)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let mut argv: Vec<*mut c_char> = owned.iter().map(|a| a.as_ptr() as *mut c_char).collect();
    argv.push(ptr::null_mut());
    let mut argc = owned.len() as c_int;
    let mut argv_ptr = argv.as_mut_ptr();
    let mut error: *mut glib::ffi::GError = ptr::null_mut();

    // SAFETY: argc/argv describe NUL-terminated strings owned by `owned`,
    // which outlives the call. GOption only reorders and drops entries of
    // the pointer array; it does not write through the string pointers.
    let ok = unsafe { gstreamer::ffi::gst_init_check(&mut argc, &mut argv_ptr, &mut error) };
    if ok == glib::ffi::GFALSE {
        // SAFETY: on failure gst_init_check hands over an owned GError
        let err: glib::Error = unsafe { from_glib_full(error) };
        return Err(err.into());
    }

    let remaining = (1..argc.max(1) as usize)
        .map(|i| {
            // SAFETY: the first argc entries still point into `owned`
            unsafe { CStr::from_ptr(*argv_ptr.add(i)) }
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    Ok(remaining)
}
