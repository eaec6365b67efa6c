//! # Public orchestrator handle.
//!
//! [`SessionOrchestrator`] owns the serial worker and the subscriber
//! listener. Public operations either resolve a slot directly (surface
//! binding), flip shared state (flash), or post a [`Command`] for the worker
//! to execute in order.
//!
//! ## Rules
//! - Operations posted as commands are fire-and-forget: the returned `Result`
//!   only reports that the worker is still alive; outcomes arrive as events
//!   (or, for still capture, through the result callback).
//! - `close()` cancels outstanding slots **before** queueing `Close`, so a
//!   worker blocked mid-routine unblocks and unwinds promptly.
//! - `shutdown()` closes, cancels the runtime token, and waits up to the
//!   configured grace before aborting the worker.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::OrchestratorConfig;
use crate::error::CameraError;
use crate::events::{Bus, Event, EventKind};
use crate::hal::{
    CameraHal, DeviceSelector, FocusPoint, FrameSink, OutputSize, Recorder, SurfaceHandle,
    SurfaceKind,
};
use crate::policies::best_fit_size;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::driver::Driver;
use super::phase::Phase;
use super::shared::Shared;
use super::worker::{self, Command};

/// Callback-free facade over one camera device lifecycle.
///
/// ```no_run
/// use std::sync::Arc;
/// use camvisor::{DeviceSelector, OrchestratorConfig, SessionOrchestrator, SurfaceHandle};
/// # async fn demo(hal: Arc<dyn camvisor::CameraHal>) -> Result<(), camvisor::CameraError> {
/// let cam = SessionOrchestrator::new(hal, OrchestratorConfig::default(), Vec::new());
/// cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
/// cam.open(DeviceSelector::Back)?;
/// // ... preview runs; capture, record, switch ...
/// cam.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionOrchestrator {
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Command>,
    worker: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl SessionOrchestrator {
    /// Spawns the serial worker and the subscriber listener.
    ///
    /// `subscribers` are fanned out to through a [`SubscriberSet`]; pass an
    /// empty vec to observe events through [`subscribe`](Self::subscribe)
    /// only.
    pub fn new(
        hal: Arc<dyn CameraHal>,
        cfg: OrchestratorConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let shared = Arc::new(Shared::new(hal, cfg, bus.clone()));
        let token = CancellationToken::new();

        let listener = {
            let set = SubscriberSet::new(subscribers);
            let mut rx = bus.subscribe();
            let token = token.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        res = rx.recv() => match res {
                            Ok(ev) => set.emit(&ev),
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => break,
                        },
                        _ = token.cancelled() => break,
                    }
                }
                set.shutdown().await;
            })
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // The driver gets a weak sender: once this handle (the only strong
        // sender) is dropped, the worker's queue closes and it exits on its
        // own even without an explicit shutdown().
        let driver = Driver::new(Arc::clone(&shared), tx.downgrade());
        let worker = tokio::spawn(worker::run(driver, rx, token.clone()));

        Self {
            shared,
            tx,
            worker: Some(worker),
            listener: Some(listener),
            token,
        }
    }

    // ---- lifecycle ----

    /// Requests opening the device matched by `selector`.
    ///
    /// Valid only in `Closed`; anywhere else the worker publishes
    /// `CommandRejected`. Progress arrives as `DeviceOpened`,
    /// `SessionConfigured`, `PreviewStarted` (the session is built once a
    /// surface is bound, in either order).
    pub fn open(&self, selector: DeviceSelector) -> Result<(), CameraError> {
        self.post(Command::Open { selector })
    }

    /// Binds the host's preview surface and its view size.
    ///
    /// May be called before or after [`open`](Self::open); an open in flight
    /// is waiting on exactly these slots. Re-binding while bound is a no-op
    /// (the first assignment wins until a close resets the slot).
    pub fn bind_preview_surface(&self, surface: SurfaceHandle, width: u32, height: u32) {
        let view = OutputSize::new(width, height);
        let bound = self.shared.slots.surface.complete(surface);
        self.shared.slots.surface_size.complete(view);
        if bound {
            self.shared
                .bus
                .publish(Event::now(EventKind::SurfaceBound).with_size(view));
        }
    }

    /// Restarts the repeating preview request, optionally focusing on a
    /// touched point.
    pub fn start_preview(&self, focus: Option<FocusPoint>) -> Result<(), CameraError> {
        self.post(Command::StartPreview { focus })
    }

    /// Issues a one-shot still capture.
    ///
    /// `on_result` fires exactly once: `(true, sink)` after the frame was
    /// delivered and persisted, `(false, sink)` on failure or rejection.
    /// After a successful capture the worker rebuilds the preview session
    /// before taking the next command.
    pub fn capture_still(
        &self,
        output: Arc<dyn FrameSink>,
        on_result: impl FnOnce(bool, Arc<dyn FrameSink>) + Send + 'static,
    ) -> Result<(), CameraError> {
        self.post(Command::CaptureStill {
            output,
            on_result: Box::new(on_result),
        })
    }

    /// Replaces the preview session with a record session and starts the
    /// recorder.
    pub fn start_recording(&self, recorder: Arc<dyn Recorder>) -> Result<(), CameraError> {
        self.post(Command::StartRecording { recorder })
    }

    /// Stops the recorder and rebuilds the plain preview session.
    pub fn stop_recording(&self, recorder: Arc<dyn Recorder>) -> Result<(), CameraError> {
        self.post(Command::StopRecording { recorder })
    }

    /// Closes the current device and reopens the alternate one.
    pub fn switch_device(&self) -> Result<(), CameraError> {
        self.post(Command::SwitchDevice)
    }

    /// Enables or disables the torch.
    ///
    /// Fails with [`CameraError::CapabilityUnavailable`] if the selected
    /// device has no flash unit. While preview is active the repeating
    /// request is re-issued so the change takes effect immediately.
    pub fn set_flash(&self, enabled: bool) -> Result<(), CameraError> {
        let chars = self.shared.inventory.get(self.shared.selector())?;
        if !chars.flash_available {
            return Err(CameraError::CapabilityUnavailable { feature: "flash" });
        }
        self.shared.set_flash_enabled(enabled);
        self.shared.bus.publish(
            Event::now(EventKind::FlashChanged).with_reason(if enabled { "on" } else { "off" }),
        );
        if self.shared.phase.load() == Phase::PreviewActive {
            self.post(Command::StartPreview { focus: None })?;
        }
        Ok(())
    }

    /// Requests teardown of the current device.
    ///
    /// Cancels outstanding slots first so a worker blocked mid-routine (e.g.
    /// awaiting a still frame) unblocks, then queues the close. Idempotent.
    pub fn close(&self) {
        self.shared.slots.cancel_all();
        let _ = self.tx.send(Command::Close);
    }

    /// Closes, stops the worker and subscriber listener, and waits up to the
    /// configured grace for both to finish.
    ///
    /// Returns [`CameraError::GraceExceeded`] if the worker had to be
    /// aborted.
    pub async fn shutdown(mut self) -> Result<(), CameraError> {
        self.close();
        self.token.cancel();
        let grace = self.shared.cfg.grace;
        let mut finished = true;
        if let Some(worker) = self.worker.take() {
            let abort = worker.abort_handle();
            finished = time::timeout(grace, worker).await.is_ok();
            if !finished {
                abort.abort();
            }
        }
        if let Some(listener) = self.listener.take() {
            let _ = time::timeout(grace, listener).await;
        }
        if finished {
            Ok(())
        } else {
            Err(CameraError::GraceExceeded { grace })
        }
    }

    // ---- observation ----

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.phase.load()
    }

    /// True if the front (user-facing) device is selected.
    pub fn is_front_device(&self) -> bool {
        self.shared.selector() == DeviceSelector::Front
    }

    /// Current torch flag.
    pub fn flash_enabled(&self) -> bool {
        self.shared.flash_enabled()
    }

    /// Best-fit record output size for the bound view, if a surface is bound
    /// and the selected device is enumerated.
    pub fn record_output_size(&self) -> Option<OutputSize> {
        let view = self.shared.slots.surface_size.peek()?;
        let chars = self.shared.inventory.get(self.shared.selector()).ok()?;
        best_fit_size(
            chars.supported_sizes(SurfaceKind::Record),
            view,
            self.shared.cfg.aspect_tolerance,
        )
        .or(Some(view))
    }

    /// Subscribes to the event stream (events published after this call).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    fn post(&self, cmd: Command) -> Result<(), CameraError> {
        self.tx.send(cmd).map_err(|_| CameraError::WorkerGone)
    }
}

impl Drop for SessionOrchestrator {
    /// Dropping the handle without `shutdown()` must not leak the worker or
    /// the subscriber listener: cancelling the token stops both, and the
    /// dropped sender closes the command queue.
    fn drop(&mut self) {
        self.token.cancel();
    }
}
