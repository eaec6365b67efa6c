//! # Phase routines executed on the serial worker.
//!
//! Each routine sequences one lifecycle step as straight-line code that
//! awaits slots instead of nesting callbacks: open waits on the device slot,
//! configuration waits on device + surface + size, capture waits on the
//! delivery slot. Hardware callbacks built here resolve those slots from
//! arbitrary threads.
//!
//! ## Event flow
//! ```text
//! open:       DeviceOpened ─► SessionConfigured ─► PreviewStarted
//! still:      StillCaptureStarted ─► StillCaptured ─► SessionConfigured ─► PreviewStarted
//!                                  └► StillCaptureFailed (no session rebuild)
//! record:     RecordingStarted ... RecordingStopped ─► SessionConfigured ─► PreviewStarted
//! teardown:   Closing ─► Closed
//! ```
//!
//! ## Rules
//! - A routine that cannot make progress unwinds through `close_inner` (or
//!   back to `PreviewActive` for per-capture failures); it never leaves a
//!   transitional phase behind.
//! - The capture session is **closed and rebuilt after every delivered
//!   still**; the device requires a fresh session after an interleaved
//!   one-shot capture.
//! - Stale hardware callbacks after close resolve nothing: every callback
//!   carries the open-cycle generation it was built in, and teardown bumps
//!   the generation before slots are recycled. A late completion from an
//!   earlier cycle is dropped and its handle released back to the HAL.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::events::{Event, EventKind};
use crate::hal::{
    AutoFocus, CaptureCallbacks, CaptureRequest, DeviceCallbacks, DeviceSelector, FocusPoint,
    FrameSink, Recorder, RequestTemplate, SessionCallbacks, SessionHandle, SurfaceKind,
};
use crate::policies::{best_fit_size, metering_region};

use super::phase::Phase;
use super::shared::Shared;
use super::worker::{CaptureResultFn, Command};

/// Orientation metadata stamped on still captures; the sensor is mounted 90°
/// relative to the portrait view.
const STILL_ORIENTATION_DEGREES: u32 = 90;

/// Executes commands against the shared state. Owned by the worker task.
///
/// Holds only a weak sender to the worker's own queue (callbacks use it to
/// post `Close`); a strong clone here would keep the channel open forever
/// and the worker would never observe the public handle being dropped.
pub(crate) struct Driver {
    shared: Arc<Shared>,
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl Driver {
    pub fn new(shared: Arc<Shared>, tx: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { shared, tx }
    }

    pub async fn dispatch(&self, cmd: Command) {
        match cmd {
            Command::Open { selector } => self.open(selector).await,
            Command::StartPreview { focus } => self.start_preview(focus).await,
            Command::CaptureStill { output, on_result } => {
                self.capture_still(output, on_result).await
            }
            Command::StartRecording { recorder } => self.start_recording(recorder).await,
            Command::StopRecording { recorder } => self.stop_recording(recorder).await,
            Command::SwitchDevice => self.switch_device().await,
            Command::Close => self.close_inner().await,
        }
    }

    // ---- open ----

    async fn open(&self, selector: DeviceSelector) {
        let shared = &self.shared;
        if shared.phase.load() != Phase::Closed {
            self.reject("open");
            return;
        }
        shared.set_selector(selector);
        shared.slots.reset_device_cycle();
        let cycle = shared.bump_cycle();
        shared.phase.store(Phase::Opening);

        let chars = match shared.inventory.get(selector) {
            Ok(chars) => chars.clone(),
            Err(e) => {
                shared
                    .bus
                    .publish(Event::now(EventKind::DeviceError).with_reason(e.as_message()));
                shared.phase.store(Phase::Closed);
                return;
            }
        };
        if let Err(e) = shared.hal.open_device(&chars.id, self.device_callbacks(cycle)) {
            shared.bus.publish(
                Event::now(EventKind::DeviceError)
                    .with_device(chars.id.as_str())
                    .with_reason(e.as_message()),
            );
            shared.phase.store(Phase::Closed);
            return;
        }

        match shared.slots.device.wait().await {
            Ok(_) => {
                shared.phase.store(Phase::DeviceOpen);
                self.configure_session().await;
            }
            Err(e) => {
                shared.bus.publish(
                    Event::now(EventKind::DeviceError)
                        .with_device(chars.id.as_str())
                        .with_reason(e.as_message()),
                );
                self.close_inner().await;
            }
        }
    }

    fn device_callbacks(&self, cycle: u64) -> DeviceCallbacks {
        let opened = {
            let shared = Arc::clone(&self.shared);
            Arc::new(move |device: crate::hal::DeviceHandle| {
                // A handle delivered for an already-closed cycle must not
                // resolve the recycled slot; release it instead.
                if shared.cycle() != cycle || !shared.slots.device.complete(device.clone()) {
                    shared.hal.close_device(&device);
                    return;
                }
                shared
                    .bus
                    .publish(Event::now(EventKind::DeviceOpened).with_device(device.id.as_str()));
            })
        };
        let disconnected = {
            let shared = Arc::clone(&self.shared);
            let tx = self.tx.clone();
            Arc::new(move |device: crate::hal::DeviceHandle| {
                if shared.cycle() != cycle {
                    return;
                }
                shared.bus.publish(
                    Event::now(EventKind::DeviceDisconnected).with_device(device.id.as_str()),
                );
                // Unblock an open in flight; no-op once the device resolved.
                shared.slots.device.fail("device disconnected");
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(Command::Close);
                }
            })
        };
        let errored = {
            let shared = Arc::clone(&self.shared);
            let tx = self.tx.clone();
            Arc::new(move |device: crate::hal::DeviceHandle, code: i32| {
                if shared.cycle() != cycle {
                    return;
                }
                shared.bus.publish(
                    Event::now(EventKind::DeviceError)
                        .with_device(device.id.as_str())
                        .with_code(code),
                );
                shared
                    .slots
                    .device
                    .fail(format!("device error code {code}"));
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(Command::Close);
                }
            })
        };
        DeviceCallbacks {
            on_opened: opened,
            on_disconnected: disconnected,
            on_error: errored,
        }
    }

    // ---- session configuration ----

    /// Builds the preview session once device, surface, and view size have
    /// all resolved; whichever resolves last unblocks this routine.
    async fn configure_session(&self) {
        let shared = &self.shared;
        shared.phase.store(Phase::SessionConfiguring);

        let (device, surface, view) = match (
            shared.slots.device.wait().await,
            shared.slots.surface.wait().await,
            shared.slots.surface_size.wait().await,
        ) {
            (Ok(device), Ok(surface), Ok(view)) => (device, surface, view),
            _ => {
                self.close_inner().await;
                return;
            }
        };

        let chars = match shared.inventory.get(shared.selector()) {
            Ok(chars) => chars.clone(),
            Err(e) => {
                self.configure_failed(e.as_message()).await;
                return;
            }
        };
        let output = best_fit_size(
            chars.supported_sizes(SurfaceKind::Preview),
            view,
            shared.cfg.aspect_tolerance,
        )
        .unwrap_or(view);

        // Fresh still sink sized to the chosen output, every configure pass.
        if let Some(old) = shared.slots.still_sink.peek() {
            shared.hal.close_sink(&old);
        }
        shared.slots.still_sink.reset();
        let sink = match shared.hal.create_still_sink(output) {
            Ok(sink) => sink,
            Err(e) => {
                self.configure_failed(e.as_message()).await;
                return;
            }
        };
        shared.slots.still_sink.complete(sink);

        shared.slots.session.reset();
        let targets = vec![shared.hal.sink_surface(&sink), surface];
        let cycle = shared.cycle();
        if let Err(e) = shared
            .hal
            .create_session(&device, targets, self.session_callbacks(cycle))
        {
            self.configure_failed(e.as_message()).await;
            return;
        }

        match shared.slots.session.wait().await {
            Ok(_) => {
                shared
                    .bus
                    .publish(Event::now(EventKind::SessionConfigured).with_size(output));
                self.start_preview(None).await;
            }
            Err(e) => self.configure_failed(e.as_message()).await,
        }
    }

    /// Releases the device and drops back to `Closed`; a rejected
    /// configuration is recovered by a fresh `open`.
    async fn configure_failed(&self, reason: String) {
        self.shared
            .bus
            .publish(Event::now(EventKind::SessionConfigureFailed).with_reason(reason));
        self.close_inner().await;
    }

    fn session_callbacks(&self, cycle: u64) -> SessionCallbacks {
        let configured = {
            let shared = Arc::clone(&self.shared);
            Arc::new(move |session: SessionHandle| {
                if shared.cycle() != cycle || !shared.slots.session.complete(session) {
                    shared.hal.close_session(&session);
                }
            })
        };
        let failed = {
            let shared = Arc::clone(&self.shared);
            Arc::new(move |session: SessionHandle| {
                shared.hal.close_session(&session);
                if shared.cycle() != cycle {
                    return;
                }
                shared
                    .slots
                    .session
                    .fail("session configuration rejected by hardware");
            })
        };
        SessionCallbacks {
            on_configured: configured,
            on_configure_failed: failed,
        }
    }

    // ---- preview ----

    async fn start_preview(&self, focus: Option<FocusPoint>) {
        let shared = &self.shared;
        let phase = shared.phase.load();
        if !matches!(phase, Phase::SessionConfiguring | Phase::PreviewActive) {
            self.reject("start_preview");
            return;
        }

        let (session, surface) = match (
            shared.slots.session.wait().await,
            shared.slots.surface.wait().await,
        ) {
            (Ok(session), Ok(surface)) => (session, surface),
            _ => return,
        };
        shared.hal.stop_repeating(&session);

        let auto_focus = match focus {
            Some(point) => match shared.inventory.get(shared.selector()) {
                Ok(chars) => AutoFocus::TriggerScan {
                    region: metering_region(point, chars.active_array),
                },
                Err(_) => AutoFocus::ContinuousPicture,
            },
            None => AutoFocus::ContinuousPicture,
        };
        let request = CaptureRequest {
            template: RequestTemplate::Preview,
            targets: vec![surface],
            auto_focus,
            flash: shared.flash_mode(),
            orientation: None,
        };
        if shared
            .hal
            .set_repeating(&session, request, self.preview_callbacks())
            .is_err()
        {
            return;
        }
        shared.phase.store(Phase::PreviewActive);
        shared.bus.publish(Event::now(EventKind::PreviewStarted));
    }

    fn preview_callbacks(&self) -> CaptureCallbacks {
        let shared = Arc::clone(&self.shared);
        CaptureCallbacks {
            on_completed: Arc::new(move |update| {
                if update.converged() {
                    shared.bus.publish(Event::now(EventKind::FocusConverged));
                }
            }),
            on_failed: Arc::new(|_reason| {}),
        }
    }

    // ---- still capture ----

    async fn capture_still(&self, output: Arc<dyn FrameSink>, on_result: CaptureResultFn) {
        let shared = &self.shared;
        if shared.phase.load() != Phase::PreviewActive {
            self.reject("capture_still");
            on_result(false, output);
            return;
        }
        let (session, sink) = match (
            shared.slots.session.wait().await,
            shared.slots.still_sink.wait().await,
        ) {
            (Ok(session), Ok(sink)) => (session, sink),
            _ => {
                on_result(false, output);
                return;
            }
        };

        shared.slots.delivery.reset();
        let cycle = shared.cycle();
        let listener_shared = Arc::clone(shared);
        shared.hal.set_image_listener(
            &sink,
            Arc::new(move |frame| {
                if listener_shared.cycle() == cycle {
                    listener_shared.slots.delivery.complete(frame);
                }
            }),
        );

        let request = CaptureRequest {
            template: RequestTemplate::StillCapture,
            targets: vec![shared.hal.sink_surface(&sink)],
            auto_focus: AutoFocus::ContinuousPicture,
            flash: shared.flash_mode(),
            orientation: Some(STILL_ORIENTATION_DEGREES),
        };
        shared.phase.store(Phase::StillCapturing);
        shared.bus.publish(Event::now(EventKind::StillCaptureStarted));

        if let Err(e) = shared
            .hal
            .capture(&session, request, self.still_callbacks(cycle))
        {
            shared
                .bus
                .publish(Event::now(EventKind::StillCaptureFailed).with_reason(e.as_message()));
            shared.phase.store(Phase::PreviewActive);
            on_result(false, output);
            return;
        }

        match shared.slots.delivery.wait().await {
            Ok(frame) => {
                output.persist(frame);
                on_result(true, output);
                shared.bus.publish(Event::now(EventKind::StillCaptured));
                // The device requires a fresh session after an interleaved
                // still capture.
                shared.hal.close_session(&session);
                shared.slots.session.reset();
                self.configure_session().await;
            }
            Err(e) => {
                on_result(false, output);
                shared
                    .bus
                    .publish(Event::now(EventKind::StillCaptureFailed).with_reason(e.as_message()));
                if shared.phase.load() == Phase::StillCapturing {
                    shared.phase.store(Phase::PreviewActive);
                }
            }
        }
    }

    fn still_callbacks(&self, cycle: u64) -> CaptureCallbacks {
        let shared = Arc::clone(&self.shared);
        CaptureCallbacks {
            on_completed: Arc::new(|_update| {}),
            on_failed: Arc::new(move |reason| {
                if shared.cycle() == cycle {
                    shared.slots.delivery.fail(reason);
                }
            }),
        }
    }

    // ---- recording ----

    async fn start_recording(&self, recorder: Arc<dyn Recorder>) {
        let shared = &self.shared;
        if shared.phase.load() != Phase::PreviewActive {
            self.reject("start_recording");
            return;
        }
        let (device, surface) = match (
            shared.slots.device.wait().await,
            shared.slots.surface.wait().await,
        ) {
            (Ok(device), Ok(surface)) => (device, surface),
            _ => return,
        };

        if let Some(session) = shared.slots.session.peek() {
            shared.hal.close_session(&session);
        }
        shared.slots.session.reset();

        let targets = vec![surface, recorder.surface()];
        let cycle = shared.cycle();
        if shared
            .hal
            .create_session(&device, targets, self.session_callbacks(cycle))
            .is_err()
        {
            self.record_fallback().await;
            return;
        }
        let session = match shared.slots.session.wait().await {
            Ok(session) => session,
            Err(_) => {
                self.record_fallback().await;
                return;
            }
        };

        let request = CaptureRequest {
            template: RequestTemplate::Record,
            targets: vec![surface, recorder.surface()],
            auto_focus: AutoFocus::ContinuousPicture,
            flash: shared.flash_mode(),
            orientation: None,
        };
        if shared
            .hal
            .set_repeating(&session, request, self.preview_callbacks())
            .is_err()
        {
            shared.hal.close_session(&session);
            shared.slots.session.reset();
            self.record_fallback().await;
            return;
        }
        if recorder.start().is_err() {
            shared.hal.close_session(&session);
            shared.slots.session.reset();
            self.record_fallback().await;
            return;
        }
        shared.phase.store(Phase::Recording);
        shared.bus.publish(Event::now(EventKind::RecordingStarted));
    }

    /// Record-session setup failed: rebuild the plain preview session.
    async fn record_fallback(&self) {
        self.shared.bus.publish(
            Event::now(EventKind::SessionConfigureFailed).with_reason("record session rejected"),
        );
        self.shared.phase.store(Phase::SessionConfiguring);
        self.configure_session().await;
    }

    async fn stop_recording(&self, recorder: Arc<dyn Recorder>) {
        let shared = &self.shared;
        if shared.phase.load() != Phase::Recording {
            self.reject("stop_recording");
            return;
        }
        recorder.stop();
        recorder.reset();
        if let Some(session) = shared.slots.session.peek() {
            shared.hal.close_session(&session);
        }
        shared.slots.session.reset();
        shared.bus.publish(Event::now(EventKind::RecordingStopped));
        self.configure_session().await;
    }

    // ---- switching & teardown ----

    async fn switch_device(&self) {
        let shared = &self.shared;
        if shared.phase.load().is_transitional() {
            self.reject("switch_device");
            return;
        }
        let next = shared.selector().alternate();
        shared.bus.publish(Event::now(EventKind::DeviceSwitched));
        self.close_inner().await;
        self.open(next).await;
    }

    /// Teardown: release hardware behind every resolved slot, then reset the
    /// slots for reuse. Idempotent; callable from any phase.
    pub(crate) async fn close_inner(&self) {
        let shared = &self.shared;
        if shared.phase.load() == Phase::Closed {
            return;
        }
        shared.phase.store(Phase::Closing);
        shared.bus.publish(Event::now(EventKind::Closing));

        if let Some(session) = shared.slots.session.peek() {
            shared.hal.stop_repeating(&session);
            shared.hal.close_session(&session);
        }
        if let Some(sink) = shared.slots.still_sink.peek() {
            shared.hal.close_sink(&sink);
        }
        if let Some(device) = shared.slots.device.peek() {
            shared.hal.close_device(&device);
        }

        // Invalidate callbacks still in flight for this cycle (an open or
        // configure that never resolved has nothing to close above; its late
        // handle is released by the stale-cycle check in the callback), then
        // recycle the slots.
        shared.bump_cycle();
        shared.slots.cancel_all();
        shared.slots.reset_device_cycle();
        shared.phase.store(Phase::Closed);
        shared.bus.publish(Event::now(EventKind::Closed));
    }

    fn reject(&self, op: &'static str) {
        let phase = self.shared.phase.load();
        self.shared.bus.publish(
            Event::now(EventKind::CommandRejected)
                .with_reason(op)
                .with_phase(phase),
        );
    }
}
