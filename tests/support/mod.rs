//! Shared test doubles: a scriptable in-memory HAL, recorder, and frame sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use camvisor::{
    CameraCharacteristics, CameraError, CameraHal, CaptureCallbacks, CaptureRequest, CaptureUpdate,
    DeviceCallbacks, DeviceHandle, DeviceId, Event, EventKind, FrameHandle, FrameSink,
    ImageListener, LensFacing, OutputSize, Recorder, RequestTemplate, SensorRect, SessionCallbacks,
    SessionHandle, SinkHandle, SurfaceHandle,
};

/// Sink surfaces are offset so tests can map a session target back to its
/// sink.
pub const SINK_SURFACE_BASE: u64 = 1000;

#[derive(Default)]
struct State {
    /// Callback bundles in the order `open_device` received them, so tests
    /// can fire completions for earlier open attempts.
    device_cbs: Vec<DeviceCallbacks>,
    repeating_cbs: Option<CaptureCallbacks>,
    listeners: HashMap<SinkHandle, ImageListener>,
    last_repeating: Option<CaptureRequest>,
    next_handle: u64,
    sessions_created: usize,
    sessions_closed: usize,
    sinks_closed: usize,
    devices_closed: usize,
}

/// In-memory [`CameraHal`] that fires callbacks synchronously.
///
/// Default behavior acknowledges opens and session configurations and
/// delivers one frame per capture. Flags flip individual operations into
/// failure or manual modes.
pub struct MockHal {
    state: Mutex<State>,
    /// When false, `open_device` stores the callbacks without firing them.
    pub ack_opens: AtomicBool,
    /// Fail the next `create_session` via `on_configure_failed`, once.
    pub fail_next_session: AtomicBool,
    /// Fail every `capture` via `on_failed`.
    pub fail_capture: AtomicBool,
}

impl MockHal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            ack_opens: AtomicBool::new(true),
            fail_next_session: AtomicBool::new(false),
            fail_capture: AtomicBool::new(false),
        })
    }

    fn chars_for(id: &str) -> Option<CameraCharacteristics> {
        let active_array = SensorRect::new(0, 0, 4000, 3000);
        match id {
            "0" => Some(CameraCharacteristics {
                id: DeviceId::from("0"),
                facing: LensFacing::Back,
                flash_available: true,
                active_array,
                preview_sizes: vec![OutputSize::new(1920, 1080), OutputSize::new(1280, 720)],
                record_sizes: vec![OutputSize::new(1920, 1080)],
            }),
            "1" => Some(CameraCharacteristics {
                id: DeviceId::from("1"),
                facing: LensFacing::Front,
                flash_available: false,
                active_array,
                preview_sizes: vec![OutputSize::new(1280, 720)],
                record_sizes: vec![OutputSize::new(1280, 720)],
            }),
            _ => None,
        }
    }

    /// Fires `on_opened` for the nth open attempt (manual-ack mode).
    pub fn fire_opened(&self, attempt: usize, id: &str) {
        let cbs = self.state.lock().unwrap().device_cbs.get(attempt).cloned();
        if let Some(cbs) = cbs {
            (cbs.on_opened)(DeviceHandle {
                id: DeviceId::from(id),
            });
        }
    }

    /// Simulates the active device disconnecting.
    pub fn disconnect(&self, id: &str) {
        let cbs = self.state.lock().unwrap().device_cbs.last().cloned();
        if let Some(cbs) = cbs {
            (cbs.on_disconnected)(DeviceHandle {
                id: DeviceId::from(id),
            });
        }
    }

    /// Fires the stored repeating-request completion callback.
    pub fn complete_repeating(&self, update: CaptureUpdate) {
        let cbs = self.state.lock().unwrap().repeating_cbs.clone();
        if let Some(cbs) = cbs {
            (cbs.on_completed)(update);
        }
    }

    pub fn sessions_created(&self) -> usize {
        self.state.lock().unwrap().sessions_created
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.lock().unwrap().sessions_closed
    }

    pub fn devices_closed(&self) -> usize {
        self.state.lock().unwrap().devices_closed
    }

    pub fn sinks_closed(&self) -> usize {
        self.state.lock().unwrap().sinks_closed
    }

    pub fn last_repeating(&self) -> Option<CaptureRequest> {
        self.state.lock().unwrap().last_repeating.clone()
    }
}

impl CameraHal for MockHal {
    fn device_ids(&self) -> Vec<DeviceId> {
        vec![DeviceId::from("0"), DeviceId::from("1")]
    }

    fn characteristics(&self, id: &DeviceId) -> Result<CameraCharacteristics, CameraError> {
        Self::chars_for(id.as_str()).ok_or(CameraError::Device { code: -1 })
    }

    fn open_device(&self, id: &DeviceId, callbacks: DeviceCallbacks) -> Result<(), CameraError> {
        let ack = self.ack_opens.load(Ordering::SeqCst);
        {
            let mut st = self.state.lock().unwrap();
            st.device_cbs.push(callbacks.clone());
        }
        if ack {
            (callbacks.on_opened)(DeviceHandle { id: id.clone() });
        }
        Ok(())
    }

    fn close_device(&self, _device: &DeviceHandle) {
        self.state.lock().unwrap().devices_closed += 1;
    }

    fn create_session(
        &self,
        _device: &DeviceHandle,
        _targets: Vec<SurfaceHandle>,
        callbacks: SessionCallbacks,
    ) -> Result<(), CameraError> {
        let session = {
            let mut st = self.state.lock().unwrap();
            st.next_handle += 1;
            st.sessions_created += 1;
            SessionHandle(st.next_handle)
        };
        if self.fail_next_session.swap(false, Ordering::SeqCst) {
            (callbacks.on_configure_failed)(session);
        } else {
            (callbacks.on_configured)(session);
        }
        Ok(())
    }

    fn close_session(&self, _session: &SessionHandle) {
        self.state.lock().unwrap().sessions_closed += 1;
    }

    fn set_repeating(
        &self,
        _session: &SessionHandle,
        request: CaptureRequest,
        callbacks: CaptureCallbacks,
    ) -> Result<(), CameraError> {
        let mut st = self.state.lock().unwrap();
        st.last_repeating = Some(request);
        st.repeating_cbs = Some(callbacks);
        Ok(())
    }

    fn stop_repeating(&self, _session: &SessionHandle) {}

    fn capture(
        &self,
        _session: &SessionHandle,
        request: CaptureRequest,
        callbacks: CaptureCallbacks,
    ) -> Result<(), CameraError> {
        assert_eq!(request.template, RequestTemplate::StillCapture);
        if self.fail_capture.load(Ordering::SeqCst) {
            (callbacks.on_failed)("simulated capture failure".to_string());
            return Ok(());
        }
        let (listener, frame) = {
            let mut st = self.state.lock().unwrap();
            let sink = SinkHandle(request.targets[0].0 - SINK_SURFACE_BASE);
            st.next_handle += 1;
            (st.listeners.get(&sink).cloned(), FrameHandle(st.next_handle))
        };
        if let Some(listener) = listener {
            listener(frame);
        }
        (callbacks.on_completed)(CaptureUpdate {
            focus_locked: true,
            exposure_converged: true,
        });
        Ok(())
    }

    fn create_still_sink(&self, _size: OutputSize) -> Result<SinkHandle, CameraError> {
        let mut st = self.state.lock().unwrap();
        st.next_handle += 1;
        Ok(SinkHandle(st.next_handle))
    }

    fn sink_surface(&self, sink: &SinkHandle) -> SurfaceHandle {
        SurfaceHandle(sink.0 + SINK_SURFACE_BASE)
    }

    fn set_image_listener(&self, sink: &SinkHandle, listener: ImageListener) {
        self.state.lock().unwrap().listeners.insert(*sink, listener);
    }

    fn close_sink(&self, sink: &SinkHandle) {
        let mut st = self.state.lock().unwrap();
        st.listeners.remove(sink);
        st.sinks_closed += 1;
    }
}

/// Recorder double tracking lifecycle calls.
pub struct MockRecorder {
    pub started: AtomicBool,
    pub stopped: AtomicBool,
    pub was_reset: AtomicBool,
}

impl MockRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            was_reset: AtomicBool::new(false),
        })
    }
}

impl Recorder for MockRecorder {
    fn surface(&self) -> SurfaceHandle {
        SurfaceHandle(9000)
    }

    fn start(&self) -> Result<(), CameraError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.was_reset.store(true, Ordering::SeqCst);
    }
}

/// Frame sink double recording every persisted frame.
pub struct CountingSink {
    pub frames: Mutex<Vec<FrameHandle>>,
}

impl CountingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

impl FrameSink for CountingSink {
    fn persist(&self, frame: FrameHandle) {
        self.frames.lock().unwrap().push(frame);
    }
}

/// Receives events until `kind` arrives; panics after two seconds.
pub async fn wait_for_kind(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("event bus closed while waiting for {kind:?}")
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
}
