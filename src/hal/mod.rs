//! Hardware abstraction boundary.
//!
//! The orchestrator never talks to a device directly; everything goes through
//! the [`CameraHal`] trait, which mirrors the open/configure/stream/capture
//! callback protocol of the underlying platform. Initiating calls return
//! immediately; results arrive through the callback bundles on an arbitrary
//! thread, where they resolve the orchestrator's slots.
//!
//! ## Contents
//! - [`CameraHal`] — device access, session setup, capture requests, sinks
//! - [`Recorder`] — external audio/video encoder collaborator
//! - [`FrameSink`] — external persistence collaborator for still frames
//! - [`DeviceInventory`] — selector → characteristics catalog built at init
//! - handle/request/callback types in [`types`]

mod inventory;
mod types;

pub use inventory::DeviceInventory;
pub use types::{
    AutoFocus, CameraCharacteristics, CaptureCallbacks, CaptureRequest, CaptureUpdate,
    DeviceCallbacks, DeviceHandle, DeviceId, DeviceSelector, FlashMode, FocusPoint, FrameHandle,
    ImageListener, LensFacing, MeteringRect, OutputSize, RequestTemplate, SensorRect,
    SessionCallbacks, SessionHandle, SinkHandle, SurfaceHandle, SurfaceKind,
};

use crate::error::CameraError;

/// # Callback-driven camera hardware abstraction.
///
/// Implementations must be callable from any thread. Every asynchronous
/// operation takes a callback bundle and is required to eventually fire
/// exactly one of its callbacks; the
/// [orchestrator](crate::SessionOrchestrator) relies on this to never park
/// forever on a slot.
///
/// Close calls are synchronous and idempotent: after `close_*` returns, no
/// further callbacks may fire for that object.
pub trait CameraHal: Send + Sync + 'static {
    /// Enumerates all device ids known to the HAL.
    fn device_ids(&self) -> Vec<DeviceId>;

    /// Queries capability metadata for a device. Read-only; callable
    /// off-worker.
    fn characteristics(&self, id: &DeviceId) -> Result<CameraCharacteristics, CameraError>;

    /// Starts opening a device; the result arrives via `callbacks`.
    fn open_device(&self, id: &DeviceId, callbacks: DeviceCallbacks) -> Result<(), CameraError>;

    /// Releases an opened device.
    fn close_device(&self, device: &DeviceHandle);

    /// Starts configuring a capture session bound to `targets`; the result
    /// arrives via `callbacks`.
    fn create_session(
        &self,
        device: &DeviceHandle,
        targets: Vec<SurfaceHandle>,
        callbacks: SessionCallbacks,
    ) -> Result<(), CameraError>;

    /// Releases a configured session.
    fn close_session(&self, session: &SessionHandle);

    /// Installs `request` as the session's repeating request, replacing any
    /// previous one.
    fn set_repeating(
        &self,
        session: &SessionHandle,
        request: CaptureRequest,
        callbacks: CaptureCallbacks,
    ) -> Result<(), CameraError>;

    /// Stops the session's repeating request, if any.
    fn stop_repeating(&self, session: &SessionHandle);

    /// Issues a one-shot capture request.
    fn capture(
        &self,
        session: &SessionHandle,
        request: CaptureRequest,
        callbacks: CaptureCallbacks,
    ) -> Result<(), CameraError>;

    /// Creates a still-image sink producing frames at `size`.
    fn create_still_sink(&self, size: OutputSize) -> Result<SinkHandle, CameraError>;

    /// The surface a session must target for frames to reach `sink`.
    fn sink_surface(&self, sink: &SinkHandle) -> SurfaceHandle;

    /// Arms the sink's delivery listener; fired once per delivered frame.
    fn set_image_listener(&self, sink: &SinkHandle, listener: ImageListener);

    /// Releases a still-image sink.
    fn close_sink(&self, sink: &SinkHandle);
}

/// External audio/video encoder collaborator.
///
/// The orchestrator only starts/stops it at session boundaries; encoder and
/// container configuration are the host's concern.
pub trait Recorder: Send + Sync + 'static {
    /// The surface the record session streams frames into.
    fn surface(&self) -> SurfaceHandle;

    /// Starts encoding.
    fn start(&self) -> Result<(), CameraError>;

    /// Stops encoding.
    fn stop(&self);

    /// Returns the recorder to its idle state for reuse.
    fn reset(&self);
}

/// External persistence collaborator for captured still frames.
///
/// The orchestrator passes delivered frames through without touching their
/// contents; persistence, format, and storage location belong to the host.
pub trait FrameSink: Send + Sync + 'static {
    /// Hands one delivered frame to the collaborator.
    fn persist(&self, frame: FrameHandle);
}
