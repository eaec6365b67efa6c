//! # Lifecycle events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across the session
//! lifecycle:
//! - **Device events**: open, disconnect, hardware error
//! - **Session events**: surface binding, configuration outcome
//! - **Streaming events**: preview, focus convergence, capture, recording
//! - **Teardown events**: closing, closed, rejected commands
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! device ids, reasons, chosen output sizes, and hardware error codes.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::core::Phase;
use crate::hal::OutputSize;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of orchestrator events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Device events ===
    /// A device finished opening.
    ///
    /// Sets: `device`, `at`, `seq`.
    DeviceOpened,

    /// The active device disconnected; the orchestrator is closing.
    ///
    /// Sets: `device`, `at`, `seq`.
    DeviceDisconnected,

    /// The device reported a hardware error; the orchestrator is closing.
    ///
    /// Sets: `device`, `code`, `at`, `seq`.
    DeviceError,

    /// A `switch_device` request began tearing down the current device.
    ///
    /// Sets: `at`, `seq`.
    DeviceSwitched,

    // === Session events ===
    /// The preview surface and its size were bound.
    ///
    /// Sets: `size` (view size), `at`, `seq`.
    SurfaceBound,

    /// A capture session was configured.
    ///
    /// Sets: `size` (chosen transposed output size), `at`, `seq`.
    SessionConfigured,

    /// Session configuration was rejected by the hardware.
    ///
    /// Sets: `reason`, `at`, `seq`.
    SessionConfigureFailed,

    // === Streaming events ===
    /// The repeating preview request was installed.
    ///
    /// Sets: `at`, `seq`.
    PreviewStarted,

    /// AF and AE both converged on the current repeating stream.
    /// Informational; no phase transition.
    ///
    /// Sets: `at`, `seq`.
    FocusConverged,

    /// A one-shot still capture was issued.
    ///
    /// Sets: `at`, `seq`.
    StillCaptureStarted,

    /// A still frame was delivered to the frame sink.
    ///
    /// Sets: `at`, `seq`.
    StillCaptured,

    /// A still capture failed; the orchestrator returned to preview.
    ///
    /// Sets: `reason`, `at`, `seq`.
    StillCaptureFailed,

    /// A record session is streaming and the recorder started.
    ///
    /// Sets: `at`, `seq`.
    RecordingStarted,

    /// Recording stopped; the plain preview session is being rebuilt.
    ///
    /// Sets: `at`, `seq`.
    RecordingStopped,

    /// The flash mode changed.
    ///
    /// Sets: `reason` ("on"/"off"), `at`, `seq`.
    FlashChanged,

    // === Teardown events ===
    /// An operation arrived in a phase where it is not valid and was dropped.
    ///
    /// Sets: `reason` (operation name), `phase`, `at`, `seq`.
    CommandRejected,

    /// Teardown began.
    ///
    /// Sets: `at`, `seq`.
    Closing,

    /// Teardown finished; all slots were reset for reuse.
    ///
    /// Sets: `at`, `seq`.
    Closed,
}

/// Orchestrator event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Device id, if applicable.
    pub device: Option<Arc<str>>,
    /// Human-readable reason (errors, rejected operation names, etc.).
    pub reason: Option<Arc<str>>,
    /// Output or view size, if applicable.
    pub size: Option<OutputSize>,
    /// Hardware error code, if applicable.
    pub code: Option<i32>,
    /// Orchestrator phase at emission time, if applicable.
    pub phase: Option<Phase>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            device: None,
            reason: None,
            size: None,
            code: None,
            phase: None,
        }
    }

    /// Attaches a device id.
    #[inline]
    pub fn with_device(mut self, device: impl Into<Arc<str>>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a size.
    #[inline]
    pub fn with_size(mut self, size: OutputSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Attaches a hardware error code.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches the current phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }
}
