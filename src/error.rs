//! Error types used by the camvisor runtime.
//!
//! This module defines two main error enums:
//!
//! - [`SlotError`] — failures observed by waiters of a single-assignment slot.
//! - [`CameraError`] — failures raised by the session orchestrator and the
//!   hardware abstraction.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Slot-level failures stay local to `wait()` callers; orchestrator-level hardware
//! failures are recovered internally by dropping back to the `Closed` phase and are
//! surfaced only through events or explicit result callbacks.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::Phase;
use crate::hal::DeviceSelector;

/// # Failures observed while waiting on a slot.
///
/// A slot accepts exactly one terminal transition per running period; waiters
/// observe the same terminal outcome. `Timeout` is the only non-terminal
/// failure: the slot stays running and a later completion is still observable.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// A bounded wait elapsed before the slot reached a terminal state.
    #[error("timed out after {timeout:?} waiting for slot value")]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The slot was cancelled (or interrupted) before a value arrived.
    #[error("slot was cancelled")]
    Cancelled,

    /// The producer recorded a failure instead of a value.
    #[error("slot producer failed: {cause}")]
    Failed {
        /// The cause reported by the producer.
        cause: Arc<str>,
    },
}

impl SlotError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use camvisor::SlotError;
    /// use std::time::Duration;
    ///
    /// let err = SlotError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "slot_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SlotError::Timeout { .. } => "slot_timeout",
            SlotError::Cancelled => "slot_cancelled",
            SlotError::Failed { .. } => "slot_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SlotError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            SlotError::Cancelled => "cancelled".to_string(),
            SlotError::Failed { cause } => format!("failed: {cause}"),
        }
    }

    /// Indicates whether the caller may wait again on the same slot.
    ///
    /// Only `Timeout` leaves the slot running; cancellation and producer
    /// failure are terminal until the owner resets the slot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlotError::Timeout { .. })
    }
}

/// # Errors produced by the session orchestrator.
///
/// These cover phase misuse, missing hardware capabilities, and failures
/// reported by the hardware abstraction. Hardware failures that occur while a
/// phase routine is in flight are not returned from public operations; the
/// orchestrator recovers by closing and callers observe the drop to `Closed`
/// via events.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CameraError {
    /// The active device does not support the requested feature.
    #[error("capability unavailable: {feature}")]
    CapabilityUnavailable {
        /// Name of the missing feature (e.g. "flash").
        feature: &'static str,
    },

    /// No enumerated device matches the requested selector.
    #[error("no device for selector {selector:?}")]
    NoSuchDevice {
        /// The selector that failed to resolve.
        selector: DeviceSelector,
    },

    /// Session setup was rejected by the hardware.
    #[error("session configuration failed: {reason}")]
    ConfigurationFailed {
        /// Reason reported by the hardware abstraction.
        reason: String,
    },

    /// An individual capture request failed.
    #[error("capture failed: {reason}")]
    CaptureFailed {
        /// Reason reported by the hardware abstraction.
        reason: String,
    },

    /// An operation arrived in a phase where it is not valid.
    #[error("operation {op} invalid in phase {phase:?}")]
    InvalidPhase {
        /// The rejected operation.
        op: &'static str,
        /// The phase the orchestrator was in.
        phase: Phase,
    },

    /// The device reported a hardware error code.
    #[error("device error code {code}")]
    Device {
        /// Vendor-specific error code.
        code: i32,
    },

    /// A slot wait failed while sequencing a phase.
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// The serial worker has exited; no further commands can be processed.
    #[error("orchestrator worker is gone")]
    WorkerGone,

    /// Shutdown grace period was exceeded before the worker finished.
    #[error("shutdown grace {grace:?} exceeded; worker aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl CameraError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CameraError::CapabilityUnavailable { .. } => "capability_unavailable",
            CameraError::NoSuchDevice { .. } => "no_such_device",
            CameraError::ConfigurationFailed { .. } => "configuration_failed",
            CameraError::CaptureFailed { .. } => "capture_failed",
            CameraError::InvalidPhase { .. } => "invalid_phase",
            CameraError::Device { .. } => "device_error",
            CameraError::Slot(e) => e.as_label(),
            CameraError::WorkerGone => "worker_gone",
            CameraError::GraceExceeded { .. } => "grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CameraError::CapabilityUnavailable { feature } => format!("unavailable: {feature}"),
            CameraError::NoSuchDevice { selector } => format!("no device: {selector:?}"),
            CameraError::ConfigurationFailed { reason } => format!("configure: {reason}"),
            CameraError::CaptureFailed { reason } => format!("capture: {reason}"),
            CameraError::InvalidPhase { op, phase } => format!("{op} in {phase:?}"),
            CameraError::Device { code } => format!("device code {code}"),
            CameraError::Slot(e) => e.as_message(),
            CameraError::WorkerGone => "worker gone".to_string(),
            CameraError::GraceExceeded { grace } => format!("grace exceeded after {grace:?}"),
        }
    }
}
