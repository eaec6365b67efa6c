//! # Orchestrator phases.
//!
//! ```text
//! Closed ─► Opening ─► DeviceOpen ─► SessionConfiguring ─► PreviewActive
//!                           │                │                 │     ▲
//!                           │ (error/        │ (error/         ▼     │
//!                           ▼  disconnect)   ▼  disconnect)  StillCapturing
//!                        Closing ◄────────────────────┐      Recording
//!                           │                         └───────┘ (close)
//!                           ▼
//!                        Closed
//! ```
//!
//! The serial worker is the only writer; public operations read the phase to
//! reject obviously invalid requests early, but the worker's own check is
//! authoritative.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a [`SessionOrchestrator`](crate::SessionOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// No device held; `open` is valid.
    Closed = 0,
    /// Device open requested; waiting on the device slot.
    Opening = 1,
    /// Device resolved; session configuration about to start.
    DeviceOpen = 2,
    /// Waiting on surface slots and session configuration.
    SessionConfiguring = 3,
    /// Repeating preview request installed.
    PreviewActive = 4,
    /// One-shot still capture in flight.
    StillCapturing = 5,
    /// Record session streaming.
    Recording = 6,
    /// Teardown in progress.
    Closing = 7,
}

impl Phase {
    fn from_raw(raw: u8) -> Phase {
        match raw {
            0 => Phase::Closed,
            1 => Phase::Opening,
            2 => Phase::DeviceOpen,
            3 => Phase::SessionConfiguring,
            4 => Phase::PreviewActive,
            5 => Phase::StillCapturing,
            6 => Phase::Recording,
            _ => Phase::Closing,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Opening => "opening",
            Phase::DeviceOpen => "device_open",
            Phase::SessionConfiguring => "session_configuring",
            Phase::PreviewActive => "preview_active",
            Phase::StillCapturing => "still_capturing",
            Phase::Recording => "recording",
            Phase::Closing => "closing",
        }
    }

    /// True while a transition is in flight (`switch_device` is rejected in
    /// these phases).
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            Phase::Opening | Phase::SessionConfiguring | Phase::Closing
        )
    }
}

/// Atomic phase cell shared between the worker and public readers.
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new(phase: Phase) -> Self {
        Self(AtomicU8::new(phase as u8))
    }

    pub fn load(&self) -> Phase {
        Phase::from_raw(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(Phase::Closed.as_label(), "closed");
        assert_eq!(Phase::PreviewActive.as_label(), "preview_active");
    }

    #[test]
    fn test_transitional_phases() {
        assert!(Phase::Opening.is_transitional());
        assert!(Phase::Closing.is_transitional());
        assert!(!Phase::PreviewActive.is_transitional());
        assert!(!Phase::Closed.is_transitional());
    }

    #[test]
    fn test_cell_round_trips() {
        let cell = PhaseCell::new(Phase::Closed);
        assert_eq!(cell.load(), Phase::Closed);
        cell.store(Phase::Recording);
        assert_eq!(cell.load(), Phase::Recording);
    }
}
