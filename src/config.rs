//! # Orchestrator configuration.
//!
//! Provides [`OrchestratorConfig`] — centralized settings passed to
//! [`SessionOrchestrator::new`](crate::SessionOrchestrator::new).

use std::time::Duration;

/// Configuration for one orchestrator instance.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `grace`: maximum wait for the serial worker to finish during
///   `shutdown()` before it is aborted
/// - `aspect_tolerance`: maximum absolute aspect-ratio difference accepted by
///   the best-fit output-size policy
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Maximum time `shutdown()` waits for the worker to drain before
    /// aborting it and returning `GraceExceeded`.
    pub grace: Duration,

    /// Aspect-ratio tolerance for best-fit output-size selection.
    pub aspect_tolerance: f64,
}

impl OrchestratorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for OrchestratorConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    /// - `grace = 5s` (worker routines finish quickly once slots resolve)
    /// - `aspect_tolerance = 0.1` (platform-conventional tolerance)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
            aspect_tolerance: 0.1,
        }
    }
}
