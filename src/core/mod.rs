//! # Core runtime: phases, shared state, serial worker, orchestrator.
//!
//! ```text
//! SessionOrchestrator ── Command ──► worker ──► Driver ──► CameraHal
//!         │                                       │
//!         │  (cancel slots on close)              │ awaits
//!         ▼                                       ▼
//!       Shared ◄── complete/fail ────────────── Slots ◄── HAL callbacks
//! ```

mod driver;
mod orchestrator;
mod phase;
mod shared;
mod worker;

pub use orchestrator::SessionOrchestrator;
pub use phase::Phase;
pub use worker::CaptureResultFn;
