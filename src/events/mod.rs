//! Orchestrator events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the serial worker, the
//! hardware callback threads, and the public operations.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the serial worker's phase routines, HAL callback
//!   closures, `bind_preview_surface`, `set_flash`.
//! - **Consumers**: the orchestrator's subscriber listener (fans out to
//!   [`SubscriberSet`](crate::SubscriberSet)) and any direct
//!   [`subscribe`](crate::SessionOrchestrator::subscribe) receiver.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
