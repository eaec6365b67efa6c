//! # Event subscribers for the orchestrator.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver events broadcast through the
//! [`Bus`](crate::events::Bus) without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   worker / callbacks ── publish(Event) ──► Bus ──► subscriber listener
//!                                                        │
//!                                                        ▼
//!                                              SubscriberSet::emit(&Event)
//!                                                   ┌────┴────┬────────┐
//!                                                   ▼         ▼        ▼
//!                                               LogWriter  Metrics  Custom
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
