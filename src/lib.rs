//! # camvisor
//!
//! Async orchestration for a callback-driven camera device.
//!
//! The underlying hardware abstraction reports everything through callbacks
//! on arbitrary threads: device opened, session configured, frame delivered.
//! `camvisor` turns that into straight-line async code with two pieces:
//!
//! - [`Slot<T>`] — a resettable single-assignment future. A callback
//!   completes it once; any number of tasks await the same outcome; the
//!   owner resets it for the next open/close cycle.
//! - [`SessionOrchestrator`] — a phase machine running on a serial worker
//!   task. Public operations post commands; the worker executes them one at
//!   a time, awaiting slots where the hardware is asynchronous.
//!
//! ## Architecture
//! ```text
//!  host app ──► SessionOrchestrator ── Command ──► serial worker
//!                      │                               │
//!                      │ bind_preview_surface          │ open / configure /
//!                      ▼                               ▼ capture / record
//!                   Slots  ◄── complete / fail ──  CameraHal callbacks
//!                      │
//!                      └──► Bus ──► broadcast subscribers / SubscriberSet
//! ```
//!
//! ## Quick start
//! ```no_run
//! use std::sync::Arc;
//! use camvisor::{DeviceSelector, OrchestratorConfig, SessionOrchestrator, SurfaceHandle};
//!
//! # async fn demo(hal: Arc<dyn camvisor::CameraHal>) -> Result<(), camvisor::CameraError> {
//! let cam = SessionOrchestrator::new(hal, OrchestratorConfig::default(), Vec::new());
//! let mut events = cam.subscribe();
//!
//! cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
//! cam.open(DeviceSelector::Back)?;
//!
//! while let Ok(ev) = events.recv().await {
//!     println!("[{}] {:?}", ev.seq, ev.kind);
//! }
//! cam.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod hal;
pub mod policies;
pub mod slot;
pub mod subscribers;

pub use config::OrchestratorConfig;
pub use core::{CaptureResultFn, Phase, SessionOrchestrator};
pub use error::{CameraError, SlotError};
pub use events::{Bus, Event, EventKind};
pub use hal::{
    AutoFocus, CameraCharacteristics, CameraHal, CaptureCallbacks, CaptureRequest, CaptureUpdate,
    DeviceCallbacks, DeviceHandle, DeviceId, DeviceInventory, DeviceSelector, FlashMode,
    FocusPoint, FrameHandle, FrameSink, ImageListener, LensFacing, MeteringRect, OutputSize,
    Recorder, RequestTemplate, SensorRect, SessionCallbacks, SessionHandle, SinkHandle,
    SurfaceHandle, SurfaceKind,
};
pub use slot::{Slot, SlotState};
pub use subscribers::{Subscribe, SubscriberSet};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
