//! State shared between the public handle, the serial worker, and the HAL
//! callback closures.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::OrchestratorConfig;
use crate::events::Bus;
use crate::hal::{
    CameraHal, DeviceHandle, DeviceInventory, DeviceSelector, FlashMode, FrameHandle, OutputSize,
    SessionHandle, SinkHandle, SurfaceHandle,
};
use crate::slot::Slot;

use super::phase::{Phase, PhaseCell};

/// The orchestrator's named slots.
///
/// One slot per asynchronously produced value. All are owned exclusively by
/// the orchestrator; external code only reaches them through public
/// operations. `delivery` gates one in-flight still capture so `close()` can
/// unblock the worker mid-capture like any other slot wait.
pub(crate) struct Slots {
    pub device: Slot<DeviceHandle>,
    pub surface: Slot<SurfaceHandle>,
    pub surface_size: Slot<OutputSize>,
    pub session: Slot<SessionHandle>,
    pub still_sink: Slot<SinkHandle>,
    pub delivery: Slot<FrameHandle>,
}

impl Slots {
    pub fn new() -> Self {
        Self {
            device: Slot::named("device"),
            surface: Slot::named("surface"),
            surface_size: Slot::named("surface-size"),
            session: Slot::named("session"),
            still_sink: Slot::named("still-sink"),
            delivery: Slot::named("delivery"),
        }
    }

    /// Cancels every slot still running, unblocking any worker wait.
    ///
    /// Completed slots are untouched (cancel loses the CAS), so their values
    /// remain readable for hardware release during close.
    pub fn cancel_all(&self) {
        self.device.cancel(false);
        self.surface.cancel(false);
        self.surface_size.cancel(false);
        self.session.cancel(false);
        self.still_sink.cancel(false);
        self.delivery.cancel(false);
    }

    /// Resets the slots tied to one open cycle back to `Running`.
    ///
    /// The preview surface slots are owned by the host's view and survive
    /// device cycles; they are reset only when cancelled (close marked them
    /// terminal and the host must re-bind).
    pub fn reset_device_cycle(&self) {
        self.device.reset();
        self.session.reset();
        self.still_sink.reset();
        self.delivery.reset();
        if self.surface.is_cancelled() {
            self.surface.reset();
        }
        if self.surface_size.is_cancelled() {
            self.surface_size.reset();
        }
    }
}

/// Shared orchestrator state.
pub(crate) struct Shared {
    pub hal: Arc<dyn CameraHal>,
    pub inventory: DeviceInventory,
    pub bus: Bus,
    pub slots: Slots,
    pub phase: PhaseCell,
    pub cfg: OrchestratorConfig,
    /// Open-cycle generation. Bumped by `open` and by teardown; hardware
    /// callbacks carry the generation they were built in and are dropped
    /// when it no longer matches (stale callback after a close/reset race).
    cycle: AtomicU64,
    selector: Mutex<DeviceSelector>,
    flash: AtomicBool,
}

impl Shared {
    pub fn new(hal: Arc<dyn CameraHal>, cfg: OrchestratorConfig, bus: Bus) -> Self {
        let inventory = DeviceInventory::scan(hal.as_ref());
        Self {
            hal,
            inventory,
            bus,
            slots: Slots::new(),
            phase: PhaseCell::new(Phase::Closed),
            cfg,
            cycle: AtomicU64::new(0),
            selector: Mutex::new(DeviceSelector::Back),
            flash: AtomicBool::new(false),
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle.load(Ordering::Acquire)
    }

    /// Advances the generation, invalidating callbacks from earlier cycles.
    pub fn bump_cycle(&self) -> u64 {
        self.cycle.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn selector(&self) -> DeviceSelector {
        *self
            .selector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_selector(&self, selector: DeviceSelector) {
        *self
            .selector
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = selector;
    }

    pub fn flash_enabled(&self) -> bool {
        self.flash.load(Ordering::Acquire)
    }

    pub fn set_flash_enabled(&self, enabled: bool) {
        self.flash.store(enabled, Ordering::Release);
    }

    pub fn flash_mode(&self) -> FlashMode {
        FlashMode::from_enabled(self.flash_enabled())
    }
}
