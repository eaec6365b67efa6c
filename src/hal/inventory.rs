//! Selector → device catalog, built once at orchestrator construction.
//!
//! Replaces ambient global device registries with an explicit context object:
//! the orchestrator scans the HAL's id list once, keeps the characteristics
//! of the last id reported per lens facing, and resolves
//! [`DeviceSelector`]s against that snapshot for the rest of its lifetime.

use std::collections::HashMap;

use crate::error::CameraError;

use super::types::{CameraCharacteristics, DeviceSelector};
use super::CameraHal;

/// Immutable catalog of the devices visible at construction time.
#[derive(Debug, Clone)]
pub struct DeviceInventory {
    devices: HashMap<DeviceSelector, CameraCharacteristics>,
}

impl DeviceInventory {
    /// Scans the HAL once and records one device per selector.
    ///
    /// Ids whose characteristics cannot be read are skipped; when several
    /// devices share a facing, the last enumerated one wins.
    pub fn scan(hal: &dyn CameraHal) -> Self {
        let mut devices = HashMap::new();
        for id in hal.device_ids() {
            if let Ok(chars) = hal.characteristics(&id) {
                devices.insert(chars.facing.selector(), chars);
            }
        }
        Self { devices }
    }

    /// Resolves a selector to its device characteristics.
    pub fn get(&self, selector: DeviceSelector) -> Result<&CameraCharacteristics, CameraError> {
        self.devices
            .get(&selector)
            .ok_or(CameraError::NoSuchDevice { selector })
    }

    /// True if a device with this facing was enumerated.
    pub fn has(&self, selector: DeviceSelector) -> bool {
        self.devices.contains_key(&selector)
    }
}
