//! Data model shared with the hardware abstraction.
//!
//! Handles are opaque references: the HAL owns the real device/session/sink
//! objects and the orchestrator only passes these tokens back for follow-up
//! calls (close, capture, listener arming). All handle types are cheap to
//! clone so they can live inside slots with many concurrent waiters.

use std::sync::Arc;

/// Identifies which physical sensor endpoint to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceSelector {
    /// The user-facing sensor.
    Front,
    /// The world-facing sensor.
    Back,
}

impl DeviceSelector {
    /// Returns the other selector (used by device switching).
    pub fn alternate(&self) -> DeviceSelector {
        match self {
            DeviceSelector::Front => DeviceSelector::Back,
            DeviceSelector::Back => DeviceSelector::Front,
        }
    }
}

/// Mounting direction reported per device id by the HAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensFacing {
    Front,
    Back,
}

impl LensFacing {
    /// The selector that targets devices with this facing.
    pub fn selector(&self) -> DeviceSelector {
        match self {
            LensFacing::Front => DeviceSelector::Front,
            LensFacing::Back => DeviceSelector::Back,
        }
    }
}

/// Stable HAL-assigned device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(pub Arc<str>);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId(Arc::from(s))
    }
}

/// Opaque reference to an opened device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Identifier of the underlying device.
    pub id: DeviceId,
}

/// Opaque reference to a configured capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Opaque reference to an output surface (preview texture, recorder input,
/// still sink surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Opaque reference to a still-image sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkHandle(pub u64);

/// Opaque reference to one delivered image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// A width × height pair.
///
/// Supported sizes reported by the HAL are landscape-oriented; sizes chosen
/// for the portrait preview surface are transposed (see
/// [`best_fit_size`](crate::policies::best_fit_size)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width-over-height ratio.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// The same size with width and height swapped.
    pub fn transposed(&self) -> OutputSize {
        OutputSize {
            width: self.height,
            height: self.width,
        }
    }
}

/// Axis-aligned rectangle in sensor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SensorRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// A weighted rectangle used to bias autofocus/auto-exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeteringRect {
    pub region: SensorRect,
    pub weight: u32,
}

/// A touch point in view coordinates, with the view's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusPoint {
    pub x: u32,
    pub y: u32,
    pub view_width: u32,
    pub view_height: u32,
}

/// Which kind of output surface a supported-size query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Preview texture stream.
    Preview,
    /// Recorder input stream.
    Record,
}

/// Template a capture request is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTemplate {
    /// Continuous preview stream.
    Preview,
    /// One-shot still capture.
    StillCapture,
    /// Continuous record stream.
    Record,
}

/// Flash mode applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    Off,
    Torch,
}

impl FlashMode {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            FlashMode::Torch
        } else {
            FlashMode::Off
        }
    }
}

/// Autofocus behavior for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFocus {
    /// Continuous-picture autofocus over the whole frame.
    ContinuousPicture,
    /// One AF scan triggered over a metered region.
    TriggerScan { region: MeteringRect },
}

/// A capture request issued to the HAL, either repeating or one-shot.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub targets: Vec<SurfaceHandle>,
    pub auto_focus: AutoFocus,
    pub flash: FlashMode,
    /// Orientation metadata in degrees, set on still captures only.
    pub orientation: Option<u32>,
}

/// Per-frame completion metadata reported by the HAL for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureUpdate {
    pub focus_locked: bool,
    pub exposure_converged: bool,
}

impl CaptureUpdate {
    /// True once both AF and AE have settled.
    pub fn converged(&self) -> bool {
        self.focus_locked && self.exposure_converged
    }
}

/// Capability metadata for one device, queried off-worker.
#[derive(Debug, Clone)]
pub struct CameraCharacteristics {
    pub id: DeviceId,
    pub facing: LensFacing,
    pub flash_available: bool,
    pub active_array: SensorRect,
    pub preview_sizes: Vec<OutputSize>,
    pub record_sizes: Vec<OutputSize>,
}

impl CameraCharacteristics {
    /// Supported landscape-oriented output sizes for a surface kind.
    pub fn supported_sizes(&self, kind: SurfaceKind) -> &[OutputSize] {
        match kind {
            SurfaceKind::Preview => &self.preview_sizes,
            SurfaceKind::Record => &self.record_sizes,
        }
    }
}

/// Callbacks the HAL fires for device lifecycle, on an arbitrary thread.
#[derive(Clone)]
pub struct DeviceCallbacks {
    pub on_opened: Arc<dyn Fn(DeviceHandle) + Send + Sync>,
    pub on_disconnected: Arc<dyn Fn(DeviceHandle) + Send + Sync>,
    pub on_error: Arc<dyn Fn(DeviceHandle, i32) + Send + Sync>,
}

/// Callbacks the HAL fires for session configuration, on an arbitrary thread.
#[derive(Clone)]
pub struct SessionCallbacks {
    pub on_configured: Arc<dyn Fn(SessionHandle) + Send + Sync>,
    pub on_configure_failed: Arc<dyn Fn(SessionHandle) + Send + Sync>,
}

/// Callbacks the HAL fires per capture request, on an arbitrary thread.
#[derive(Clone)]
pub struct CaptureCallbacks {
    pub on_completed: Arc<dyn Fn(CaptureUpdate) + Send + Sync>,
    pub on_failed: Arc<dyn Fn(String) + Send + Sync>,
}

/// Listener armed on a still-image sink; fired once per delivered frame.
pub type ImageListener = Arc<dyn Fn(FrameHandle) + Send + Sync>;
