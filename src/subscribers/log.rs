//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [device-opened] device=0
//! [surface-bound] size=1080x1920
//! [session-configured] size=1080x1920
//! [preview-started]
//! [still-captured]
//! [command-rejected] op=capture_still phase=Closed
//! [closed]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured logging or metrics.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::DeviceOpened => {
                println!("[device-opened] device={:?}", e.device);
            }
            EventKind::DeviceDisconnected => {
                println!("[device-disconnected] device={:?}", e.device);
            }
            EventKind::DeviceError => {
                println!("[device-error] device={:?} code={:?}", e.device, e.code);
            }
            EventKind::DeviceSwitched => {
                println!("[device-switched]");
            }
            EventKind::SurfaceBound => {
                if let Some(size) = e.size {
                    println!("[surface-bound] size={}x{}", size.width, size.height);
                }
            }
            EventKind::SessionConfigured => {
                if let Some(size) = e.size {
                    println!("[session-configured] size={}x{}", size.width, size.height);
                }
            }
            EventKind::SessionConfigureFailed => {
                println!("[session-configure-failed] reason={:?}", e.reason);
            }
            EventKind::PreviewStarted => {
                println!("[preview-started]");
            }
            EventKind::FocusConverged => {
                println!("[focus-converged]");
            }
            EventKind::StillCaptureStarted => {
                println!("[still-capture-started]");
            }
            EventKind::StillCaptured => {
                println!("[still-captured]");
            }
            EventKind::StillCaptureFailed => {
                println!("[still-capture-failed] reason={:?}", e.reason);
            }
            EventKind::RecordingStarted => {
                println!("[recording-started]");
            }
            EventKind::RecordingStopped => {
                println!("[recording-stopped]");
            }
            EventKind::FlashChanged => {
                println!("[flash-changed] mode={:?}", e.reason);
            }
            EventKind::CommandRejected => {
                println!("[command-rejected] op={:?} phase={:?}", e.reason, e.phase);
            }
            EventKind::Closing => {
                println!("[closing]");
            }
            EventKind::Closed => {
                println!("[closed]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
