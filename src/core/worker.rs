//! # Serial worker: one command at a time.
//!
//! All hardware-mutating operations are posted here as [`Command`]s and
//! executed strictly in order by a single task, so no two phase routines
//! (e.g. a still capture and a close) ever run concurrently. Hardware
//! callbacks resolve slots from their own threads; the worker is the only
//! code that awaits them.
//!
//! ## Rules
//! - Commands run **sequentially**; a command finishes (or unwinds through
//!   the close path) before the next is taken.
//! - The loop exits when the runtime token is cancelled or the public handle
//!   is dropped (channel closed).
//! - Slot awaits inside a command are unblocked by `close()`, which cancels
//!   outstanding slots before its `Close` command is queued.

use std::sync::Arc;

use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::hal::{DeviceSelector, FocusPoint, FrameSink, Recorder};

use super::driver::Driver;

/// Result callback for a still capture: `(success, sink)`.
pub type CaptureResultFn = Box<dyn FnOnce(bool, Arc<dyn FrameSink>) + Send + 'static>;

/// Operations executed by the serial worker.
pub(crate) enum Command {
    Open {
        selector: DeviceSelector,
    },
    StartPreview {
        focus: Option<FocusPoint>,
    },
    CaptureStill {
        output: Arc<dyn FrameSink>,
        on_result: CaptureResultFn,
    },
    StartRecording {
        recorder: Arc<dyn Recorder>,
    },
    StopRecording {
        recorder: Arc<dyn Recorder>,
    },
    SwitchDevice,
    Close,
}

/// Runs the worker until cancellation or channel close.
pub(crate) async fn run(
    driver: Driver,
    mut rx: mpsc::UnboundedReceiver<Command>,
    token: CancellationToken,
) {
    loop {
        // Biased toward the queue so commands posted before a cancellation
        // (notably Close during shutdown) are still executed.
        let cmd = select! {
            biased;
            cmd = rx.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
            _ = token.cancelled() => break,
        };
        driver.dispatch(cmd).await;
    }
}
