//! End-to-end lifecycle tests against the scriptable in-memory HAL.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use camvisor::{
    AutoFocus, CaptureUpdate, DeviceSelector, EventKind, FlashMode, FocusPoint,
    OrchestratorConfig, OutputSize, Phase, SensorRect, SessionOrchestrator, SurfaceHandle,
};

use support::{wait_for_kind, CountingSink, MockHal, MockRecorder};

fn orchestrator(hal: Arc<MockHal>) -> SessionOrchestrator {
    SessionOrchestrator::new(hal, OrchestratorConfig::default(), Vec::new())
}

/// Opens the back device with a bound 1080x1920 surface and waits for
/// preview.
async fn open_to_preview(
    cam: &SessionOrchestrator,
    rx: &mut tokio::sync::broadcast::Receiver<camvisor::Event>,
) {
    cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
    cam.open(DeviceSelector::Back).expect("open");
    wait_for_kind(rx, EventKind::PreviewStarted).await;
}

#[tokio::test]
async fn test_open_binds_surface_and_reaches_preview() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();

    cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
    cam.open(DeviceSelector::Back).expect("open");

    let opened = wait_for_kind(&mut rx, EventKind::DeviceOpened).await;
    assert_eq!(opened.device.as_deref(), Some("0"));

    // Supported sizes are landscape; the chosen 16:9 match is transposed for
    // the portrait view.
    let configured = wait_for_kind(&mut rx, EventKind::SessionConfigured).await;
    assert_eq!(configured.size, Some(OutputSize::new(1080, 1920)));

    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert_eq!(cam.phase(), Phase::PreviewActive);
    assert_eq!(hal.sessions_created(), 1);
}

#[tokio::test]
async fn test_open_before_bind_waits_for_surface() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();

    cam.open(DeviceSelector::Back).expect("open");
    wait_for_kind(&mut rx, EventKind::DeviceOpened).await;

    // The worker is parked on the surface slots; no session exists yet.
    tokio::task::yield_now().await;
    assert_eq!(hal.sessions_created(), 0);

    cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert_eq!(cam.phase(), Phase::PreviewActive);
}

#[tokio::test]
async fn test_still_capture_persists_frame_and_rebuilds_session() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    let sink = CountingSink::new();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    cam.capture_still(sink.clone(), move |ok, _sink| {
        let _ = done_tx.send(ok);
    })
    .expect("capture");

    let ok = tokio::time::timeout(Duration::from_secs(2), done_rx)
        .await
        .expect("result callback timed out")
        .expect("result callback dropped");
    assert!(ok);
    assert_eq!(sink.count(), 1);

    wait_for_kind(&mut rx, EventKind::StillCaptured).await;
    // A fresh session and sink replace the ones consumed by the capture.
    wait_for_kind(&mut rx, EventKind::SessionConfigured).await;
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert_eq!(cam.phase(), Phase::PreviewActive);
    assert_eq!(hal.sessions_created(), 2);
    assert_eq!(hal.sessions_closed(), 1);
    assert_eq!(hal.sinks_closed(), 1);
}

#[tokio::test]
async fn test_failed_capture_returns_to_preview_without_rebuild() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;
    hal.fail_capture.store(true, Ordering::SeqCst);

    let sink = CountingSink::new();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    cam.capture_still(sink.clone(), move |ok, _sink| {
        let _ = done_tx.send(ok);
    })
    .expect("capture");

    let ok = tokio::time::timeout(Duration::from_secs(2), done_rx)
        .await
        .expect("result callback timed out")
        .expect("result callback dropped");
    assert!(!ok);
    assert_eq!(sink.count(), 0);
    wait_for_kind(&mut rx, EventKind::StillCaptureFailed).await;

    // Preview is usable again without a session rebuild.
    cam.start_preview(None).expect("start_preview");
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert_eq!(hal.sessions_created(), 1);
}

#[tokio::test]
async fn test_close_unblocks_worker_parked_on_open() {
    let hal = MockHal::new();
    hal.ack_opens.store(false, Ordering::SeqCst);
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();

    cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
    cam.open(DeviceSelector::Back).expect("open");
    tokio::task::yield_now().await;
    assert_eq!(cam.phase(), Phase::Opening);

    // The device never acknowledges; close must still unwind promptly.
    cam.close();
    wait_for_kind(&mut rx, EventKind::Closed).await;
    assert_eq!(cam.phase(), Phase::Closed);
}

#[tokio::test]
async fn test_stale_open_callback_is_dropped_and_released() {
    let hal = MockHal::new();
    hal.ack_opens.store(false, Ordering::SeqCst);
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();

    cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
    cam.open(DeviceSelector::Back).expect("open");
    tokio::task::yield_now().await;
    cam.close();
    wait_for_kind(&mut rx, EventKind::Closed).await;

    cam.open(DeviceSelector::Back).expect("reopen");
    tokio::task::yield_now().await;

    // The first attempt's acknowledgement arrives late. Its handle must be
    // released back to the hardware, never resolve the new cycle's slot.
    hal.fire_opened(0, "stale");
    assert_eq!(hal.devices_closed(), 1);
    assert_eq!(cam.phase(), Phase::Opening);

    hal.fire_opened(1, "0");
    let opened = wait_for_kind(&mut rx, EventKind::DeviceOpened).await;
    assert_eq!(opened.device.as_deref(), Some("0"));
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert_eq!(cam.phase(), Phase::PreviewActive);
}

#[tokio::test]
async fn test_dropping_handle_stops_worker_and_listener() {
    let hal = MockHal::new();
    let cam = orchestrator(hal);
    let mut rx = cam.subscribe();
    drop(cam);

    // Both background tasks exit and the bus sender is released.
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Err(broadcast::error::RecvError::Closed) => break,
                _ => continue,
            }
        }
    })
    .await
    .expect("event bus should close once the background tasks exit");
}

#[tokio::test]
async fn test_tap_to_focus_meters_region_and_reports_convergence() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    let point = FocusPoint {
        x: 500,
        y: 1000,
        view_width: 1000,
        view_height: 2000,
    };
    cam.start_preview(Some(point)).expect("focus preview");
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;

    let request = hal.last_repeating().expect("repeating request installed");
    match request.auto_focus {
        AutoFocus::TriggerScan { region } => {
            assert_eq!(region.weight, 1000);
            assert_eq!(region.region, SensorRect::new(1980, 1480, 2020, 1520));
        }
        other => panic!("expected a focus scan, got {other:?}"),
    }

    // Convergence is reported only once AF and AE have both settled.
    hal.complete_repeating(CaptureUpdate {
        focus_locked: true,
        exposure_converged: false,
    });
    assert!(matches!(
        rx.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
    hal.complete_repeating(CaptureUpdate {
        focus_locked: true,
        exposure_converged: true,
    });
    wait_for_kind(&mut rx, EventKind::FocusConverged).await;
}

#[tokio::test]
async fn test_disconnect_tears_down_to_closed() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    hal.disconnect("0");
    wait_for_kind(&mut rx, EventKind::DeviceDisconnected).await;
    wait_for_kind(&mut rx, EventKind::Closed).await;
    assert_eq!(cam.phase(), Phase::Closed);
    assert_eq!(hal.devices_closed(), 1);
}

#[tokio::test]
async fn test_flash_reissues_preview_request() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    cam.set_flash(true).expect("flash supported on back device");
    let changed = wait_for_kind(&mut rx, EventKind::FlashChanged).await;
    assert_eq!(changed.reason.as_deref(), Some("on"));
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;

    let request = hal.last_repeating().expect("repeating request installed");
    assert_eq!(request.flash, FlashMode::Torch);
    assert!(cam.flash_enabled());
}

#[tokio::test]
async fn test_flash_unavailable_on_front_device() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    cam.switch_device().expect("switch");
    wait_for_kind(&mut rx, EventKind::DeviceSwitched).await;
    let opened = wait_for_kind(&mut rx, EventKind::DeviceOpened).await;
    assert_eq!(opened.device.as_deref(), Some("1"));
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert!(cam.is_front_device());

    let err = cam.set_flash(true).expect_err("front device has no flash");
    assert_eq!(err.as_label(), "capability_unavailable");
    assert!(!cam.flash_enabled());
}

#[tokio::test]
async fn test_recording_round_trip() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    let recorder = MockRecorder::new();
    cam.start_recording(recorder.clone()).expect("start");
    wait_for_kind(&mut rx, EventKind::RecordingStarted).await;
    assert_eq!(cam.phase(), Phase::Recording);
    assert!(recorder.started.load(Ordering::SeqCst));
    let request = hal.last_repeating().expect("record request installed");
    assert_eq!(request.template, camvisor::RequestTemplate::Record);

    cam.stop_recording(recorder.clone()).expect("stop");
    wait_for_kind(&mut rx, EventKind::RecordingStopped).await;
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert!(recorder.stopped.load(Ordering::SeqCst));
    assert!(recorder.was_reset.load(Ordering::SeqCst));
    assert_eq!(cam.phase(), Phase::PreviewActive);
}

#[tokio::test]
async fn test_rejected_record_session_falls_back_to_preview() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;
    hal.fail_next_session.store(true, Ordering::SeqCst);

    let recorder = MockRecorder::new();
    cam.start_recording(recorder.clone()).expect("start");
    wait_for_kind(&mut rx, EventKind::SessionConfigureFailed).await;

    // The worker rebuilds a plain preview session instead of recording.
    wait_for_kind(&mut rx, EventKind::SessionConfigured).await;
    wait_for_kind(&mut rx, EventKind::PreviewStarted).await;
    assert!(!recorder.started.load(Ordering::SeqCst));
    assert_eq!(cam.phase(), Phase::PreviewActive);
}

#[tokio::test]
async fn test_commands_rejected_outside_their_phase() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();

    // Still capture is only valid while preview is active.
    let sink = CountingSink::new();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    cam.capture_still(sink, move |ok, _sink| {
        let _ = done_tx.send(ok);
    })
    .expect("post");

    let rejected = wait_for_kind(&mut rx, EventKind::CommandRejected).await;
    assert_eq!(rejected.reason.as_deref(), Some("capture_still"));
    assert_eq!(rejected.phase, Some(Phase::Closed));
    let ok = tokio::time::timeout(Duration::from_secs(2), done_rx)
        .await
        .expect("result callback timed out")
        .expect("result callback dropped");
    assert!(!ok);
}

#[tokio::test]
async fn test_record_output_size_transposes_best_fit() {
    let hal = MockHal::new();
    let cam = orchestrator(hal);

    assert_eq!(cam.record_output_size(), None);
    cam.bind_preview_surface(SurfaceHandle(1), 1080, 1920);
    assert_eq!(cam.record_output_size(), Some(OutputSize::new(1080, 1920)));
}

#[tokio::test]
async fn test_shutdown_finishes_within_grace() {
    let hal = MockHal::new();
    let cam = orchestrator(hal.clone());
    let mut rx = cam.subscribe();
    open_to_preview(&cam, &mut rx).await;

    cam.shutdown().await.expect("graceful shutdown");
    assert_eq!(hal.devices_closed(), 1);
}
