//! Analog sequencer and full audio pipeline tests

use std::{sync::Arc, time::Duration};

use uridiag::{
    device,
    diag::{self, ToneCase, PASSBAND_LEVEL, STOPBAND_LEVEL, TONE_CASES},
    dsp::analyzer::BlockLevels,
    levels::SharedLevels,
    transport::mock::{LoopbackAudio, MockAdapter},
    UriDiag,
};

fn setup() -> UriDiag {
    UriDiag::new(Arc::new(MockAdapter::new(&device::C108)), &device::C108)
}

// A healthy adapter's frequency response: flat passband, attenuated past the
// anti-aliasing rolloff.
fn model(freq: f32) -> f32 {
    if freq <= 0.0 {
        0.0
    } else if freq > 4500.0 {
        STOPBAND_LEVEL
    } else {
        PASSBAND_LEVEL
    }
}

/// Publishes the modeled response for the current targets every few
/// milliseconds, standing in for the audio loop.
fn spawn_level_model(levels: Arc<SharedLevels>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let (f1, f2) = levels.targets();
            levels.publish(BlockLevels {
                overall: model(f1).max(model(f2)),
                left: model(f1),
                right: model(f2),
            });
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
}

#[tokio::test]
async fn full_case_list_passes_against_a_healthy_model() {
    let diag = setup();
    let model = spawn_level_model(diag.levels());

    let report = diag::analog_test_with(&diag, &TONE_CASES, Duration::from_millis(10)).await;
    model.abort();

    assert!(report.passed(), "{:?}", report);
    assert_eq!(report.cases.len(), 12);
    // the run leaves both channels silenced
    assert_eq!(diag.levels().targets(), (0.0, 0.0));
}

#[tokio::test]
async fn boundary_of_the_tolerance_band() {
    let diag = setup();
    let case = [ToneCase {
        freq1: 1004.0,
        freq2: 700.0,
        expect1: PASSBAND_LEVEL,
        expect2: PASSBAND_LEVEL,
    }];

    // exactly 20% high still passes
    let levels = diag.levels();
    let model = tokio::spawn(async move {
        loop {
            levels.publish(BlockLevels {
                overall: PASSBAND_LEVEL,
                left: PASSBAND_LEVEL * 1.2,
                right: PASSBAND_LEVEL,
            });
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    });
    let report = diag::analog_test_with(&diag, &case, Duration::from_millis(10)).await;
    model.abort();
    assert!(report.passed(), "{:?}", report);

    // 21% high does not
    let levels = diag.levels();
    let model = tokio::spawn(async move {
        loop {
            levels.publish(BlockLevels {
                overall: PASSBAND_LEVEL,
                left: PASSBAND_LEVEL * 1.21,
                right: PASSBAND_LEVEL,
            });
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    });
    let report = diag::analog_test_with(&diag, &case, Duration::from_millis(10)).await;
    model.abort();

    assert_eq!(report.errors, 1);
    assert!(!report.cases[0].channels[0].ok);
    assert!(report.cases[0].channels[1].ok);
}

#[tokio::test(flavor = "multi_thread")]
async fn tones_flow_through_the_loopback_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();
    let diag = setup();
    let handle = diag.start_audio(Box::new(LoopbackAudio::new()));

    diag.set_tones(1004.0, 2004.0);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let snap = diag.levels().snapshot();
    assert!(snap.left > 1.0, "left tone not measured: {:?}", snap);
    assert!(snap.right > 1.0, "right tone not measured: {:?}", snap);
    assert!(snap.overall >= snap.left.max(snap.right) * 0.9, "{:?}", snap);

    // silencing one channel shows up in its selective level
    diag.set_tones(1004.0, 0.0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let snap = diag.levels().snapshot();
    assert!(snap.left > 1.0, "{:?}", snap);
    assert_eq!(snap.right, 0.0);

    handle.shutdown().await.unwrap();
}
