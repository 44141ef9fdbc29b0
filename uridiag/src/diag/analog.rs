//! Analog loopback sequencer
//!
//! Plays tone pairs through the codec while the background loop measures
//! them, then compares each selective level against the expected
//! passband/stopband response of the adapter's audio path.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::UriDiag;

/// Expected level for tones inside the codec's passband
pub const PASSBAND_LEVEL: f32 = 550.0;

/// Expected level for tones past the anti-aliasing rolloff
pub const STOPBAND_LEVEL: f32 = 117.0;

/// Accepted relative deviation from an expected level
pub const LEVEL_TOLERANCE: f32 = 0.2;

/// Worst-case oscillator and measurement convergence time
pub const ANALOG_SETTLE: Duration = Duration::from_secs(1);

/// One test case: both tone targets and the level expected for each
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToneCase {
    pub freq1: f32,
    pub freq2: f32,
    pub expect1: f32,
    pub expect2: f32,
}

const fn case(freq1: f32, freq2: f32, expect1: f32, expect2: f32) -> ToneCase {
    ToneCase {
        freq1,
        freq2,
        expect1,
        expect2,
    }
}

/// The probe tone sweeps one channel while a fixed 700 Hz reference holds
/// the other, then the channels swap. The 5004 Hz cases sit in the stopband.
pub const TONE_CASES: [ToneCase; 12] = [
    case(204.0, 700.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(504.0, 700.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(1004.0, 700.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(2004.0, 700.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(3004.0, 700.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(5004.0, 700.0, STOPBAND_LEVEL, PASSBAND_LEVEL),
    case(700.0, 204.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(700.0, 504.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(700.0, 1004.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(700.0, 2004.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(700.0, 3004.0, PASSBAND_LEVEL, PASSBAND_LEVEL),
    case(700.0, 5004.0, PASSBAND_LEVEL, STOPBAND_LEVEL),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub freq: f32,
    pub expected: f32,
    pub measured: f32,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub channels: [ChannelOutcome; 2],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalogReport {
    pub cases: Vec<CaseOutcome>,
    pub errors: usize,
}

impl AnalogReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

/// Runs the standard case list with the hardware settle time
pub async fn analog_test(diag: &UriDiag) -> AnalogReport {
    analog_test_with(diag, &TONE_CASES, ANALOG_SETTLE).await
}

/// Runs a custom case list. On real hardware `settle` must exceed the
/// oscillator and measurement convergence time; harnesses with synthetic
/// level sources can shorten it.
pub async fn analog_test_with(
    diag: &UriDiag,
    cases: &[ToneCase],
    settle: Duration,
) -> AnalogReport {
    let levels = diag.levels();
    let mut report = AnalogReport::default();

    for case in cases {
        levels.set_targets(case.freq1, case.freq2);
        tokio::time::sleep(settle).await;
        let snapshot = levels.snapshot();

        let channels = [
            check_channel(case.freq1, case.expect1, snapshot.left),
            check_channel(case.freq2, case.expect2, snapshot.right),
        ];
        report.errors += channels.iter().filter(|c| !c.ok).count();
        report.cases.push(CaseOutcome { channels });
    }

    levels.set_targets(0.0, 0.0);
    report
}

fn check_channel(freq: f32, expected: f32, measured: f32) -> ChannelOutcome {
    let ok = within_tolerance(measured, expected);
    if !ok {
        log::warn!(
            "analog level at {:.1} Hz out of range: measured {:.1}, allowed {:.1} to {:.1}",
            freq,
            measured,
            expected * (1.0 - LEVEL_TOLERANCE),
            expected * (1.0 + LEVEL_TOLERANCE),
        );
    }
    ChannelOutcome {
        freq,
        expected,
        measured,
        ok,
    }
}

fn within_tolerance(measured: f32, expected: f32) -> bool {
    measured >= expected * (1.0 - LEVEL_TOLERANCE) && measured <= expected * (1.0 + LEVEL_TOLERANCE)
}
