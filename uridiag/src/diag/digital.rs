//! Digital I/O sequencer (PTT, COR, TONE and the GPIO pairs)

use serde::{Deserialize, Serialize};
use uridiag_protocol::device::{GpioVector, GPIO_TEST_MASK};

use crate::UriDiag;

// Monitored input bits and the loopback pin pairs behind them
const MONITORED_BITS: [(u8, &str); 5] = [
    (0x02, "GPIO1/GPIO2"),
    (0x10, "GPIO3/PTT -> CTCSS"),
    (0x20, "GPIO4 -> COR"),
    (0x40, "GPIO5 -> GPIO7"),
    (0x80, "GPIO6 -> GPIO8"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitMismatch {
    pub pins: String,
    pub got: bool,
    pub expected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorOutcome {
    pub output: u8,
    pub expected: u8,
    /// Masked input read-back; `None` when a transfer failed
    pub observed: Option<u8>,
    pub mismatches: Vec<BitMismatch>,
    /// Transport error charged to this vector, if any
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigitalReport {
    pub outcomes: Vec<VectorOutcome>,
    pub errors: usize,
}

impl DigitalReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

/// Runs the variant's loopback vector list in fixed order. The final vector
/// leaves the outputs on the benign idle pattern.
pub async fn digital_test(diag: &UriDiag) -> DigitalReport {
    let mut report = DigitalReport::default();
    for vector in diag.device.gpio_vectors {
        let outcome = run_vector(diag, vector, &mut report.errors).await;
        report.outcomes.push(outcome);
    }
    report
}

async fn run_vector(diag: &UriDiag, vector: &GpioVector, errors: &mut usize) -> VectorOutcome {
    let mut outcome = VectorOutcome {
        output: vector.output,
        expected: vector.expect,
        observed: None,
        mismatches: Vec::new(),
        error: None,
    };

    let observed = match diag.set_outputs(vector.output).await {
        Ok(()) => diag.read_inputs().await,
        Err(e) => Err(e),
    };

    match observed {
        Ok(raw) => {
            let masked = raw & GPIO_TEST_MASK;
            outcome.observed = Some(masked);

            let diff = masked ^ vector.expect;
            for (mask, pins) in MONITORED_BITS {
                if diff & mask != 0 {
                    outcome.mismatches.push(BitMismatch {
                        pins: pins.to_string(),
                        got: masked & mask != 0,
                        expected: vector.expect & mask != 0,
                    });
                    *errors += 1;
                }
            }
        }
        Err(e) => {
            log::warn!("digital vector {:#04x} failed: {}", vector.output, e);
            outcome.error = Some(e.to_string());
            *errors += 1;
        }
    }

    outcome
}
