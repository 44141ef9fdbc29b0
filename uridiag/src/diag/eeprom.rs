//! EEPROM sequencer
//!
//! Exercises the write path with a sentinel in the spare user word and
//! checks exact equality on read-back; no tolerance applies here.

use serde::{Deserialize, Serialize};
use uridiag_protocol::eeprom::{OFF_SPARE, USER_START};

use crate::UriDiag;

/// Value written to the spare word during the self-test
pub const EEPROM_TEST_SENTINEL: u16 = 0x6942;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EepromReport {
    pub wrote: u16,
    /// Read-back value; `None` when a transfer failed
    pub read: Option<u16>,
    pub errors: usize,
}

impl EepromReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

pub async fn eeprom_test(diag: &UriDiag) -> EepromReport {
    let addr = USER_START + OFF_SPARE as u8;
    let mut report = EepromReport {
        wrote: EEPROM_TEST_SENTINEL,
        read: None,
        errors: 0,
    };

    if let Err(e) = diag.client.write_word(addr, EEPROM_TEST_SENTINEL).await {
        log::warn!("eeprom test write failed: {}", e);
        report.errors += 1;
        return report;
    }

    match diag.client.read_word(addr).await {
        Ok(value) => {
            report.read = Some(value);
            if value != EEPROM_TEST_SENTINEL {
                report.errors += 1;
            }
        }
        Err(e) => {
            log::warn!("eeprom test read failed: {}", e);
            report.errors += 1;
        }
    }

    report
}
