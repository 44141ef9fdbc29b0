//! Wire protocol for the CM1xx family of USB radio interface adapters.
//!
//! This crate provides the pieces shared by every transport: the 4-byte HID
//! control reports driving the GPIO lines and the configuration EEPROM, the
//! user and manufacturer EEPROM layouts, and the per-variant device profiles.
//!
//! It performs no I/O of its own, so everything here can be exercised from
//! plain unit tests.

use thiserror::Error;

pub mod device;
pub mod eeprom;
pub mod mfg;
pub mod report;

pub use device::{probe, probe_kind, Device, DeviceKind};
pub use report::Report;

/// USB vendor id shared by the whole adapter family
pub const VENDOR_ID: u16 = 0x0d8c;

/// CM108, matched together with [`PID_C108_MASK`]
pub const PID_C108: u16 = 0x000c;
pub const PID_C108_MASK: u16 = 0xfffc;
pub const PID_C108B: u16 = 0x0012;
pub const PID_C108AH: u16 = 0x013c;
pub const PID_C119: u16 = 0x0008;
pub const PID_C119A: u16 = 0x013a;
pub const PID_C119B: u16 = 0x0013;
/// N1KDO-programmed parts use the whole 0x6axx range
pub const PID_N1KDO_BASE: u16 = 0x6a00;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("report too short: expected {expected} bytes, got {actual}")]
    ShortReport { expected: usize, actual: usize },

    #[error("eeprom address {0} out of range")]
    AddressOutOfRange(u8),

    #[error("eeprom checksum residue {residue:#06x} is nonzero")]
    BadChecksum { residue: u16 },

    #[error("user block magic mismatch: got {got:#06x}, expected {expected:#06x}")]
    BadMagic { got: u16, expected: u16 },

    #[error("manufacturer block field at word {0} is out of bounds")]
    MfgOutOfBounds(usize),
}

/// Returns whether a USB id pair belongs to an adapter this crate knows how
/// to drive. Device discovery itself happens outside this crate.
pub fn is_supported_product(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID
        && ((pid & PID_C108_MASK) == PID_C108
            || pid == PID_C108B
            || pid == PID_C108AH
            || pid == PID_C119
            || pid == PID_C119A
            || pid == PID_C119B
            || (pid & 0xff00) == PID_N1KDO_BASE)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn supported_products() {
        assert!(is_supported_product(VENDOR_ID, PID_C108));
        // the CM108 id is matched with a mask covering four product codes
        assert!(is_supported_product(VENDOR_ID, 0x000f));
        assert!(is_supported_product(VENDOR_ID, PID_C119B));
        assert!(is_supported_product(VENDOR_ID, 0x6a42));
        assert!(!is_supported_product(VENDOR_ID, 0x0042));
        assert!(!is_supported_product(0x1234, PID_C108));
    }
}
