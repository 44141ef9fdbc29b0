//! 4-byte control-transfer reports
//!
//! Every exchange with the adapter's HID interface is a fixed 4-byte output
//! report, optionally followed by a 4-byte input report. Byte 0 selects
//! between a plain GPIO write (0) and an EEPROM strobe (0x80); byte 3 carries
//! the EEPROM address together with the read or write strobe bits.

use bytes::{BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// Length of a control transfer in either direction
pub const REPORT_LEN: usize = 4;

/// The EEPROM spans 64 addressable words
pub const EEPROM_ADDR_MASK: u8 = 0x3f;

const EEPROM_SELECT: u8 = 0x80;
const EEPROM_READ_STROBE: u8 = 0x80;
const EEPROM_WRITE_STROBE: u8 = 0xc0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Report {
    /// Drive the output-capable GPIO lines; `direction` marks which lines
    /// those are for the current variant
    GpioWrite { pattern: u8, direction: u8 },

    /// Latch an EEPROM word; its value arrives in the next input report
    EepromRead { addr: u8 },

    /// Store one EEPROM word
    EepromWrite { addr: u8, value: u16 },
}

impl Report {
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REPORT_LEN);
        match *self {
            Report::GpioWrite { pattern, direction } => {
                buf.put_u8(0);
                buf.put_u8(pattern);
                buf.put_u8(direction);
                buf.put_u8(0);
            }
            Report::EepromRead { addr } => {
                buf.put_u8(EEPROM_SELECT);
                buf.put_u8(0);
                buf.put_u8(0);
                buf.put_u8(EEPROM_READ_STROBE | (addr & EEPROM_ADDR_MASK));
            }
            Report::EepromWrite { addr, value } => {
                buf.put_u8(EEPROM_SELECT);
                buf.put_u8((value & 0xff) as u8);
                buf.put_u8((value >> 8) as u8);
                buf.put_u8(EEPROM_WRITE_STROBE | (addr & EEPROM_ADDR_MASK));
            }
        }
        buf.freeze()
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Report, ProtocolError> {
        let raw = check_len(raw)?;
        Ok(if raw[0] & EEPROM_SELECT != 0 {
            let addr = raw[3] & EEPROM_ADDR_MASK;
            if raw[3] & 0x40 != 0 {
                Report::EepromWrite {
                    addr,
                    value: raw[1] as u16 | (raw[2] as u16) << 8,
                }
            } else {
                Report::EepromRead { addr }
            }
        } else {
            Report::GpioWrite {
                pattern: raw[1],
                direction: raw[2],
            }
        })
    }
}

/// Decodes the EEPROM word carried by an input report following a read strobe
pub fn eeprom_word(raw: &[u8]) -> Result<u16, ProtocolError> {
    let raw = check_len(raw)?;
    Ok(raw[1] as u16 | (raw[2] as u16) << 8)
}

fn check_len(raw: &[u8]) -> Result<&[u8], ProtocolError> {
    if raw.len() < REPORT_LEN {
        Err(ProtocolError::ShortReport {
            expected: REPORT_LEN,
            actual: raw.len(),
        })
    } else {
        Ok(raw)
    }
}
