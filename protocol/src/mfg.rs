//! Manufacturer EEPROM block
//!
//! Words 0..=50 hold the configuration the CMxxx chip loads at power-up:
//! USB identity, descriptor strings and codec volume presets. The layout
//! differs per variant, so every field is read through the explicit
//! word-offset constants below rather than by reinterpreting the buffer.

use crate::ProtocolError;

/// Number of words in the manufacturer block
pub const MFG_BLOCK_LEN: usize = 51;

/// A programmed block carries this magic in the high byte of word 0
const MFG_MAGIC_MASK: u16 = 0x6700;

// Word offsets shared by all dialects
const W_FLAGS: usize = 0;
const W_VID: usize = 1;
const W_PID: usize = 2;

// String/volume fields, CM119A and CM119B dialects only
const W_SERIAL_LEN: usize = 3;
const W_SERIAL: usize = 4;
const SERIAL_BYTES: usize = 12;
const W_PRODUCT_LEN: usize = 10;
const W_PRODUCT: usize = 11;
const W_MFG_LEN: usize = 26;
const W_MFG: usize = 27;
const STRING_BYTES: usize = 30;
const W_VOLUME: usize = 42;
const W_CONFIG: usize = 43;
const W_LIMITS: usize = 44;
const W_OPTION2: usize = 50;

/// How the string and volume fields of the block are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MfgDialect {
    /// CM108-family parts: flags and USB identity only
    Basic,
    /// CM119A: descriptor strings and 8-bit volume fields
    C119a,
    /// CM119B: packed volume bitfields, volume limits and the option-2 register
    C119b,
}

/// Factory image for the CM119B. The part ships with a blank EEPROM and
/// needs this table programmed before the codec behaves correctly.
pub static CM119B_MFG_TABLE: [u16; MFG_BLOCK_LEN] = [
    0x670d, 0x0d8c, 0x0013, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x5522,
    0x4253, 0x4120, 0x6475, 0x6f69, 0x4420, 0x7665, 0x6369, 0x0065, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x4332, 0x4d2d, 0x6465, 0x6169, 0x4520, 0x656c, 0x7463,
    0x6f72, 0x696e, 0x7363, 0x4920, 0x636e, 0x002e, 0x0000, 0x0000, 0x0000, 0x14c8, 0xf21a,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
];

/// A descriptor string with its declared length byte
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MfgString {
    pub declared_len: u8,
    pub text: String,
}

/// Codec volume limits, CM119B only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MfgLimits {
    pub dac: (u16, u16),
    pub adc: (u16, u16),
    pub aa: (u16, u16),
}

/// Volume presets and the packed configuration word
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MfgAudio {
    pub dac_volume: u8,
    pub adc_volume: u8,
    /// Raw configuration bits; common flags have typed accessors
    pub config: u16,
    pub limits: Option<MfgLimits>,
    pub option2: Option<u16>,
}

impl MfgAudio {
    pub fn mic_boost(&self) -> bool {
        self.config & 0x08 != 0
    }

    pub fn dac_to_headset(&self) -> bool {
        self.config & 0x04 != 0
    }

    pub fn hid_enabled(&self) -> bool {
        self.config & 0x02 != 0
    }

    pub fn wakeup_enabled(&self) -> bool {
        self.config & 0x01 != 0
    }

    pub fn power_control(&self) -> bool {
        self.config & 0x80 != 0
    }

    pub fn mic_high_pass(&self) -> bool {
        self.config & 0x20 != 0
    }
}

/// Decoded manufacturer data
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MfgInfo {
    pub flags: u16,
    pub vid: u16,
    pub pid: u16,
    pub serial: Option<MfgString>,
    pub product: Option<MfgString>,
    pub manufacturer: Option<MfgString>,
    pub audio: Option<MfgAudio>,
}

impl MfgInfo {
    pub fn serial_enabled(&self) -> bool {
        self.flags & 0x02 != 0
    }
}

/// Decodes a manufacturer block. Returns `None` when the magic shows the
/// block was never programmed. `words` must cover at least
/// [`MFG_BLOCK_LEN`] words; shorter input yields `MfgOutOfBounds`.
pub fn decode(dialect: MfgDialect, words: &[u16]) -> Result<Option<MfgInfo>, ProtocolError> {
    let flags = word(words, W_FLAGS)?;
    if flags & MFG_MAGIC_MASK != MFG_MAGIC_MASK {
        return Ok(None);
    }

    let mut info = MfgInfo {
        flags,
        vid: word(words, W_VID)?,
        pid: word(words, W_PID)?,
        serial: None,
        product: None,
        manufacturer: None,
        audio: None,
    };

    if dialect == MfgDialect::Basic {
        return Ok(Some(info));
    }

    info.serial = Some(MfgString {
        declared_len: word(words, W_SERIAL_LEN)? as u8,
        text: string_at(words, W_SERIAL, SERIAL_BYTES, None)?,
    });

    let product_len = word(words, W_PRODUCT_LEN)?;
    let mfg_len = word(words, W_MFG_LEN)?;
    let volume = word(words, W_VOLUME)?;
    let config = word(words, W_CONFIG)?;

    match dialect {
        MfgDialect::Basic => unreachable!(),
        MfgDialect::C119a => {
            info.product = Some(MfgString {
                declared_len: product_len as u8,
                text: string_at(words, W_PRODUCT, STRING_BYTES, None)?,
            });
            info.manufacturer = Some(MfgString {
                declared_len: mfg_len as u8,
                text: string_at(words, W_MFG, STRING_BYTES, None)?,
            });
            info.audio = Some(MfgAudio {
                dac_volume: (volume >> 8) as u8,
                adc_volume: (volume & 0xff) as u8,
                config,
                limits: None,
                option2: None,
            });
        }
        MfgDialect::C119b => {
            // The B part steals the high byte of each length word for the
            // string's first character.
            info.product = Some(MfgString {
                declared_len: (product_len & 0xff) as u8,
                text: string_at(words, W_PRODUCT, STRING_BYTES, Some((product_len >> 8) as u8))?,
            });
            info.manufacturer = Some(MfgString {
                declared_len: (mfg_len & 0xff) as u8,
                text: string_at(words, W_MFG, STRING_BYTES, Some((mfg_len >> 8) as u8))?,
            });
            info.audio = Some(MfgAudio {
                dac_volume: ((volume & 0xfe00) >> 9) as u8,
                adc_volume: ((volume & 0x01f8) >> 3) as u8,
                config,
                limits: Some(MfgLimits {
                    dac: (word(words, W_LIMITS)?, word(words, W_LIMITS + 1)?),
                    adc: (word(words, W_LIMITS + 2)?, word(words, W_LIMITS + 3)?),
                    aa: (word(words, W_LIMITS + 4)?, word(words, W_LIMITS + 5)?),
                }),
                option2: Some(word(words, W_OPTION2)?),
            });
        }
    }

    Ok(Some(info))
}

fn word(words: &[u16], index: usize) -> Result<u16, ProtocolError> {
    words
        .get(index)
        .copied()
        .ok_or(ProtocolError::MfgOutOfBounds(index))
}

/// Extracts a descriptor string stored as little-endian bytes in a word
/// range, stopping at the first NUL. `lead` prepends a character the variant
/// packed elsewhere.
fn string_at(
    words: &[u16],
    off: usize,
    max_bytes: usize,
    lead: Option<u8>,
) -> Result<String, ProtocolError> {
    let end = off + (max_bytes + 1) / 2;
    let range = words
        .get(off..end)
        .ok_or(ProtocolError::MfgOutOfBounds(end - 1))?;

    let mut bytes = Vec::with_capacity(max_bytes + 1);
    bytes.extend(lead);
    for w in range {
        bytes.push(*w as u8);
        bytes.push((*w >> 8) as u8);
    }
    bytes.truncate(max_bytes + lead.is_some() as usize);
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_factory_c119b_table() {
        let info = decode(MfgDialect::C119b, &CM119B_MFG_TABLE)
            .unwrap()
            .expect("table carries the magic");

        assert_eq!(info.vid, 0x0d8c);
        assert_eq!(info.pid, 0x0013);
        assert_eq!(info.product.as_ref().unwrap().text, "USB Audio Device");
        assert_eq!(
            info.manufacturer.as_ref().unwrap().text,
            "C-Media Electronics Inc."
        );
        assert_eq!(info.serial.as_ref().unwrap().text, "");

        let audio = info.audio.unwrap();
        assert_eq!(audio.dac_volume, 10);
        assert_eq!(audio.adc_volume, 57);
        assert!(audio.hid_enabled());
        assert!(audio.mic_boost());
        assert!(!audio.dac_to_headset());
        assert_eq!(audio.option2, Some(0));
    }

    #[test]
    fn unprogrammed_block_is_none() {
        let words = [0u16; MFG_BLOCK_LEN];
        assert_eq!(decode(MfgDialect::C119b, &words).unwrap(), None);
    }

    #[test]
    fn basic_dialect_skips_strings() {
        let mut words = [0u16; MFG_BLOCK_LEN];
        words[0] = 0x6703;
        words[1] = 0x0d8c;
        words[2] = 0x000c;
        let info = decode(MfgDialect::Basic, &words).unwrap().unwrap();
        assert!(info.serial_enabled());
        assert_eq!(info.product, None);
        assert_eq!(info.audio, None);
    }

    #[test]
    fn truncated_block_is_out_of_bounds() {
        let words = [0x6700u16; 20];
        assert!(matches!(
            decode(MfgDialect::C119b, &words),
            Err(ProtocolError::MfgOutOfBounds(_))
        ));
    }
}
