//! Static device profiles
//!
//! Everything that differs between adapter variants lives here: GPIO bit
//! layout, direction masks, gain corrections, loopback test vectors and
//! manufacturer-block capability. The profile is selected once at discovery
//! time and passed around by reference, so no other module needs to compare
//! product ids.

use crate::{
    mfg::{MfgDialect, CM119B_MFG_TABLE, MFG_BLOCK_LEN},
    report::REPORT_LEN,
    ProtocolError,
};

mod probe;
pub use probe::{by_kind, probe, probe_kind, DeviceKind};

/// One step of the digital loopback test: drive `output`, expect `expect` on
/// the masked input bits
#[derive(Debug, Clone, Copy)]
pub struct GpioVector {
    pub output: u8,
    pub expect: u8,
}

/// Input bits compared during the digital test
pub const GPIO_TEST_MASK: u8 = 0xf2;

/// Benign output pattern driven when no test is running
pub const GPIO_IDLE: u8 = 0x08;

// GPIO1 -> GPIO2, GPIO3/PTT -> CTCSS, GPIO4 -> COR, bracketed by the idle
// pattern so the adapter is left quiet.
static VECTORS_TWO_PAIR: [GpioVector; 5] = [
    GpioVector {
        output: GPIO_IDLE,
        expect: 0x00,
    },
    GpioVector {
        output: 0x09,
        expect: 0x02,
    },
    GpioVector {
        output: 0x0c,
        expect: 0x10,
    },
    GpioVector {
        output: 0x00,
        expect: 0x20,
    },
    GpioVector {
        output: GPIO_IDLE,
        expect: 0x00,
    },
];

// Adds GPIO5 -> GPIO7 and GPIO6 -> GPIO8 for parts with three GPIO pairs.
static VECTORS_THREE_PAIR: [GpioVector; 7] = [
    GpioVector {
        output: GPIO_IDLE,
        expect: 0x00,
    },
    GpioVector {
        output: 0x09,
        expect: 0x02,
    },
    GpioVector {
        output: 0x0c,
        expect: 0x10,
    },
    GpioVector {
        output: 0x00,
        expect: 0x20,
    },
    GpioVector {
        output: 0x18,
        expect: 0x40,
    },
    GpioVector {
        output: 0x28,
        expect: 0x80,
    },
    GpioVector {
        output: GPIO_IDLE,
        expect: 0x00,
    },
];

/// Defines how the engine drives one adapter variant
#[derive(Debug)]
pub struct Device {
    /// The name identifying the part, e.g. "CM119"
    pub product_name: &'static str,
    /// Behavior class governing GPIO decode and gain correction
    pub kind: DeviceKind,
    /// Direction mask sent with every GPIO write, marking output-capable lines
    pub direction_mask: u8,
    /// Gain correction applied to generated samples
    pub playback_scale: f32,
    /// Matching correction applied to captured samples before analysis
    pub capture_scale: f32,
    /// Digital loopback test sequence for this variant
    pub gpio_vectors: &'static [GpioVector],
    /// Manufacturer-block field layout
    pub mfg_dialect: MfgDialect,
    /// Factory image, present only on variants whose manufacturer block may
    /// be (re)programmed by this engine
    pub mfg_table: Option<&'static [u16; MFG_BLOCK_LEN]>,
}

pub static C108: Device = Device {
    product_name: "CM108",
    kind: DeviceKind::C108,
    direction_mask: 0x0d,
    playback_scale: 0.9092,
    capture_scale: 1.0,
    gpio_vectors: &VECTORS_TWO_PAIR,
    mfg_dialect: MfgDialect::Basic,
    mfg_table: None,
};

pub static C108AH: Device = Device {
    product_name: "CM108AH",
    kind: DeviceKind::C108Ah,
    direction_mask: 0x0d,
    playback_scale: 1.0,
    capture_scale: 0.7499,
    gpio_vectors: &VECTORS_TWO_PAIR,
    mfg_dialect: MfgDialect::Basic,
    mfg_table: None,
};

pub static C119: Device = Device {
    product_name: "CM119",
    kind: DeviceKind::C119,
    direction_mask: 0x3d,
    playback_scale: 1.0,
    capture_scale: 0.7499,
    gpio_vectors: &VECTORS_THREE_PAIR,
    mfg_dialect: MfgDialect::Basic,
    mfg_table: None,
};

pub static C119A: Device = Device {
    product_name: "CM119A",
    kind: DeviceKind::C108,
    direction_mask: 0x0d,
    playback_scale: 0.9092,
    capture_scale: 1.0,
    gpio_vectors: &VECTORS_TWO_PAIR,
    mfg_dialect: MfgDialect::C119a,
    mfg_table: None,
};

pub static C119B: Device = Device {
    product_name: "CM119B",
    kind: DeviceKind::C108,
    direction_mask: 0x0d,
    playback_scale: 0.9092,
    capture_scale: 1.0,
    gpio_vectors: &VECTORS_TWO_PAIR,
    mfg_dialect: MfgDialect::C119b,
    mfg_table: Some(&CM119B_MFG_TABLE),
};

impl Device {
    /// Decodes a raw input report into the GPIO status byte
    pub fn decode_inputs(&self, raw: &[u8]) -> Result<u8, ProtocolError> {
        if raw.len() < REPORT_LEN {
            return Err(ProtocolError::ShortReport {
                expected: REPORT_LEN,
                actual: raw.len(),
            });
        }

        let mut status = (raw[1] & 0x0f) | ((raw[0] & 0x03) << 4);
        match self.kind {
            DeviceKind::C108 => {}
            DeviceKind::C119 => {
                status |= raw[1] & 0xc0;
            }
            DeviceKind::C108Ah => {
                // hook detect arrives inverted on an undocumented bit
                status &= !0x02;
                if raw[0] & 0x10 == 0 {
                    status |= 0x02;
                }
            }
        }
        Ok(status)
    }

    pub fn has_mfg_block(&self) -> bool {
        self.mfg_table.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_c108() {
        // low nibble from byte 1, bits 4..=5 from byte 0
        let status = C108.decode_inputs(&[0x03, 0x0a, 0x00, 0x00]).unwrap();
        assert_eq!(status, 0x3a);
        // high bits of byte 1 are ignored on two-pair parts
        let status = C108.decode_inputs(&[0x00, 0xfa, 0x00, 0x00]).unwrap();
        assert_eq!(status, 0x0a);
    }

    #[test]
    fn decode_c119_keeps_extra_pairs() {
        let status = C119.decode_inputs(&[0x00, 0xc1, 0x00, 0x00]).unwrap();
        assert_eq!(status, 0xc1);
    }

    #[test]
    fn decode_c108ah_hook_remap() {
        // bit 4 of byte 0 clear -> hook reported active on bit 1
        let status = C108AH.decode_inputs(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(status, 0x02);
        // bit 4 set -> hook idle, even if the documented bit was set
        let status = C108AH.decode_inputs(&[0x10, 0x02, 0x00, 0x00]).unwrap();
        assert_eq!(status, 0x00);
    }

    #[test]
    fn decode_short_report() {
        assert!(C108.decode_inputs(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn only_c119b_has_mfg_table() {
        assert!(C119B.has_mfg_block());
        for dev in [&C108, &C108AH, &C119, &C119A] {
            assert!(!dev.has_mfg_block());
        }
    }

    #[test]
    fn three_pair_parts_get_extra_vectors() {
        assert_eq!(C119.gpio_vectors.len(), C108.gpio_vectors.len() + 2);
        // every sequence ends on the idle pattern
        for dev in [&C108, &C108AH, &C119, &C119A, &C119B] {
            assert_eq!(dev.gpio_vectors.last().unwrap().output, GPIO_IDLE);
        }
    }
}
