//! Resolves a `Device` profile from a USB product id

use super::Device;
use crate::{PID_C108AH, PID_C119, PID_C119A, PID_C119B};

/// The three behavior classes of the adapter family. Several product ids map
/// onto the same class; the full per-variant story lives in [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "use_serde",
    derive(
        strum::EnumString,
        strum::Display,
        serde::Serialize,
        serde::Deserialize
    )
)]
#[cfg_attr(feature = "use_serde", strum(serialize_all = "lowercase"))]
pub enum DeviceKind {
    C108,
    C108Ah,
    C119,
}

impl Default for DeviceKind {
    fn default() -> Self {
        DeviceKind::C108
    }
}

/// Attempts to get a `&Device` from a product id. Unknown ids fall back to
/// the CM108 profile, matching how the parts actually behave.
pub fn probe(product_id: u16) -> &'static Device {
    match product_id {
        PID_C108AH => &super::C108AH,
        PID_C119 => &super::C119,
        PID_C119A => &super::C119A,
        PID_C119B => &super::C119B,
        _ => &super::C108,
    }
}

pub fn probe_kind(product_id: u16) -> DeviceKind {
    probe(product_id).kind
}

pub fn by_kind(kind: DeviceKind) -> &'static Device {
    match kind {
        DeviceKind::C108 => &super::C108,
        DeviceKind::C108Ah => &super::C108AH,
        DeviceKind::C119 => &super::C119,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{PID_C108, PID_C108B};

    #[test]
    fn probe_known_ids() {
        assert_eq!(probe(PID_C108AH).product_name, "CM108AH");
        assert_eq!(probe(PID_C119).product_name, "CM119");
        assert_eq!(probe(PID_C119A).product_name, "CM119A");
        assert_eq!(probe(PID_C119B).product_name, "CM119B");
        assert_eq!(probe(PID_C108).product_name, "CM108");
        assert_eq!(probe(PID_C108B).product_name, "CM108");
    }

    #[test]
    fn c119a_behaves_like_a_c108() {
        assert_eq!(probe_kind(PID_C119A), DeviceKind::C108);
        assert_eq!(probe_kind(PID_C119B), DeviceKind::C108);
        assert_eq!(probe_kind(PID_C119), DeviceKind::C119);
    }
}
