use crate::protocols::eth::MacAddr;
use serde::Deserialize;
use std::num::{NonZeroU8, NonZeroU32};

/// QFI used when no usable tunnel state exists.
pub const DEFAULT_QFI: u8 = 9;

/// Largest QFI that fits the 6-bit field of the PDU Session Container.
pub const MAX_QFI: u8 = 0x3f;

/// How to encapsulate traffic leaving one tunnel interface.  Keyed by the
/// tunnel interface index; written only by the control plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EgressState {
    pub teid: u32,
    pub qfi: u8,
}

/// Where to deliver decapsulated traffic for one TEID.  Keyed by TEID;
/// written only by the control plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct IngressState {
    pub qfi: u8,
    pub ifindex: u32,
    #[serde(with = "hex")]
    pub if_mac: MacAddr,
}

/// A fully populated egress entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgressOverride {
    pub teid: NonZeroU32,
    pub qfi: NonZeroU8,
}

/// A fully populated ingress entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngressOverride {
    pub qfi: NonZeroU8,
    pub ifindex: NonZeroU32,
    pub if_mac: MacAddr,
}

impl EgressState {
    /// Zero in either field means "unset", which is handled exactly like a
    /// missing entry.
    pub fn as_override(&self) -> Option<EgressOverride> {
        Some(EgressOverride {
            teid: NonZeroU32::new(self.teid)?,
            qfi: NonZeroU8::new(self.qfi)?,
        })
    }
}

impl IngressState {
    /// Zero QFI or interface index means "unset", which is handled exactly
    /// like a missing entry.  The MAC is not checked.
    pub fn as_override(&self) -> Option<IngressOverride> {
        Some(IngressOverride {
            qfi: NonZeroU8::new(self.qfi)?,
            ifindex: NonZeroU32::new(self.ifindex)?,
            if_mac: self.if_mac,
        })
    }
}

impl std::fmt::Display for EgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(teid={:#x},qfi={})", self.teid, self.qfi)
    }
}

impl std::fmt::Display for IngressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(qfi={},ifindex={},mac={})",
            self.qfi,
            self.ifindex,
            hex::encode(self.if_mac)
        )
    }
}
