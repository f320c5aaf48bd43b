//! skb - the host packet buffer seam that the hooks run against

use crate::protocols::eth::ETH_LEN;
use std::ops::BitOr;

/// Forwarding outcome of a hook.  These four values are the whole contract
/// between a hook and the host network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcAction {
    /// Let the host's default policy decide.
    Unspec,
    /// Continue normal processing.
    Ok,
    /// Discard.
    Shot,
    /// Deliver via the egress path chosen by the redirect call.
    Redirect,
}

impl From<TcAction> for i32 {
    fn from(action: TcAction) -> Self {
        match action {
            TcAction::Unspec => -1,
            TcAction::Ok => 0,
            TcAction::Shot => 2,
            TcAction::Redirect => 7,
        }
    }
}

impl std::fmt::Display for TcAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TcAction::Unspec => "UNSPEC",
            TcAction::Ok => "OK",
            TcAction::Shot => "SHOT",
            TcAction::Redirect => "REDIRECT",
        };
        write!(f, "{s}")
    }
}

/// Where room is added or removed.  Only the MAC mode (immediately after
/// the Ethernet header) is used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustRoomMode {
    Mac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjustRoomFlags(u64);

impl AdjustRoomFlags {
    pub const NONE: Self = Self(0);
    pub const FIXED_GSO: Self = Self(1 << 0);
    pub const ENCAP_L3_IPV4: Self = Self(1 << 1);
    pub const ENCAP_L3_IPV6: Self = Self(1 << 2);
    pub const ENCAP_L4_GRE: Self = Self(1 << 3);
    pub const ENCAP_L4_UDP: Self = Self(1 << 4);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl BitOr for AdjustRoomFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkbError {
    /// The requested length exceeds the logical packet length.
    OutOfRange { requested: usize, len: usize },
    /// The packet would grow beyond what the device can carry.
    TooBig { requested: usize, max: usize },
    /// The packet is too short to remove the requested room.
    TooShort { requested: usize, len: usize },
    /// Room adjustment flags the host refuses for this operation.
    InvalidFlags(u64),
}

impl std::fmt::Display for SkbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkbError::OutOfRange { requested, len } => {
                write!(f, "offset {requested} beyond packet length {len}")
            }
            SkbError::TooBig { requested, max } => {
                write!(f, "length {requested} exceeds maximum {max}")
            }
            SkbError::TooShort { requested, len } => {
                write!(f, "cannot remove {requested} bytes from packet of length {len}")
            }
            SkbError::InvalidFlags(bits) => write!(f, "invalid room flags {bits:#x}"),
        }
    }
}

impl std::error::Error for SkbError {}

/// The host side of a packet in flight.
///
/// `data()` only exposes the linear (resident) part of the packet, which
/// may be shorter than `len()`.  Any of `pull_data`, `adjust_room` and
/// `store_bytes` may move the backing memory, so views obtained from
/// `data()` before such a call must not be reused after it - borrowing
/// rules enforce this for callers.
pub trait SkBuff {
    fn ifindex(&self) -> u32;
    fn cpu(&self) -> usize;
    fn len(&self) -> usize;
    fn data(&self) -> &[u8];
    fn data_mut(&mut self) -> &mut [u8];
    fn pull_data(&mut self, len: usize) -> Result<(), SkbError>;
    fn adjust_room(
        &mut self,
        len_diff: i32,
        mode: AdjustRoomMode,
        flags: AdjustRoomFlags,
    ) -> Result<(), SkbError>;
    fn store_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), SkbError>;
    fn set_hash_invalid(&mut self);
    /// Redirect to the egress of `ifindex`, resolving the next hop's L2
    /// address.  The returned action is handed back to the host as is.
    fn redirect_neigh(&mut self, ifindex: u32) -> TcAction;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Largest frame `MemSkb` accepts by default.
pub const DEFAULT_MAX_FRAME_LEN: usize = 9216;

/// In-memory packet buffer, used by the replay tool and in tests.
#[derive(Debug, Clone)]
pub struct MemSkb {
    buf: Vec<u8>,
    linear_len: usize,
    max_len: usize,
    ifindex: u32,
    cpu: usize,
    hash_valid: bool,
    redirect_target: Option<u32>,
}

impl MemSkb {
    pub fn new(frame: &[u8], ifindex: u32) -> Self {
        MemSkb {
            buf: frame.to_vec(),
            linear_len: frame.len(),
            max_len: DEFAULT_MAX_FRAME_LEN,
            ifindex,
            cpu: 0,
            hash_valid: true,
            redirect_target: None,
        }
    }

    /// Only the first `linear_len` bytes are resident until `pull_data`.
    pub fn with_linear_len(mut self, linear_len: usize) -> Self {
        self.linear_len = linear_len.min(self.buf.len());
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_cpu(mut self, cpu: usize) -> Self {
        self.cpu = cpu;
        self
    }

    /// The whole logical frame, including any non-linear tail.
    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_frame(self) -> Vec<u8> {
        self.buf
    }

    pub fn linear_len(&self) -> usize {
        self.linear_len
    }

    pub fn hash_valid(&self) -> bool {
        self.hash_valid
    }

    pub fn redirect_target(&self) -> Option<u32> {
        self.redirect_target
    }
}

impl SkBuff for MemSkb {
    fn ifindex(&self) -> u32 {
        self.ifindex
    }

    fn cpu(&self) -> usize {
        self.cpu
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn data(&self) -> &[u8] {
        &self.buf[..self.linear_len]
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.linear_len]
    }

    fn pull_data(&mut self, len: usize) -> Result<(), SkbError> {
        if len > self.buf.len() {
            return Err(SkbError::OutOfRange {
                requested: len,
                len: self.buf.len(),
            });
        }
        self.linear_len = self.linear_len.max(len);
        Ok(())
    }

    fn adjust_room(
        &mut self,
        len_diff: i32,
        _mode: AdjustRoomMode,
        flags: AdjustRoomFlags,
    ) -> Result<(), SkbError> {
        let room = len_diff.unsigned_abs() as usize;
        if len_diff >= 0 {
            let new_len = self.buf.len() + room;
            if new_len > self.max_len {
                return Err(SkbError::TooBig {
                    requested: new_len,
                    max: self.max_len,
                });
            }
            if self.buf.len() < ETH_LEN {
                return Err(SkbError::TooShort {
                    requested: 0,
                    len: self.buf.len(),
                });
            }
            self.buf
                .splice(ETH_LEN..ETH_LEN, std::iter::repeat_n(0u8, room));
            self.linear_len += room;
        } else {
            // Encapsulation flags only make sense when adding room.
            if flags != AdjustRoomFlags::NONE {
                return Err(SkbError::InvalidFlags(flags.bits()));
            }
            if self.buf.len() < ETH_LEN + room {
                return Err(SkbError::TooShort {
                    requested: room,
                    len: self.buf.len(),
                });
            }
            self.buf.drain(ETH_LEN..ETH_LEN + room);
            self.linear_len = self.linear_len.saturating_sub(room).max(ETH_LEN);
        }
        Ok(())
    }

    fn store_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), SkbError> {
        let end = offset + bytes.len();
        if end > self.linear_len {
            return Err(SkbError::OutOfRange {
                requested: end,
                len: self.linear_len,
            });
        }
        self.buf[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn set_hash_invalid(&mut self) {
        self.hash_valid = false;
    }

    fn redirect_neigh(&mut self, ifindex: u32) -> TcAction {
        if ifindex == 0 {
            return TcAction::Shot;
        }
        self.redirect_target = Some(ifindex);
        TcAction::Redirect
    }
}
