//! GTP-U v1 headers, TS29.281.
//!
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | Ver |P|R|E|S|N| Message Type  |        Message Length         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                 Tunnel Endpoint Identifier                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       Sequence Number         |  N-PDU Number | Next Ext Type |  (if E, S or PN)
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! The message length counts every byte after the first eight.

#![allow(clippy::unusual_byte_groupings)]

use super::HdrCursor;

pub const GTPU_LEN: usize = 8;
pub const GTPU_HDR_EXT_LEN: usize = 4;
pub const PDU_SESSION_CONTAINER_LEN: usize = 4;

pub const GTPU_VERSION: u8 = 1;
pub const GTPU_FLAG_E: u8 = 0b000_0_0_1_0_0;
pub const GTPU_FLAG_S: u8 = 0b000_0_0_0_1_0;

// TS29.281, table 6.1-1
pub const GTPU_ECHO_REQUEST: u8 = 1;
pub const GTPU_ECHO_RESPONSE: u8 = 2;
pub const GTPU_ERROR_INDICATION: u8 = 0x1a;
pub const GTPU_END_MARKER: u8 = 0xfe;
pub const GTPU_G_PDU: u8 = 0xff;

// TS29.281, figure 5.2.1-3
pub const GTPU_EXT_TYPE_NONE: u8 = 0;
pub const GTPU_EXT_TYPE_PDU_SESSION_CONTAINER: u8 = 0x85;

// TS38.415, 5.5.2
pub const PDU_SESSION_CONTAINER_PDU_TYPE_DL_PSU: u8 = 0;
pub const PDU_SESSION_CONTAINER_PDU_TYPE_UL_PSU: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtpuHdr {
    pub flags: u8,
    pub message_type: u8,
    pub message_length: [u8; 2],
    pub teid: [u8; 4],
}

impl GtpuHdr {
    pub const LEN: usize = GTPU_LEN;

    pub fn from_bytes(b: &[u8; GTPU_LEN]) -> Self {
        GtpuHdr {
            flags: b[0],
            message_type: b[1],
            message_length: [b[2], b[3]],
            teid: [b[4], b[5], b[6], b[7]],
        }
    }

    pub fn to_bytes(&self) -> [u8; GTPU_LEN] {
        [
            self.flags,
            self.message_type,
            self.message_length[0],
            self.message_length[1],
            self.teid[0],
            self.teid[1],
            self.teid[2],
            self.teid[3],
        ]
    }

    pub fn version(&self) -> u8 {
        self.flags >> 5
    }

    /// Protocol type: 1 for GTP, 0 for GTP'.
    pub fn protocol_type(&self) -> u8 {
        (self.flags >> 4) & 1
    }

    pub fn message_length(&self) -> u16 {
        u16::from_be_bytes(self.message_length)
    }

    pub fn set_message_length(&mut self, len: u16) {
        self.message_length = len.to_be_bytes();
    }

    /// TEID in host byte order.
    pub fn teid(&self) -> u32 {
        u32::from_be_bytes(self.teid)
    }

    pub fn set_teid(&mut self, teid: u32) {
        self.teid = teid.to_be_bytes();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtpuHdrExt {
    pub sqn: [u8; 2],
    pub npdu: u8,
    pub next_ext: u8,
}

impl GtpuHdrExt {
    pub const LEN: usize = GTPU_HDR_EXT_LEN;

    pub fn from_bytes(b: &[u8; GTPU_HDR_EXT_LEN]) -> Self {
        GtpuHdrExt {
            sqn: [b[0], b[1]],
            npdu: b[2],
            next_ext: b[3],
        }
    }

    pub fn to_bytes(&self) -> [u8; GTPU_HDR_EXT_LEN] {
        [self.sqn[0], self.sqn[1], self.npdu, self.next_ext]
    }
}

/// One-word PDU Session Container extension header (TS38.415).
///
/// | length | PDU type (4) spare (4) | spare (2) QFI (6) | next ext |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduSessionContainer {
    /// Extension length in units of four octets.
    pub length: u8,
    pub pdu_type: u8,
    pub qfi: u8,
    pub next_ext: u8,
}

impl PduSessionContainer {
    pub const LEN: usize = PDU_SESSION_CONTAINER_LEN;

    pub fn from_bytes(b: &[u8; PDU_SESSION_CONTAINER_LEN]) -> Self {
        PduSessionContainer {
            length: b[0],
            pdu_type: b[1] >> 4,
            qfi: b[2] & 0x3f,
            next_ext: b[3],
        }
    }

    pub fn to_bytes(&self) -> [u8; PDU_SESSION_CONTAINER_LEN] {
        [
            self.length,
            (self.pdu_type & 0x0f) << 4,
            self.qfi & 0x3f,
            self.next_ext,
        ]
    }
}

/// Parse the fixed GTP-U header.  Only version 1 GTP (not GTP') is
/// accepted.  Optional fields and extension headers are left unconsumed.
pub fn parse_gtpuhdr(nh: &mut HdrCursor) -> Option<GtpuHdr> {
    let gtpuh = GtpuHdr::from_bytes(nh.peek::<GTPU_LEN>()?);
    if gtpuh.version() != GTPU_VERSION || gtpuh.protocol_type() != 1 {
        return None;
    }
    nh.skip(GTPU_LEN)?;
    Some(gtpuh)
}
