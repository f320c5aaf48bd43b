//! UDP header, which is present after the IP header.
//!
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |          Source Port          |       Destination Port        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |          PDU Length           |           Checksum            |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::HdrCursor;

pub const UDP_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHdr {
    pub source: [u8; 2],
    pub dest: [u8; 2],
    pub len: [u8; 2],
    pub check: [u8; 2],
}

impl UdpHdr {
    pub const LEN: usize = UDP_LEN;

    pub fn from_bytes(b: &[u8; UDP_LEN]) -> Self {
        UdpHdr {
            source: [b[0], b[1]],
            dest: [b[2], b[3]],
            len: [b[4], b[5]],
            check: [b[6], b[7]],
        }
    }

    pub fn to_bytes(&self) -> [u8; UDP_LEN] {
        [
            self.source[0],
            self.source[1],
            self.dest[0],
            self.dest[1],
            self.len[0],
            self.len[1],
            self.check[0],
            self.check[1],
        ]
    }

    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes(self.source)
    }

    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes(self.dest)
    }

    /// Length of header plus payload.
    pub fn len(&self) -> u16 {
        u16::from_be_bytes(self.len)
    }

    pub fn set_len(&mut self, len: u16) {
        self.len = len.to_be_bytes();
    }

    pub fn is_empty(&self) -> bool {
        self.len() as usize <= UDP_LEN
    }
}

/// Parse a UDP header.  A length field shorter than the header itself
/// marks the datagram as malformed.
pub fn parse_udphdr(nh: &mut HdrCursor) -> Option<UdpHdr> {
    let udph = UdpHdr::from_bytes(nh.peek::<UDP_LEN>()?);
    if (udph.len() as usize) < UDP_LEN {
        return None;
    }
    nh.skip(UDP_LEN)?;
    Some(udph)
}
