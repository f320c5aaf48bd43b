//! IPv4 header, as defined in RFC 791.
//!
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |ip_ver | h_len |  ip_dscp  |ecn|        ip_total_length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       ip_identification       |flags|   ip_fragment_offset    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    ip_ttl     |  ip_protocol  |          ip_checksum          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         source_ipaddr                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      destination_ipaddr                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          ip_options                           |
//! /                              ...                              /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! All multi-byte fields are held in network byte order.

use super::HdrCursor;
use std::net::Ipv4Addr;

pub const IPV4_LEN: usize = 20;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Hdr {
    pub vihl: u8,
    pub tos: u8,
    pub tot_len: [u8; 2],
    pub id: [u8; 2],
    pub frag_off: [u8; 2],
    pub ttl: u8,
    pub protocol: u8,
    pub check: [u8; 2],
    pub saddr: [u8; 4],
    pub daddr: [u8; 4],
}

impl Ipv4Hdr {
    pub const LEN: usize = IPV4_LEN;

    /// Offset of the header checksum within the header.
    pub const CHECK_OFFSET: usize = 10;

    pub fn from_bytes(b: &[u8; IPV4_LEN]) -> Self {
        Ipv4Hdr {
            vihl: b[0],
            tos: b[1],
            tot_len: [b[2], b[3]],
            id: [b[4], b[5]],
            frag_off: [b[6], b[7]],
            ttl: b[8],
            protocol: b[9],
            check: [b[10], b[11]],
            saddr: [b[12], b[13], b[14], b[15]],
            daddr: [b[16], b[17], b[18], b[19]],
        }
    }

    pub fn to_bytes(&self) -> [u8; IPV4_LEN] {
        let mut b = [0u8; IPV4_LEN];
        b[0] = self.vihl;
        b[1] = self.tos;
        b[2..4].copy_from_slice(&self.tot_len);
        b[4..6].copy_from_slice(&self.id);
        b[6..8].copy_from_slice(&self.frag_off);
        b[8] = self.ttl;
        b[9] = self.protocol;
        b[10..12].copy_from_slice(&self.check);
        b[12..16].copy_from_slice(&self.saddr);
        b[16..20].copy_from_slice(&self.daddr);
        b
    }

    pub fn version(&self) -> u8 {
        self.vihl >> 4
    }

    /// Header length in 32-bit words.
    pub fn ihl(&self) -> u8 {
        self.vihl & 0x0f
    }

    pub fn tot_len(&self) -> u16 {
        u16::from_be_bytes(self.tot_len)
    }

    pub fn set_tot_len(&mut self, len: u16) {
        self.tot_len = len.to_be_bytes();
    }

    pub fn check(&self) -> u16 {
        u16::from_be_bytes(self.check)
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.saddr)
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        self.saddr = addr.octets();
    }

    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.daddr)
    }

    pub fn set_dst_addr(&mut self, addr: Ipv4Addr) {
        self.daddr = addr.octets();
    }
}

/// Parse an IPv4 header including any options.  The fixed part must be
/// well formed (version 4, IHL >= 5) and the whole IHL * 4 bytes must be
/// present.  Returns the fixed part of the header.
pub fn parse_iphdr(nh: &mut HdrCursor) -> Option<Ipv4Hdr> {
    let iph = Ipv4Hdr::from_bytes(nh.peek::<IPV4_LEN>()?);
    let hdrsize = iph.ihl() as usize * 4;
    if iph.version() != 4 || hdrsize < IPV4_LEN {
        return None;
    }
    nh.skip(hdrsize)?;
    Some(iph)
}
