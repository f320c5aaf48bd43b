use super::GTPU_PORT;
use crate::protocols::gtpu::*;
use crate::protocols::ipv4::{IPPROTO_UDP, IPV4_LEN, Ipv4Hdr};
use crate::protocols::udp::{UDP_LEN, UdpHdr};
use std::net::{Ipv4Addr, Ipv6Addr};

const GTPU_FLAGS: u8 = 0x34; // version=1, PT=1, R, E=1, S=0, PN=0
const DEFAULT_TTL: u8 = 64;

pub const IPV6_LEN: usize = 40;

/// Bytes of GTP-U extension following the fixed GTP-U header.  These are
/// counted by the GTP-U message length together with the inner packet.
pub const GTPU_EXT_TOTAL_LEN: usize = GTPU_HDR_EXT_LEN + PDU_SESSION_CONTAINER_LEN;

/// Size of the outer stack inserted after the Ethernet header on the IPv4
/// path, and so the exact amount of room added on encap and removed on
/// decap.
pub const ENCAP_V4_LEN: usize = IPV4_LEN + UDP_LEN + GTPU_LEN + GTPU_EXT_TOTAL_LEN;

pub const ENCAP_V6_LEN: usize = IPV6_LEN + UDP_LEN + GTPU_LEN + GTPU_EXT_TOTAL_LEN;

const UDP_TEMPLATE: UdpHdr = UdpHdr {
    source: GTPU_PORT.to_be_bytes(),
    dest: GTPU_PORT.to_be_bytes(),
    len: [0, 0],
    check: [0, 0],
};

const GTPU_TEMPLATE: GtpuHdr = GtpuHdr {
    flags: GTPU_FLAGS,
    message_type: GTPU_G_PDU,
    message_length: [0, 0],
    teid: [0, 0, 0, 0],
};

const GTPU_HDR_EXT_TEMPLATE: GtpuHdrExt = GtpuHdrExt {
    sqn: [0, 0],
    npdu: 0,
    next_ext: GTPU_EXT_TYPE_PDU_SESSION_CONTAINER,
};

const PDU_TEMPLATE: PduSessionContainer = PduSessionContainer {
    length: 1,
    pdu_type: PDU_SESSION_CONTAINER_PDU_TYPE_UL_PSU,
    qfi: 0,
    next_ext: GTPU_EXT_TYPE_NONE,
};

/// Outer IPv4 / UDP / GTP-U / extension stack.
///
/// `IPV4_GTPU_ENCAP` is never mutated.  Each packet takes its own copy
/// (the type is `Copy`), so concurrent invocations cannot see each other's
/// TEID or length fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4GtpuEncap {
    pub ipv4h: Ipv4Hdr,
    pub udp: UdpHdr,
    pub gtpu: GtpuHdr,
    pub gtpu_hdr_ext: GtpuHdrExt,
    pub pdu: PduSessionContainer,
}

pub const IPV4_GTPU_ENCAP: Ipv4GtpuEncap = Ipv4GtpuEncap {
    ipv4h: Ipv4Hdr {
        vihl: 0x45,
        tos: 0,
        tot_len: [0, 0],
        id: [0, 0],
        frag_off: [0, 0],
        ttl: DEFAULT_TTL,
        protocol: IPPROTO_UDP,
        check: [0, 0],
        saddr: [10, 0, 3, 4],
        daddr: [10, 0, 3, 5],
    },
    udp: UDP_TEMPLATE,
    gtpu: GTPU_TEMPLATE,
    gtpu_hdr_ext: GTPU_HDR_EXT_TEMPLATE,
    pdu: PDU_TEMPLATE,
};

impl Ipv4GtpuEncap {
    pub const LEN: usize = ENCAP_V4_LEN;

    /// Fill in the per-packet fields for an inner packet of `payload_len`
    /// bytes.  The IPv4 checksum is left at zero; it is finalized when the
    /// packet leaves the GTP-U interface.
    pub fn populate(
        &mut self,
        saddr: Ipv4Addr,
        daddr: Ipv4Addr,
        teid: u32,
        qfi: u8,
        payload_len: u16,
    ) {
        let tot_len = ENCAP_V4_LEN as u16 + payload_len;
        self.ipv4h.set_dst_addr(daddr);
        self.ipv4h.set_src_addr(saddr);
        self.ipv4h.set_tot_len(tot_len);
        self.udp.set_len(tot_len - IPV4_LEN as u16);
        self.gtpu.set_teid(teid);
        self.gtpu
            .set_message_length(payload_len + GTPU_EXT_TOTAL_LEN as u16);
        self.pdu.qfi = qfi;
    }

    pub fn to_bytes(&self) -> [u8; ENCAP_V4_LEN] {
        let mut b = [0u8; ENCAP_V4_LEN];
        let mut offset = 0;
        for part in [
            &self.ipv4h.to_bytes()[..],
            &self.udp.to_bytes()[..],
            &self.gtpu.to_bytes()[..],
            &self.gtpu_hdr_ext.to_bytes()[..],
            &self.pdu.to_bytes()[..],
        ] {
            b[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        b
    }
}

/// Outer IPv6 variant of the stack.  No hook applies it: the live path is
/// IPv4-outer only, and this exists so that loaders can validate an IPv6
/// source address against a template of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6GtpuEncap {
    pub saddr: Ipv6Addr,
    pub daddr: Ipv6Addr,
    pub hop_limit: u8,
    pub payload_len: [u8; 2],
    pub udp: UdpHdr,
    pub gtpu: GtpuHdr,
    pub gtpu_hdr_ext: GtpuHdrExt,
    pub pdu: PduSessionContainer,
}

pub const IPV6_GTPU_ENCAP: Ipv6GtpuEncap = Ipv6GtpuEncap {
    saddr: Ipv6Addr::UNSPECIFIED,
    daddr: Ipv6Addr::UNSPECIFIED,
    hop_limit: DEFAULT_TTL,
    payload_len: [0, 0],
    udp: UDP_TEMPLATE,
    gtpu: GTPU_TEMPLATE,
    gtpu_hdr_ext: GTPU_HDR_EXT_TEMPLATE,
    pdu: PDU_TEMPLATE,
};

impl Ipv6GtpuEncap {
    pub const LEN: usize = ENCAP_V6_LEN;

    pub fn to_bytes(&self) -> [u8; ENCAP_V6_LEN] {
        let mut b = [0u8; ENCAP_V6_LEN];
        b[0] = 0x60;
        b[4..6].copy_from_slice(&self.payload_len);
        b[6] = IPPROTO_UDP;
        b[7] = self.hop_limit;
        b[8..24].copy_from_slice(&self.saddr.octets());
        b[24..40].copy_from_slice(&self.daddr.octets());
        let mut offset = IPV6_LEN;
        for part in [
            &self.udp.to_bytes()[..],
            &self.gtpu.to_bytes()[..],
            &self.gtpu_hdr_ext.to_bytes()[..],
            &self.pdu.to_bytes()[..],
        ] {
            b[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        b
    }
}
