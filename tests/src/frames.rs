#![allow(clippy::unusual_byte_groupings)]
use pnet_packet::Packet;
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{self, Ipv4Packet, MutableIpv4Packet};
use pnet_packet::udp::{MutableUdpPacket, UdpPacket};
use std::net::Ipv4Addr;

pub const GTPU_PORT: u16 = 2152; // TS29.281
pub const ETH_LEN: usize = 14;
pub const IPV4_LEN: usize = 20;
pub const UDP_LEN: usize = 8;
pub const GTPU_EXT_LEN: usize = 8;
pub const ENCAP_LEN: usize = IPV4_LEN + UDP_LEN + 8 + GTPU_EXT_LEN;

pub const GTP_MESSAGE_TYPE_GPU: u8 = 0xff;
pub const GTP_MESSAGE_TYPE_ERROR_INDICATION: u8 = 0x1a;

pub const UE_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x01];
pub const GW_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 0x02];
pub const UE_IP: Ipv4Addr = Ipv4Addr::new(10, 255, 0, 1);
pub const DN_IP: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);

fn eth_header(dst: [u8; 6], src: [u8; 6]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(128);
    frame.extend_from_slice(&dst);
    frame.extend_from_slice(&src);
    frame.extend_from_slice(&[0x08, 0x00]);
    frame
}

/// Write an IPv4 + UDP header pair in front of `payload_len` bytes that are
/// already in `packet`, with a valid IPv4 checksum.
fn fill_ipv4_udp(
    packet: &mut [u8],
    src: Ipv4Addr,
    dst: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
) {
    let total_length = packet.len() as u16;
    {
        let mut udp = MutableUdpPacket::new(&mut packet[IPV4_LEN..]).unwrap();
        udp.set_source(src_port);
        udp.set_destination(dst_port);
        udp.set_length(total_length - IPV4_LEN as u16);
        udp.set_checksum(0);
    }
    let mut ipv4_packet = MutableIpv4Packet::new(packet).unwrap();
    ipv4_packet.set_version(4);
    ipv4_packet.set_header_length(5);
    ipv4_packet.set_total_length(total_length);
    ipv4_packet.set_identification(1);
    ipv4_packet.set_ttl(64);
    ipv4_packet.set_next_level_protocol(IpNextHeaderProtocols::Udp);
    ipv4_packet.set_source(src);
    ipv4_packet.set_destination(dst);
    let checksum = ipv4::checksum(&ipv4_packet.to_immutable());
    ipv4_packet.set_checksum(checksum);
}

/// A UE's IPv4/UDP packet as seen on its tunnel interface, carrying
/// `payload_len` bytes of UDP payload.
pub fn ue_frame(payload_len: usize) -> Vec<u8> {
    let mut frame = eth_header(GW_MAC, UE_MAC);
    let mut packet = vec![0u8; IPV4_LEN + UDP_LEN + payload_len];
    for (i, b) in packet[IPV4_LEN + UDP_LEN..].iter_mut().enumerate() {
        *b = i as u8;
    }
    fill_ipv4_udp(&mut packet, UE_IP, DN_IP, 23215, 53);
    frame.extend_from_slice(&packet);
    frame
}

/// GTP-U packet from the core carrying `inner_ip_packet`, with the same
/// extension headers that encapsulation produces.
pub fn gtpu_frame(teid: u32, message_type: u8, inner_ip_packet: &[u8]) -> Vec<u8> {
    let mut frame = eth_header(GW_MAC, [0x02, 0, 0, 0, 0, 0xcc]);
    let message_length = (GTPU_EXT_LEN + inner_ip_packet.len()) as u16;
    let mut packet = vec![0u8; IPV4_LEN + UDP_LEN];
    packet.extend_from_slice(&[
        // ---- GTP header ----
        0b001_1_0_1_0_0, // version, PT, R, E, S, PN
        message_type,
    ]);
    packet.extend_from_slice(&message_length.to_be_bytes());
    packet.extend_from_slice(&teid.to_be_bytes());
    packet.extend_from_slice(&[
        0x00, 0x00, // sequence number
        0x00, // N-PDU number
        0x85, // next extension = PDU session container
        // ---- PDU session container, DL ----
        0x01,       // length
        0b0000_0000, // PDU type
        0b00_000101, // QFI 5
        0x00,       // no next extension
    ]);
    packet.extend_from_slice(inner_ip_packet);
    fill_ipv4_udp(
        &mut packet,
        Ipv4Addr::new(10, 0, 3, 5),
        Ipv4Addr::new(10, 0, 3, 4),
        GTPU_PORT,
        GTPU_PORT,
    );
    frame.extend_from_slice(&packet);
    frame
}

/// Fields of an encapsulated frame that tests check.
#[derive(Debug, PartialEq, Eq)]
pub struct OuterHeaders {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub ipv4_total_length: u16,
    pub ipv4_checksum: u16,
    pub udp_source: u16,
    pub udp_destination: u16,
    pub udp_length: u16,
    pub gtp_flags: u8,
    pub gtp_message_type: u8,
    pub gtp_message_length: u16,
    pub teid: u32,
    pub next_ext: u8,
    pub qfi: u8,
}

pub fn outer_headers(frame: &[u8]) -> OuterHeaders {
    let ipv4_packet = Ipv4Packet::new(&frame[ETH_LEN..]).unwrap();
    let udp = UdpPacket::new(ipv4_packet.payload()).unwrap();
    let gtp = udp.payload();
    OuterHeaders {
        src: ipv4_packet.get_source(),
        dst: ipv4_packet.get_destination(),
        ipv4_total_length: ipv4_packet.get_total_length(),
        ipv4_checksum: ipv4_packet.get_checksum(),
        udp_source: udp.get_source(),
        udp_destination: udp.get_destination(),
        udp_length: udp.get_length(),
        gtp_flags: gtp[0],
        gtp_message_type: gtp[1],
        gtp_message_length: u16::from_be_bytes([gtp[2], gtp[3]]),
        teid: u32::from_be_bytes([gtp[4], gtp[5], gtp[6], gtp[7]]),
        next_ext: gtp[11],
        qfi: gtp[14] & 0x3f,
    }
}

/// The correct checksum of the outer IPv4 header, as pnet computes it.
pub fn expected_outer_checksum(frame: &[u8]) -> u16 {
    ipv4::checksum(&Ipv4Packet::new(&frame[ETH_LEN..ETH_LEN + IPV4_LEN]).unwrap())
}
