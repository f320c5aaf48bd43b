//! Ethernet header, which is present at the start of every frame.
//!
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                     destination_mac_addr                      |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  | destination_mac_addr (con't)  |        source_mac_addr        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                    source_mac_addr (con't)                    |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |           eth_type            |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::HdrCursor;

pub const ETH_LEN: usize = 14;
pub const ETH_ALEN: usize = 6;
pub const ETH_P_IP: u16 = 0x0800;
pub const ETH_P_IPV6: u16 = 0x86dd;

pub type MacAddr = [u8; ETH_ALEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthHdr {
    pub dst_addr: MacAddr,
    pub src_addr: MacAddr,
    pub ether_type: [u8; 2],
}

impl EthHdr {
    pub const LEN: usize = ETH_LEN;

    /// Offset of the destination MAC within the header.
    pub const DST_ADDR_OFFSET: usize = 0;

    pub fn from_bytes(b: &[u8; ETH_LEN]) -> Self {
        EthHdr {
            dst_addr: [b[0], b[1], b[2], b[3], b[4], b[5]],
            src_addr: [b[6], b[7], b[8], b[9], b[10], b[11]],
            ether_type: [b[12], b[13]],
        }
    }

    /// EtherType in host byte order.
    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.ether_type)
    }
}

/// Parse an Ethernet header, returning it if the full 14 bytes are present.
pub fn parse_ethhdr(nh: &mut HdrCursor) -> Option<EthHdr> {
    nh.take::<ETH_LEN>().map(EthHdr::from_bytes)
}
