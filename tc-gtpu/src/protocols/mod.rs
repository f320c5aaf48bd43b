//! protocols - bounds-checked header parsing for Ethernet / IPv4 / UDP / GTP-U

mod cursor;
pub mod eth;
pub mod gtpu;
pub mod ipv4;
pub mod udp;

pub use cursor::{HdrCursor, header_mut};
pub use eth::{EthHdr, parse_ethhdr};
pub use gtpu::{GtpuHdr, GtpuHdrExt, PduSessionContainer, parse_gtpuhdr};
pub use ipv4::{Ipv4Hdr, parse_iphdr};
pub use udp::{UdpHdr, parse_udphdr};
