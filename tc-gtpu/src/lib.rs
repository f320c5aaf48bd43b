pub mod checksum;
mod data;
pub mod protocols;
pub mod skb;
mod userplane;

pub use data::*;
pub use skb::{MemSkb, SkBuff, TcAction};
pub use userplane::*;
