//! housekeeping - the two hooks that neither encapsulate nor decapsulate

use super::counter_indices::*;
use super::{GTPU_PORT, HookContext, Stage, disposition};
use crate::checksum::ipv4_csum_inline;
use crate::protocols::eth::{ETH_LEN, ETH_P_IP};
use crate::protocols::ipv4::{IPPROTO_UDP, IPV4_LEN};
use crate::protocols::{HdrCursor, header_mut, parse_ethhdr, parse_iphdr, parse_udphdr};
use crate::skb::{SkBuff, TcAction};
use atomic_counter::AtomicCounter;
use std::ops::ControlFlow::{Break, Continue};

/// Traffic arriving on a tunnel interface after decapsulation.  Passes
/// everything whose logical length covers an Ethernet header, whether or
/// not that header is resident.
#[derive(Clone)]
pub struct TunnelIngressPipeline {
    ctx: HookContext,
}

impl TunnelIngressPipeline {
    pub(super) fn new(ctx: HookContext) -> Self {
        TunnelIngressPipeline { ctx }
    }

    pub fn handle_packet(&self, skb: &mut impl SkBuff) -> TcAction {
        self.ctx.rx(skb);
        if skb.len() < ETH_LEN {
            return self.ctx.discard(DROP_TOO_SHORT);
        }
        self.ctx.capture(skb);
        self.ctx.pass()
    }
}

/// Traffic leaving the GTP-U interface.  Finalizes the outer IPv4 checksum
/// of GTP-U packets, which is left at zero on encapsulation.
#[derive(Clone)]
pub struct GtpuEgressPipeline {
    ctx: HookContext,
}

impl GtpuEgressPipeline {
    pub(super) fn new(ctx: HookContext) -> Self {
        GtpuEgressPipeline { ctx }
    }

    pub fn handle_packet(&self, skb: &mut impl SkBuff) -> TcAction {
        self.ctx.rx(skb);
        disposition(self.finalize(skb))
    }

    fn finalize(&self, skb: &mut impl SkBuff) -> Stage<TcAction> {
        self.match_gtpu(skb)?;

        // Only a 20-byte header is covered by the in-place sum.
        let Some(iph) = header_mut::<IPV4_LEN>(skb.data_mut(), ETH_LEN) else {
            return Break(self.ctx.pass());
        };
        ipv4_csum_inline(iph);
        self.ctx.counters[CSUM_FIXED].inc();
        Continue(TcAction::Ok)
    }

    fn match_gtpu(&self, skb: &impl SkBuff) -> Stage<()> {
        let mut nh = HdrCursor::new(skb.data());
        match parse_ethhdr(&mut nh) {
            Some(eth) if eth.ether_type() == ETH_P_IP => {}
            _ => return Break(self.ctx.pass()),
        }
        self.ctx.capture(skb);

        match parse_iphdr(&mut nh) {
            Some(iph) if iph.protocol == IPPROTO_UDP && iph.ihl() == 5 => {}
            _ => return Break(self.ctx.pass()),
        }
        match parse_udphdr(&mut nh) {
            Some(udph) if udph.dst_port() == GTPU_PORT => Continue(()),
            _ => Break(self.ctx.pass()),
        }
    }
}
