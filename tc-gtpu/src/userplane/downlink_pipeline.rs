//! downlink_pipeline - decapsulates GTP-U arriving from the core

use super::counter_indices::*;
use super::encap_template::ENCAP_V4_LEN;
use super::{GTPU_PORT, HookContext, IngressStateTable, Stage, disposition};
use crate::data::DEFAULT_QFI;
use crate::protocols::eth::{ETH_ALEN, ETH_P_IP, EthHdr, MacAddr};
use crate::protocols::gtpu::GTPU_ERROR_INDICATION;
use crate::protocols::ipv4::IPPROTO_UDP;
use crate::protocols::{
    HdrCursor, header_mut, parse_ethhdr, parse_gtpuhdr, parse_iphdr, parse_udphdr,
};
use crate::skb::{AdjustRoomFlags, AdjustRoomMode, SkBuff, TcAction};
use atomic_counter::AtomicCounter;
use slog::{debug, warn};
use std::ops::ControlFlow::{Break, Continue};

/// Where a decapsulated packet is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngressTarget {
    pub qfi: u8,
    pub ifindex: u32,
    /// Destination MAC to write into the exposed Ethernet header.  Only
    /// set when a usable ingress state entry exists.
    pub if_mac: Option<MacAddr>,
}

/// Target for a packet received with `teid`.
///
/// A missing entry, or one with a zero QFI or interface index, gives the
/// default QFI and takes the TEID itself as the interface index.  That
/// relies on the control plane numbering tunnel interfaces after the TEIDs
/// it allocates, which nothing here can check.
pub fn resolve_ingress(ingress_state: &IngressStateTable, teid: u32) -> IngressTarget {
    match ingress_state.lookup(teid).and_then(|s| s.as_override()) {
        Some(o) => IngressTarget {
            qfi: o.qfi.get(),
            ifindex: o.ifindex.get(),
            if_mac: Some(o.if_mac),
        },
        None => IngressTarget {
            qfi: DEFAULT_QFI,
            ifindex: teid,
            if_mac: None,
        },
    }
}

#[derive(Clone)]
pub struct DownlinkPipeline {
    ctx: HookContext,
    ingress_state: IngressStateTable,
}

impl DownlinkPipeline {
    pub(super) fn new(ctx: HookContext, ingress_state: IngressStateTable) -> Self {
        DownlinkPipeline { ctx, ingress_state }
    }

    pub fn handle_packet(&self, skb: &mut impl SkBuff) -> TcAction {
        self.ctx.rx(skb);
        disposition(self.decapsulate(skb))
    }

    fn decapsulate(&self, skb: &mut impl SkBuff) -> Stage<TcAction> {
        let teid = self.parse_outer(skb)?;
        let target = resolve_ingress(&self.ingress_state, teid);
        self.shrink_room(skb)?;
        self.rewrite_eth(skb, target)?;
        self.ctx.counters[DECAP].inc();
        debug!(
            self.ctx.logger,
            "Decapsulated teid={teid:#x} for ifindex {} qfi={}", target.ifindex, target.qfi
        );
        Continue(TcAction::Ok)
    }

    /// Walk Ethernet / IPv4 / UDP / GTP-U.  Returns the TEID in host order.
    fn parse_outer(&self, skb: &impl SkBuff) -> Stage<u32> {
        let mut nh = HdrCursor::new(skb.data());
        match parse_ethhdr(&mut nh) {
            Some(eth) if eth.ether_type() == ETH_P_IP => {}
            _ => return Break(self.ctx.pass()),
        }
        self.ctx.capture(skb);

        match parse_iphdr(&mut nh) {
            Some(iph) if iph.protocol == IPPROTO_UDP => {}
            _ => return Break(self.ctx.pass()),
        }
        match parse_udphdr(&mut nh) {
            Some(udph) if udph.dst_port() == GTPU_PORT => {}
            _ => return Break(self.ctx.pass()),
        }
        let Some(gtpuh) = parse_gtpuhdr(&mut nh) else {
            return Break(self.ctx.pass());
        };

        if gtpuh.message_type == GTPU_ERROR_INDICATION {
            return Break(self.ctx.discard(DROP_ERROR_INDICATION));
        }
        Continue(gtpuh.teid())
    }

    fn shrink_room(&self, skb: &mut impl SkBuff) -> Stage<()> {
        if let Err(e) = skb.adjust_room(
            -(ENCAP_V4_LEN as i32),
            AdjustRoomMode::Mac,
            AdjustRoomFlags::NONE,
        ) {
            warn!(
                self.ctx.logger,
                "Error removing {ENCAP_V4_LEN} bytes of room - {e}"
            );
            return Break(self.ctx.discard(DROP_RESIZE_FAILED));
        }
        Continue(())
    }

    /// Re-validate the exposed Ethernet header and point it at the target.
    fn rewrite_eth(&self, skb: &mut impl SkBuff, target: IngressTarget) -> Stage<()> {
        match parse_ethhdr(&mut HdrCursor::new(skb.data())) {
            Some(eth) if eth.ether_type() == ETH_P_IP => {}
            _ => return Break(self.ctx.pass()),
        }
        if let Some(if_mac) = target.if_mac {
            if let Some(dst) = header_mut::<ETH_ALEN>(skb.data_mut(), EthHdr::DST_ADDR_OFFSET) {
                *dst = if_mac;
            }
        }
        Continue(())
    }
}
