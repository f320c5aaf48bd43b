//! uplink_pipeline - encapsulates traffic leaving a tunnel interface

use super::counter_indices::*;
use super::encap_template::{ENCAP_V4_LEN, IPV4_GTPU_ENCAP};
use super::{EgressStateTable, HookContext, Stage, disposition};
use crate::data::DEFAULT_QFI;
use crate::protocols::eth::{ETH_LEN, ETH_P_IP};
use crate::protocols::{HdrCursor, parse_ethhdr, parse_iphdr};
use crate::skb::{AdjustRoomFlags, AdjustRoomMode, SkBuff, TcAction};
use atomic_counter::AtomicCounter;
use slog::{debug, warn};
use std::ops::ControlFlow::{Break, Continue};

/// Largest inner frame (after the Ethernet header) whose outer IPv4 total
/// length still fits in 16 bits.
pub const MAX_INNER_LEN: usize = u16::MAX as usize - ENCAP_V4_LEN;

/// TEID and QFI to encapsulate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelParams {
    pub teid: u32,
    pub qfi: u8,
}

/// Tunnel parameters for traffic leaving tunnel interface `ifindex`.  A
/// missing entry, or one with a zero TEID or QFI, gives TEID = `ifindex`
/// and the default QFI.
pub fn resolve_egress(egress_state: &EgressStateTable, ifindex: u32) -> TunnelParams {
    match egress_state.lookup(ifindex).and_then(|s| s.as_override()) {
        Some(o) => TunnelParams {
            teid: o.teid.get(),
            qfi: o.qfi.get(),
        },
        None => TunnelParams {
            teid: ifindex,
            qfi: DEFAULT_QFI,
        },
    }
}

#[derive(Clone)]
pub struct UplinkPipeline {
    ctx: HookContext,
    egress_state: EgressStateTable,
}

impl UplinkPipeline {
    pub(super) fn new(ctx: HookContext, egress_state: EgressStateTable) -> Self {
        UplinkPipeline { ctx, egress_state }
    }

    pub fn handle_packet(&self, skb: &mut impl SkBuff) -> TcAction {
        self.ctx.rx(skb);
        self.ctx.capture(skb);
        disposition(self.encapsulate(skb))
    }

    fn encapsulate(&self, skb: &mut impl SkBuff) -> Stage<TcAction> {
        let tot_len = self.parse_inner(skb)?;
        let payload_len = self.linearize(skb, tot_len)?;
        let params = resolve_egress(&self.egress_state, skb.ifindex());
        self.grow_room(skb)?;
        self.write_encap(skb, params, payload_len)?;
        Continue(skb.redirect_neigh(self.ctx.config.gtpu_ifindex))
    }

    /// Returns the inner IPv4 total length.
    fn parse_inner(&self, skb: &impl SkBuff) -> Stage<u16> {
        if skb.len() < ETH_LEN {
            return Break(self.ctx.discard(DROP_TOO_SHORT));
        }
        let mut nh = HdrCursor::new(skb.data());
        match parse_ethhdr(&mut nh) {
            Some(eth) if eth.ether_type() == ETH_P_IP => {}
            _ => return Break(self.ctx.pass()),
        }
        match parse_iphdr(&mut nh) {
            Some(iph) => Continue(iph.tot_len()),
            None => Break(self.ctx.pass()),
        }
    }

    /// Make sure the whole inner packet is resident.  Returns the inner
    /// length, measured after any pull since the buffer may have changed.
    fn linearize(&self, skb: &mut impl SkBuff, tot_len: u16) -> Stage<u16> {
        if tot_len as usize > skb.data().len() - ETH_LEN {
            if let Err(e) = skb.pull_data(tot_len as usize + ETH_LEN) {
                self.ctx.counters[UNSPEC_PULL_FAILED].inc();
                debug!(self.ctx.logger, "Failed to pull {tot_len} byte packet - {e}");
                return Break(TcAction::Unspec);
            }
        }
        let payload_len = skb.len() - ETH_LEN;
        if payload_len > MAX_INNER_LEN {
            return Break(self.ctx.discard(DROP_TOO_BIG));
        }
        Continue(payload_len as u16)
    }

    fn grow_room(&self, skb: &mut impl SkBuff) -> Stage<()> {
        let flags = AdjustRoomFlags::ENCAP_L3_IPV4 | AdjustRoomFlags::ENCAP_L4_UDP;
        if let Err(e) = skb.adjust_room(ENCAP_V4_LEN as i32, AdjustRoomMode::Mac, flags) {
            warn!(
                self.ctx.logger,
                "Error adding {ENCAP_V4_LEN} bytes of room - {e}"
            );
            return Break(self.ctx.discard(DROP_RESIZE_FAILED));
        }
        Continue(())
    }

    fn write_encap(&self, skb: &mut impl SkBuff, params: TunnelParams, payload_len: u16) -> Stage<()> {
        let mut encap = IPV4_GTPU_ENCAP;
        encap.populate(
            self.ctx.config.saddr,
            self.ctx.config.daddr,
            params.teid,
            params.qfi,
            payload_len,
        );
        skb.set_hash_invalid();

        if let Err(e) = skb.store_bytes(ETH_LEN, &encap.to_bytes()) {
            warn!(self.ctx.logger, "Error storing encapsulation header - {e}");
            return Break(self.ctx.discard(DROP_STORE_FAILED));
        }

        self.ctx.counters[ENCAP].inc();
        debug!(
            self.ctx.logger,
            "Encapsulated {payload_len} bytes from ifindex {} with teid={:#x} qfi={}",
            skb.ifindex(),
            params.teid,
            params.qfi
        );
        Continue(())
    }
}
