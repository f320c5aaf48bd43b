use super::{
    Counters, DownlinkPipeline, EgressStateTable, GtpuEgressPipeline, HookContext, HookCounters,
    IngressStateTable, IngressTarget, PcapMirror, TunnelIngressPipeline, TunnelParams,
    UplinkPipeline, resolve_egress, resolve_ingress,
};
use crate::skb::{SkBuff, TcAction};
use crate::{Config, TunnelStateFile};
use anyhow::{Context, Result};
use slog::{Logger, info, o};
use std::sync::Arc;

/// The four hooks together with the state they share.
#[derive(Clone)]
pub struct PacketProcessor {
    config: Arc<Config>,
    egress_state: EgressStateTable,
    ingress_state: IngressStateTable,
    counters: Counters,
    uplink_pipeline: UplinkPipeline,
    downlink_pipeline: DownlinkPipeline,
    tunnel_ingress_pipeline: TunnelIngressPipeline,
    gtpu_egress_pipeline: GtpuEgressPipeline,
}

impl PacketProcessor {
    pub fn new(config: Config, mirror: PcapMirror, logger: &Logger) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let counters = Counters::default();
        let egress_state = EgressStateTable::new();
        let ingress_state = IngressStateTable::new();

        let hook_context = |hook: &'static str, counters: &Arc<HookCounters>| HookContext {
            config: config.clone(),
            mirror: mirror.clone(),
            counters: counters.clone(),
            logger: logger.new(o!("hook" => hook)),
        };

        let uplink_pipeline = UplinkPipeline::new(
            hook_context("tunnel_egress", &counters.tunnel_egress),
            egress_state.clone(),
        );
        let downlink_pipeline = DownlinkPipeline::new(
            hook_context("gtpu_ingress", &counters.gtpu_ingress),
            ingress_state.clone(),
        );
        let tunnel_ingress_pipeline =
            TunnelIngressPipeline::new(hook_context("tunnel_ingress", &counters.tunnel_ingress));
        let gtpu_egress_pipeline =
            GtpuEgressPipeline::new(hook_context("gtpu_egress", &counters.gtpu_egress));

        info!(
            logger,
            "Tunnel {} -> {} via ifindex {}, verbose={}",
            config.saddr,
            config.daddr,
            config.gtpu_ifindex,
            config.is_verbose()
        );

        Ok(PacketProcessor {
            config,
            egress_state,
            ingress_state,
            counters,
            uplink_pipeline,
            downlink_pipeline,
            tunnel_ingress_pipeline,
            gtpu_egress_pipeline,
        })
    }

    /// Egress of a tunnel interface: encapsulate and redirect to the GTP-U
    /// interface.
    pub fn tunnel_egress(&self, skb: &mut impl SkBuff) -> TcAction {
        self.uplink_pipeline.handle_packet(skb)
    }

    /// Ingress of the GTP-U interface: decapsulate.
    pub fn gtpu_ingress(&self, skb: &mut impl SkBuff) -> TcAction {
        self.downlink_pipeline.handle_packet(skb)
    }

    /// Ingress of a tunnel interface.
    pub fn tunnel_ingress(&self, skb: &mut impl SkBuff) -> TcAction {
        self.tunnel_ingress_pipeline.handle_packet(skb)
    }

    /// Egress of the GTP-U interface: finalize the outer checksum.
    pub fn gtpu_egress(&self, skb: &mut impl SkBuff) -> TcAction {
        self.gtpu_egress_pipeline.handle_packet(skb)
    }

    pub fn resolve_egress(&self, ifindex: u32) -> TunnelParams {
        resolve_egress(&self.egress_state, ifindex)
    }

    pub fn resolve_ingress(&self, teid: u32) -> IngressTarget {
        resolve_ingress(&self.ingress_state, teid)
    }

    /// Control plane handle on the egress table.
    pub fn egress_state(&self) -> &EgressStateTable {
        &self.egress_state
    }

    /// Control plane handle on the ingress table.
    pub fn ingress_state(&self) -> &IngressStateTable {
        &self.ingress_state
    }

    pub fn load_state(&self, state: &TunnelStateFile) -> Result<()> {
        for (ifindex, egress) in state.egress.iter() {
            self.egress_state
                .insert(*ifindex, *egress)
                .with_context(|| format!("Egress state for ifindex {ifindex}"))?;
        }
        for (teid, ingress) in state.ingress.iter() {
            self.ingress_state
                .insert(*teid, *ingress)
                .with_context(|| format!("Ingress state for TEID {teid:#x}"))?;
        }
        Ok(())
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
