mod counters;
mod downlink_pipeline;
pub mod encap_template;
mod housekeeping;
mod mirror;
mod packet_processor;
mod state_tables;
mod uplink_pipeline;

use std::ops::ControlFlow;

pub use counters::{Counters, HookCounters, StatsReporter, counter_indices};
pub use downlink_pipeline::{DownlinkPipeline, IngressTarget, resolve_ingress};
pub use housekeeping::{GtpuEgressPipeline, TunnelIngressPipeline};
pub use mirror::{
    MAX_CPUS, MirrorError, MirrorReceivers, MirrorRecord, PCAP_COOKIE, PcapMirror, SAMPLE_SIZE,
};
pub use packet_processor::PacketProcessor;
pub use state_tables::{EgressStateTable, IngressStateTable, MAX_STATE_ENTRIES, StateTable};
pub use uplink_pipeline::{MAX_INNER_LEN, TunnelParams, UplinkPipeline, resolve_egress};

use crate::Config;
use crate::skb::{SkBuff, TcAction};
use atomic_counter::AtomicCounter;
use counter_indices::*;
use slog::{Logger, debug};
use std::sync::Arc;

const GTPU_PORT: u16 = 2152; // TS29.281

/// Outcome of one stage of a hook.  `Break` carries the packet's final
/// disposition; `Continue` carries what the next stage needs.
type Stage<T> = ControlFlow<TcAction, T>;

fn disposition(stage: Stage<TcAction>) -> TcAction {
    match stage {
        ControlFlow::Break(action) | ControlFlow::Continue(action) => action,
    }
}

/// What every hook shares: static config, the capture channel, its own
/// counters and logger.
#[derive(Clone)]
struct HookContext {
    config: Arc<Config>,
    mirror: PcapMirror,
    counters: Arc<HookCounters>,
    logger: Logger,
}

impl HookContext {
    fn rx(&self, skb: &impl SkBuff) {
        self.counters[RX_PKTS].inc();
        self.counters[RX_BYTES].add(skb.len());
    }

    /// Copy the packet to the capture channel when running verbose.  Never
    /// affects the packet's disposition.
    fn capture(&self, skb: &impl SkBuff) {
        if !self.config.is_verbose() {
            return;
        }
        if let Err(e) = self.mirror.output(skb.cpu(), skb.data()) {
            self.counters[MIRROR_FAILED].inc();
            debug!(self.logger, "perf_event_output failed: {e}");
        }
    }

    fn pass(&self) -> TcAction {
        self.counters[PASS].inc();
        TcAction::Ok
    }

    fn discard(&self, counter_idx: usize) -> TcAction {
        self.counters[counter_idx].inc();
        TcAction::Shot
    }
}
