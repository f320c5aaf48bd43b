use atomic_counter::{AtomicCounter, RelaxedCounter};
use derive_deref::Deref;
use slog::{Logger, info, warn};
use std::sync::Arc;

pub mod counter_indices {
    pub const RX_PKTS: usize = 0;
    pub const RX_BYTES: usize = 1;
    pub const PASS: usize = 2;
    pub const ENCAP: usize = 3;
    pub const DECAP: usize = 4;
    pub const CSUM_FIXED: usize = 5;
    pub const DROP_TOO_SHORT: usize = 6;
    pub const DROP_TOO_BIG: usize = 7;
    pub const DROP_ERROR_INDICATION: usize = 8;
    pub const DROP_RESIZE_FAILED: usize = 9;
    pub const DROP_STORE_FAILED: usize = 10;
    pub const UNSPEC_PULL_FAILED: usize = 11;
    pub const MIRROR_FAILED: usize = 12;
    pub const NUM_COUNTERS: usize = 13;

    // Counters from here on are reported as warnings.
    pub const FIRST_WARN_IDX: usize = DROP_TOO_SHORT;
}
use counter_indices::*;

#[derive(Deref)]
pub struct HookCounters([RelaxedCounter; NUM_COUNTERS]);

impl Default for HookCounters {
    fn default() -> Self {
        HookCounters(std::array::from_fn(|_| RelaxedCounter::new(0)))
    }
}

impl HookCounters {
    pub fn snapshot(&self) -> [usize; NUM_COUNTERS] {
        std::array::from_fn(|idx| self.0[idx].get())
    }
}

/// One set of counters per hook.
#[derive(Clone, Default)]
pub struct Counters {
    pub tunnel_egress: Arc<HookCounters>,
    pub gtpu_ingress: Arc<HookCounters>,
    pub tunnel_ingress: Arc<HookCounters>,
    pub gtpu_egress: Arc<HookCounters>,
}

impl Counters {
    pub fn by_hook(&self) -> [(&'static str, &HookCounters); 4] {
        [
            ("tunnel_egress", &self.tunnel_egress),
            ("gtpu_ingress", &self.gtpu_ingress),
            ("tunnel_ingress", &self.tunnel_ingress),
            ("gtpu_egress", &self.gtpu_egress),
        ]
    }
}

/// Logs what changed since the previous call.
#[derive(Default)]
pub struct StatsReporter {
    last: [[usize; NUM_COUNTERS]; 4],
}

impl StatsReporter {
    pub fn log_stats(&mut self, counters: &Counters, logger: &Logger) {
        for (last, (hook, current)) in self.last.iter_mut().zip(counters.by_hook()) {
            let current = current.snapshot();

            if current[RX_PKTS] != last[RX_PKTS] {
                info!(
                    logger,
                    "{hook} pkts={} bytes={} pass={} encap={} decap={} csum={}",
                    current[RX_PKTS],
                    current[RX_BYTES],
                    current[PASS],
                    current[ENCAP],
                    current[DECAP],
                    current[CSUM_FIXED]
                );
            }

            let warn_needed = (FIRST_WARN_IDX..NUM_COUNTERS).any(|idx| current[idx] != last[idx]);
            if warn_needed {
                warn!(
                    logger,
                    "{hook} DROPS too_short={} too_big={} error_ind={} resize={} store={} UNSPEC pull={} MIRROR failed={}",
                    current[DROP_TOO_SHORT],
                    current[DROP_TOO_BIG],
                    current[DROP_ERROR_INDICATION],
                    current[DROP_RESIZE_FAILED],
                    current[DROP_STORE_FAILED],
                    current[UNSPEC_PULL_FAILED],
                    current[MIRROR_FAILED]
                );
            }

            *last = current;
        }
    }
}
