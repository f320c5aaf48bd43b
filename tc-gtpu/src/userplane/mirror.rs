//! mirror - best-effort packet capture, one bounded channel per processor

use async_channel::{Receiver, Sender, TrySendError, bounded};
use derive_deref::Deref;
use std::sync::Arc;

/// Sentinel at the start of every capture record.
pub const PCAP_COOKIE: u16 = 0xdead;

/// Most packet bytes copied into one record.
pub const SAMPLE_SIZE: usize = 1024;

pub const MAX_CPUS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRecord {
    pub cookie: u16,
    pub pkt_len: u16,
    pub data: Vec<u8>,
}

impl MirrorRecord {
    fn new(frame: &[u8]) -> Self {
        let captured = &frame[..frame.len().min(SAMPLE_SIZE)];
        MirrorRecord {
            cookie: PCAP_COOKIE,
            pkt_len: captured.len() as u16,
            data: captured.to_vec(),
        }
    }

    /// The four metadata bytes that precede the packet data, as a capture
    /// tool expects them.
    pub fn metadata(&self) -> [u8; 4] {
        let [c0, c1] = self.cookie.to_ne_bytes();
        let [l0, l1] = self.pkt_len.to_ne_bytes();
        [c0, c1, l0, l1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorError {
    NoSuchCpu(usize),
    Full,
    Closed,
}

impl std::fmt::Display for MirrorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MirrorError::NoSuchCpu(cpu) => write!(f, "no capture channel for cpu {cpu}"),
            MirrorError::Full => write!(f, "capture channel full"),
            MirrorError::Closed => write!(f, "capture channel closed"),
        }
    }
}

impl std::error::Error for MirrorError {}

/// Consumer side, indexed by cpu.
#[derive(Deref)]
pub struct MirrorReceivers(Vec<Receiver<MirrorRecord>>);

/// Producer side, shared by every hook.  Each captured packet is copied
/// into a freshly allocated record, so capture is only done when the
/// pipeline runs verbose; the quiet packet path never allocates.
#[derive(Clone, Debug)]
pub struct PcapMirror {
    senders: Arc<Vec<Sender<MirrorRecord>>>,
}

impl PcapMirror {
    /// `num_cpus` is capped at `MAX_CPUS`.  Each channel holds `depth`
    /// records; anything beyond that is lost rather than waited for.
    pub fn new(num_cpus: usize, depth: usize) -> (PcapMirror, MirrorReceivers) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..num_cpus.clamp(1, MAX_CPUS))
            .map(|_| bounded(depth.max(1)))
            .unzip();
        (
            PcapMirror {
                senders: Arc::new(senders),
            },
            MirrorReceivers(receivers),
        )
    }

    pub fn output(&self, cpu: usize, frame: &[u8]) -> Result<(), MirrorError> {
        let sender = self.senders.get(cpu).ok_or(MirrorError::NoSuchCpu(cpu))?;
        sender
            .try_send(MirrorRecord::new(frame))
            .map_err(|e| match e {
                TrySendError::Full(_) => MirrorError::Full,
                TrySendError::Closed(_) => MirrorError::Closed,
            })
    }
}
