use crate::data::{EgressState, IngressState, MAX_QFI};
use anyhow::{Result, anyhow, ensure};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// Most entries either table will hold.
pub const MAX_STATE_ENTRIES: usize = 32;

/// Bounded table of tunnel state shared between the control plane and the
/// hooks, which only do point lookups.  A lookup copies the value out under
/// the shard lock, so a reader racing a writer sees either the old or the
/// new entry, never a mix.  Inserts are serialized so that the capacity
/// check and the insert happen as one step.
#[derive(Debug)]
pub struct StateTable<V: Copy> {
    entries: Arc<DashMap<u32, V>>,
    insert_lock: Arc<Mutex<()>>,
}

pub type EgressStateTable = StateTable<EgressState>;
pub type IngressStateTable = StateTable<IngressState>;

impl<V: Copy> Clone for StateTable<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            insert_lock: self.insert_lock.clone(),
        }
    }
}

impl<V: Copy> Default for StateTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy> StateTable<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(MAX_STATE_ENTRIES)),
            insert_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn lookup(&self, key: u32) -> Option<V> {
        self.entries.get(&key).map(|entry| *entry)
    }

    pub fn remove(&self, key: u32) -> Option<V> {
        self.entries.remove(&key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_bounded(&self, key: u32, value: V) -> Result<()> {
        let _guard = self
            .insert_lock
            .lock()
            .map_err(|_| anyhow!("State table insert lock poisoned"))?;
        ensure!(
            self.entries.contains_key(&key) || self.entries.len() < MAX_STATE_ENTRIES,
            "State table full ({MAX_STATE_ENTRIES} entries), cannot add key {key:#x}"
        );
        self.entries.insert(key, value);
        Ok(())
    }
}

impl StateTable<EgressState> {
    /// Install or replace the egress state for tunnel interface `ifindex`.
    pub fn insert(&self, ifindex: u32, state: EgressState) -> Result<()> {
        ensure!(state.qfi <= MAX_QFI, "QFI {} out of range", state.qfi);
        self.insert_bounded(ifindex, state)
    }
}

impl StateTable<IngressState> {
    /// Install or replace the ingress state for `teid`.
    pub fn insert(&self, teid: u32, state: IngressState) -> Result<()> {
        ensure!(state.qfi <= MAX_QFI, "QFI {} out of range", state.qfi);
        self.insert_bounded(teid, state)
    }
}
