//! state_file - initial tunnel state, as a control plane would install it
//!
//! ```toml
//! [egress.ifindex-5]
//! teid = 0x100
//! qfi = 5
//!
//! [ingress.teid-256]
//! qfi = 5
//! ifindex = 5
//! if_mac = "020000000005"
//! ```

use super::{EgressState, IngressState};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use slog::{Logger, error, info};
use std::collections::HashMap;
use std::fs;

#[derive(Deserialize, Default)]
struct RawStateFile {
    #[serde(default)]
    egress: HashMap<String, EgressState>,
    #[serde(default)]
    ingress: HashMap<String, IngressState>,
}

#[derive(Debug, Default)]
pub struct TunnelStateFile {
    /// (tunnel interface index, state)
    pub egress: Vec<(u32, EgressState)>,
    /// (TEID, state)
    pub ingress: Vec<(u32, IngressState)>,
}

fn parse_key(key: &str, prefix: &str, filename: &str) -> Result<u32> {
    let Some(value) = key.strip_prefix(prefix) else {
        bail!("Key {key} in {filename} does not start with '{prefix}'")
    };
    value
        .parse::<u32>()
        .with_context(|| format!("Key {key} in {filename} is not a 32-bit integer"))
}

pub fn parse_state_file(contents: &str, filename: &str, logger: &Logger) -> Result<TunnelStateFile> {
    let raw: RawStateFile = toml::from_str(contents)?;
    let mut state = TunnelStateFile::default();
    for (key, value) in raw.egress.into_iter() {
        let ifindex = parse_key(&key, "ifindex-", filename)?;
        info!(logger, "Loaded egress state {value} for ifindex {ifindex} from {filename}");
        state.egress.push((ifindex, value));
    }
    for (key, value) in raw.ingress.into_iter() {
        let teid = parse_key(&key, "teid-", filename)?;
        info!(logger, "Loaded ingress state {value} for TEID {teid:#x} from {filename}");
        state.ingress.push((teid, value));
    }
    state.egress.sort_by_key(|(k, _)| *k);
    state.ingress.sort_by_key(|(k, _)| *k);
    Ok(state)
}

/// Load the tunnel state from file into memory.
pub fn load_state_file(filename: &str, logger: &Logger) -> Result<TunnelStateFile> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load state file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    parse_state_file(&contents, filename, logger)
}
