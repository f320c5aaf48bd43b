use anyhow::{Result, ensure};
use serde::Deserialize;
use slog::{Logger, error, info};
use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Quiet,
    // Mirror every packet seen by a hook to the capture channel.
    Verbose,
}

/// Static configuration, supplied once when the hooks are attached and
/// never changed afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Outer destination address - the GTP-U peer in the core network.
    pub daddr: Ipv4Addr,

    // Outer source address of encapsulated packets.
    pub saddr: Ipv4Addr,

    // IPv6 source address.  Only carried for loaders that build the IPv6
    // template; no hook encapsulates over IPv6.
    #[serde(default)]
    pub saddr6: Option<Ipv6Addr>,

    // Interface index of the shared GTP-U facing interface.
    pub gtpu_ifindex: u32,

    #[serde(default)]
    pub verbose: Verbosity,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.daddr.is_unspecified(),
            "Unspecified tunnel destination address 0.0.0.0 not allowed"
        );
        ensure!(
            !self.saddr.is_unspecified(),
            "Unspecified tunnel source address 0.0.0.0 not allowed - this must be an address the core can send to"
        );
        if let Some(saddr6) = self.saddr6 {
            ensure!(
                !saddr6.is_unspecified(),
                "Unspecified IPv6 source address :: not allowed"
            );
        }
        ensure!(self.gtpu_ifindex != 0, "GTP-U interface index must not be 0");
        Ok(())
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose == Verbosity::Verbose
    }
}

/// Load and validate the gateway configuration.
pub fn load_config_file(filename: &str, logger: &Logger) -> Result<Config> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load config file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    info!(
        logger,
        "Loaded config from {filename}: {} -> {} via ifindex {}",
        config.saddr,
        config.daddr,
        config.gtpu_ifindex
    );
    Ok(config)
}
