mod config;
pub mod state_file;
mod tunnel_state;

pub use config::*;
pub use state_file::TunnelStateFile;
pub use tunnel_state::*;
