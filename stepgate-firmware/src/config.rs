//! Controller configuration
//!
//! `stepgate.toml` is embedded at compile time and already validated by
//! build.rs, so a parse failure here means the two parsers disagree.

use defmt::*;

use stepgate_core::config::{parse_config, ControllerConfig};

const EMBEDDED_CONFIG: &str = include_str!("../stepgate.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load_config() -> ControllerConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: {}.{}.{}.{}/{} port {}",
                config.network.address[0],
                config.network.address[1],
                config.network.address[2],
                config.network.address[3],
                config.network.prefix_len,
                config.network.port
            );
            config
        }
        Err(e) => {
            error!("Failed to parse stepgate.toml: {:?}, using defaults", e);
            ControllerConfig::default()
        }
    }
}
