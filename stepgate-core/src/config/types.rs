//! Configuration type definitions
//!
//! The controller configuration is embedded in the firmware image as TOML
//! and parsed at boot. Every field has a default, so a missing file section
//! or key keeps the value below.

use heapless::String;

use crate::emergency::DEFAULT_SOFT_STOP_THRESHOLD;

/// Maximum Wi-Fi SSID length
pub const MAX_SSID_LEN: usize = 32;

/// Maximum Wi-Fi passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Task periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Motion task wait for a command before re-checking suspension (ms)
    pub motion_poll_ms: u32,
    /// Emergency protocol evaluation period (ms)
    pub emergency_period_ms: u32,
    /// Pushbutton sampling period (ms)
    pub button_poll_ms: u32,
    /// LED animation frame period (ms)
    pub led_frame_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            motion_poll_ms: 100,
            emergency_period_ms: 100,
            button_poll_ms: 50,
            led_frame_ms: 150,
        }
    }
}

/// Emergency protocol tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyConfig {
    /// Speed (steps/s) at or below which a soft stop suspends motion
    pub soft_stop_speed_threshold: f32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            soft_stop_speed_threshold: DEFAULT_SOFT_STOP_THRESHOLD,
        }
    }
}

/// Static IPv4 setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkConfig {
    pub address: [u8; 4],
    pub prefix_len: u8,
    pub gateway: Option<[u8; 4]>,
    /// HTTP listen port
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: [169, 254, 60, 205],
            prefix_len: 16,
            gateway: None,
            port: 80,
        }
    }
}

/// Wi-Fi credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
}

impl WifiConfig {
    /// Open network when no passphrase is set
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    pub timing: TimingConfig,
    pub safety: SafetyConfig,
    pub network: NetworkConfig,
    pub wifi: WifiConfig,
}

/// Semantic configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A task period is zero
    ZeroPeriod,
    /// Soft stop threshold is negative or not finite
    InvalidThreshold,
    /// Prefix length above 32
    InvalidPrefix,
    /// Listen port is zero
    InvalidPort,
}

impl ControllerConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if [
            t.motion_poll_ms,
            t.emergency_period_ms,
            t.button_poll_ms,
            t.led_frame_ms,
        ]
        .contains(&0)
        {
            return Err(ConfigError::ZeroPeriod);
        }

        let threshold = self.safety.soft_stop_speed_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold);
        }

        if self.network.prefix_len > 32 {
            return Err(ConfigError::InvalidPrefix);
        }

        if self.network.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        Ok(())
    }
}
