//! Minimal TOML parser for the controller configuration
//!
//! Handles only the subset the configuration file uses. It does NOT support
//! the full TOML spec.
//!
//! Supported features:
//! - `[section]` headers
//! - `key = value` pairs (string, integer, float)
//! - Comments (`# ...`), whole-line or trailing
//!
//! NOT supported:
//! - Arrays, inline tables, multi-line strings
//! - Dotted keys

use heapless::String;

use super::types::{ConfigError, ControllerConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Section header not recognized
    InvalidSection { line: u16 },
    /// Key not valid in its section
    UnknownKey { line: u16 },
    /// Value has the wrong type or does not parse
    InvalidValue { line: u16 },
    /// String longer than its field
    TooLong { line: u16 },
    /// Values parsed but are out of range
    Invalid(ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Timing,
    Safety,
    Network,
    Wifi,
}

/// Parse a configuration file, starting from defaults
///
/// The result is validated before it is returned.
pub fn parse_config(input: &str) -> Result<ControllerConfig, ParseError> {
    let mut config = ControllerConfig::default();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let line_no = u16::try_from(index + 1).unwrap_or(u16::MAX);
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = match line[1..line.len() - 1].trim() {
                "timing" => Section::Timing,
                "safety" => Section::Safety,
                "network" => Section::Network,
                "wifi" => Section::Wifi,
                _ => return Err(ParseError::InvalidSection { line: line_no }),
            };
            continue;
        }

        let (key, value) =
            parse_key_value(line).ok_or(ParseError::InvalidValue { line: line_no })?;
        apply_value(&mut config, section, key, value, line_no)?;
    }

    config.validate().map_err(ParseError::Invalid)?;
    Ok(config)
}

fn apply_value(
    config: &mut ControllerConfig,
    section: Section,
    key: &str,
    value: &str,
    line: u16,
) -> Result<(), ParseError> {
    let invalid = ParseError::InvalidValue { line };

    match (section, key) {
        (Section::Timing, "motion_poll_ms") => config.timing.motion_poll_ms = parse_int(value, line)?,
        (Section::Timing, "emergency_period_ms") => {
            config.timing.emergency_period_ms = parse_int(value, line)?
        }
        (Section::Timing, "button_poll_ms") => config.timing.button_poll_ms = parse_int(value, line)?,
        (Section::Timing, "led_frame_ms") => config.timing.led_frame_ms = parse_int(value, line)?,

        (Section::Safety, "soft_stop_speed_threshold") => {
            config.safety.soft_stop_speed_threshold = value.parse().map_err(|_| invalid)?
        }

        (Section::Network, "address") => {
            config.network.address = parse_ipv4(parse_string(value, line)?).ok_or(invalid)?
        }
        (Section::Network, "prefix_len") => config.network.prefix_len = parse_int(value, line)?,
        (Section::Network, "gateway") => {
            let gateway = parse_string(value, line)?;
            config.network.gateway = if gateway.is_empty() {
                None
            } else {
                Some(parse_ipv4(gateway).ok_or(invalid)?)
            };
        }
        (Section::Network, "port") => config.network.port = parse_int(value, line)?,

        (Section::Wifi, "ssid") => config.wifi.ssid = bounded(parse_string(value, line)?, line)?,
        (Section::Wifi, "password") => {
            config.wifi.password = bounded(parse_string(value, line)?, line)?
        }

        _ => return Err(ParseError::UnknownKey { line }),
    }

    Ok(())
}

/// Drop a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a quoted string value
fn parse_string(value: &str, line: u16) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue { line })
}

fn parse_int<T: core::str::FromStr>(value: &str, line: u16) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue { line })
}

fn bounded<const N: usize>(value: &str, line: u16) -> Result<String<N>, ParseError> {
    String::try_from(value).map_err(|_| ParseError::TooLong { line })
}

/// Parse dotted-quad notation
pub fn parse_ipv4(value: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = value.split('.');
    for octet in octets.iter_mut() {
        *octet = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Stepgate controller
[timing]
motion_poll_ms = 50
emergency_period_ms = 100   # fixed precedence loop
button_poll_ms = 25
led_frame_ms = 200

[safety]
soft_stop_speed_threshold = 4.5

[network]
address = "192.168.4.20"
prefix_len = 24
gateway = "192.168.4.1"
port = 8080

[wifi]
ssid = "bench#2"
password = "hunter22"
"#;

    #[test]
    fn test_parse_full_file() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.timing.motion_poll_ms, 50);
        assert_eq!(config.timing.emergency_period_ms, 100);
        assert_eq!(config.timing.button_poll_ms, 25);
        assert_eq!(config.timing.led_frame_ms, 200);
        assert_eq!(config.safety.soft_stop_speed_threshold, 4.5);
        assert_eq!(config.network.address, [192, 168, 4, 20]);
        assert_eq!(config.network.prefix_len, 24);
        assert_eq!(config.network.gateway, Some([192, 168, 4, 1]));
        assert_eq!(config.network.port, 8080);
        assert_eq!(config.wifi.ssid.as_str(), "bench#2");
        assert_eq!(config.wifi.password.as_str(), "hunter22");
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse_config(""), Ok(ControllerConfig::default()));
    }

    #[test]
    fn test_empty_gateway_is_none() {
        let config = parse_config("[network]\ngateway = \"\"\n").unwrap();
        assert_eq!(config.network.gateway, None);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert_eq!(
            parse_config("[timing]\nmotion_poll_ms = fast\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("[motors]\n"),
            Err(ParseError::InvalidSection { line: 1 })
        );
        assert_eq!(
            parse_config("[wifi]\nchannel = 6\n"),
            Err(ParseError::UnknownKey { line: 2 })
        );
        assert_eq!(
            parse_config("port = 80\n"),
            Err(ParseError::UnknownKey { line: 1 })
        );
    }

    #[test]
    fn test_string_too_long() {
        let input = "[wifi]\nssid = \"0123456789012345678901234567890123\"\n";
        assert_eq!(parse_config(input), Err(ParseError::TooLong { line: 2 }));
    }

    #[test]
    fn test_range_errors_are_reported() {
        assert_eq!(
            parse_config("[timing]\nled_frame_ms = 0\n"),
            Err(ParseError::Invalid(ConfigError::ZeroPeriod))
        );
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("10.0.0.1"), Some([10, 0, 0, 1]));
        assert_eq!(parse_ipv4("10.0.0"), None);
        assert_eq!(parse_ipv4("10.0.0.1.5"), None);
        assert_eq!(parse_ipv4("256.0.0.1"), None);
    }
}
