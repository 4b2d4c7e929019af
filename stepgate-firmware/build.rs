//! Build script for stepgate-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates stepgate.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "stepgate.toml";

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate stepgate.toml so a broken file fails the build instead of
/// silently falling back to defaults on the device
fn validate_config() {
    println!("cargo:rerun-if-changed={}", CONFIG_FILE);

    let config_path = Path::new(CONFIG_FILE);
    if !config_path.exists() {
        report("stepgate.toml not found", &["Create one next to Cargo.toml".into()]);
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => report("Failed to read stepgate.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => report(
            "Invalid TOML syntax in stepgate.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_timing(&config, &mut errors);
    validate_safety(&config, &mut errors);
    validate_network(&config, &mut errors);
    validate_wifi(&config, &mut errors);

    if !errors.is_empty() {
        report("Invalid configuration in stepgate.toml", &errors);
    }

    println!("cargo:warning=stepgate.toml validated successfully");
}

fn report(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let line = if line.chars().count() > 62 {
                    format!("{}...", line.chars().take(59).collect::<String>())
                } else {
                    line.clone()
                };
                format!("║  • {:<62} ║", line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn section<'a>(config: &'a toml::Value, name: &str, errors: &mut Vec<String>) -> Option<&'a toml::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => None,
    }
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(timing) = section(config, "timing", errors) else {
        return;
    };

    for (key, value) in timing {
        match key.as_str() {
            "motion_poll_ms" | "emergency_period_ms" | "button_poll_ms" | "led_frame_ms" => {
                match value.as_integer() {
                    Some(ms) if (1..=60_000).contains(&ms) => {}
                    _ => errors.push(format!("[timing] {} must be 1-60000", key)),
                }
            }
            _ => errors.push(format!("[timing] unknown key '{}'", key)),
        }
    }
}

fn validate_safety(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(safety) = section(config, "safety", errors) else {
        return;
    };

    for (key, value) in safety {
        match key.as_str() {
            "soft_stop_speed_threshold" => {
                let threshold = value
                    .as_float()
                    .or_else(|| value.as_integer().map(|i| i as f64));
                match threshold {
                    Some(t) if t >= 0.0 => {}
                    _ => errors.push("[safety] soft_stop_speed_threshold must be >= 0".into()),
                }
            }
            _ => errors.push(format!("[safety] unknown key '{}'", key)),
        }
    }
}

fn validate_network(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(network) = section(config, "network", errors) else {
        return;
    };

    for (key, value) in network {
        match key.as_str() {
            "address" => match value.as_str() {
                Some(s) if s.parse::<Ipv4Addr>().is_ok() => {}
                _ => errors.push("[network] address must be a dotted IPv4 string".into()),
            },
            "gateway" => match value.as_str() {
                Some("") => {}
                Some(s) if s.parse::<Ipv4Addr>().is_ok() => {}
                _ => errors.push("[network] gateway must be empty or an IPv4 string".into()),
            },
            "prefix_len" => match value.as_integer() {
                Some(p) if (1..=32).contains(&p) => {}
                _ => errors.push("[network] prefix_len must be 1-32".into()),
            },
            "port" => match value.as_integer() {
                Some(p) if (1..=65535).contains(&p) => {}
                _ => errors.push("[network] port must be 1-65535".into()),
            },
            _ => errors.push(format!("[network] unknown key '{}'", key)),
        }
    }
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(wifi) = section(config, "wifi", errors) else {
        return;
    };

    for (key, value) in wifi {
        let limit = match key.as_str() {
            "ssid" => 32,
            "password" => 64,
            _ => {
                errors.push(format!("[wifi] unknown key '{}'", key));
                continue;
            }
        };
        match value.as_str() {
            Some(s) if s.len() <= limit => {}
            Some(_) => errors.push(format!("[wifi] {} longer than {} bytes", key, limit)),
            None => errors.push(format!("[wifi] {} must be a string", key)),
        }
    }
}
