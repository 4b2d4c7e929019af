//! Pico W network bring-up
//!
//! Powers the CYW43439, joins the configured network and starts the
//! embassy-net stack with the static address from the configuration.
//!
//! The CYW43 firmware and CLM blobs are not linked into the image. Flash them
//! once next to the application:
//!
//! ```text
//! probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
//! probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000
//! ```

use cyw43::JoinOptions;
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use defmt::panic;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Ipv4Address, Ipv4Cidr, Stack, StackResources, StaticConfigV4};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::Pio;
use embassy_rp::Peri;
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;

use stepgate_core::config::{NetworkConfig, WifiConfig};

use crate::Irqs;

const FIRMWARE_ADDR: usize = 0x1010_0000;
const FIRMWARE_LEN: usize = 230_321;
const CLM_ADDR: usize = 0x1014_0000;
const CLM_LEN: usize = 4_752;

/// Join attempts before giving up
const MAX_JOIN_ATTEMPTS: u8 = 5;

/// Sockets: the HTTP listener plus headroom
const SOCKET_COUNT: usize = 3;

/// smoltcp only uses this for port and sequence number randomization
const NET_SEED: u64 = 0x5eed_57e9_6a7e_0001;

/// Peripherals wired to the CYW43439 on the Pico W
pub struct WifiPeripherals {
    pub pwr: Peri<'static, PIN_23>,
    pub dio: Peri<'static, PIN_24>,
    pub cs: Peri<'static, PIN_25>,
    pub clk: Peri<'static, PIN_29>,
    pub pio: Peri<'static, PIO0>,
    pub dma: Peri<'static, DMA_CH0>,
}

type WifiSpi = PioSpi<'static, PIO0, 0, DMA_CH0>;

#[embassy_executor::task]
async fn wifi_task(runner: cyw43::Runner<'static, Output<'static>, WifiSpi>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Bring up Wi-Fi and the IP stack
///
/// Returns `None` when no SSID is configured. A network that cannot be
/// joined is fatal.
pub async fn start(
    spawner: Spawner,
    wifi: &WifiConfig,
    network: &NetworkConfig,
    p: WifiPeripherals,
) -> Option<Stack<'static>> {
    if wifi.ssid.is_empty() {
        warn!("No Wi-Fi SSID configured, HTTP endpoint disabled");
        return None;
    }

    // SAFETY: both regions are read-only flash written by probe-rs and never
    // touched by the application image (see memory.x).
    let (fw, clm) = unsafe {
        (
            core::slice::from_raw_parts(FIRMWARE_ADDR as *const u8, FIRMWARE_LEN),
            core::slice::from_raw_parts(CLM_ADDR as *const u8, CLM_LEN),
        )
    };

    let pwr = Output::new(p.pwr, Level::Low);
    let cs = Output::new(p.cs, Level::High);
    let mut pio = Pio::new(p.pio, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.dio,
        p.clk,
        p.dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    unwrap!(spawner.spawn(wifi_task(runner)));

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    let [a, b, c, d] = network.address;
    info!(
        "Static address {}.{}.{}.{}/{}",
        a, b, c, d, network.prefix_len
    );
    let net_config = NetConfig::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(Ipv4Address::new(a, b, c, d), network.prefix_len),
        gateway: network
            .gateway
            .map(|[a, b, c, d]| Ipv4Address::new(a, b, c, d)),
        dns_servers: Default::default(),
    });

    static RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        net_config,
        RESOURCES.init(StackResources::new()),
        NET_SEED,
    );
    unwrap!(spawner.spawn(net_task(runner)));

    let mut attempt = 1;
    loop {
        info!(
            "Joining {} (attempt {}/{})",
            wifi.ssid.as_str(),
            attempt,
            MAX_JOIN_ATTEMPTS
        );

        let options = if wifi.is_open() {
            JoinOptions::new_open()
        } else {
            JoinOptions::new(wifi.password.as_bytes())
        };

        match control.join(wifi.ssid.as_str(), options).await {
            Ok(()) => break,
            Err(e) => {
                warn!("Join failed with status {}", e.status);
                if attempt >= MAX_JOIN_ATTEMPTS {
                    panic!("Could not join {}", wifi.ssid.as_str());
                }
                Timer::after(Duration::from_secs(1u64 << (attempt - 1))).await;
                attempt += 1;
            }
        }
    }

    info!("Wi-Fi connected");
    Some(stack)
}
