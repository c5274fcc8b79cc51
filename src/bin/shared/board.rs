//! Wiring and output plumbing shared by the transmitter and receiver images.
//!
//! Pinout (ESP32-S3 module without octal PSRAM):
//! - ILI9488 8-bit bus: D0..D7=GPIO1,2,4,5,6,7,15,16 WR=17 DC=18 CS=8 RST=21
//! - SX1278: SCK=12 MOSI=11 MISO=13 NSS=10 RST=9 DIO0=14
//! - 4x4 keypad: rows=GPIO35..38, cols=GPIO39..42 with pull-ups
//! - active buzzer=GPIO47, setup button=GPIO0 (BOOT)
//! - debug console: UART0 TX=43 RX=44

use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use esp_hal::{
    Async,
    delay::Delay,
    gpio::{Input, Output},
    spi::master::Spi,
};
use lifeline_core::{feedback::Effect, radio::RadioProfile, render::Screen};
use lifeline_hal_esp32s3::{
    input::keypad::{KeypadConfig, KeypadInput},
    platform::{buzzer::Buzzer, display::Ili9488},
    radio::lora::{LoraDevice, LoraSpiBus},
    render::{FrameRenderer, screens::ScreenRenderer},
};
use log::{error, info, warn};
use static_cell::StaticCell;

pub const UI_POLL_MS: u64 = 5;
pub const LORA_SPI_HZ: u32 = 8_000_000;
const RESTART_NOTICE_MS: u64 = 200;

static LORA_BUS: StaticCell<LoraSpiBus> = StaticCell::new();

pub type Panel = Ili9488<
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
>;

pub type Keypad = KeypadInput<Output<'static>, Input<'static>>;

pub fn keypad(rows: [Output<'static>; 4], cols: [Input<'static>; 4]) -> Keypad {
    let Ok(keypad) = KeypadInput::new(rows, cols, KeypadConfig::default());
    keypad
}

/// Link parameters, with build-time overrides for band plan and power.
pub fn radio_profile() -> RadioProfile {
    let defaults = RadioProfile::default();
    let frequency_hz = env_number(
        "LIFELINE_LORA_FREQUENCY_HZ",
        option_env!("LIFELINE_LORA_FREQUENCY_HZ"),
        defaults.frequency_hz,
    );
    let tx_power_dbm = env_number(
        "LIFELINE_LORA_TX_POWER_DBM",
        option_env!("LIFELINE_LORA_TX_POWER_DBM"),
        defaults.tx_power_dbm,
    );
    if !(RadioProfile::MIN_TX_POWER_DBM..=RadioProfile::MAX_TX_POWER_DBM).contains(&tx_power_dbm) {
        warn!(
            "config: LIFELINE_LORA_TX_POWER_DBM={} clamped to {}..={}",
            tx_power_dbm,
            RadioProfile::MIN_TX_POWER_DBM,
            RadioProfile::MAX_TX_POWER_DBM
        );
    }

    defaults
        .with_frequency_hz(frequency_hz)
        .with_tx_power_dbm(tx_power_dbm)
}

/// Brings up the SX1278; `None` leaves the app in its radio-unavailable mode.
pub async fn lora_device(
    spi: Spi<'static, Async>,
    cs: Output<'static>,
    reset: Output<'static>,
    dio0: Input<'static>,
    profile: RadioProfile,
) -> Option<LoraDevice> {
    let bus = LORA_BUS.init(Mutex::new(spi));
    match LoraDevice::new(bus, cs, reset, dio0, profile).await {
        Ok(device) => Some(device),
        Err(err) => {
            error!("radio: init failed: {:?}", err);
            esp_println::println!("boot: radio unavailable");
            None
        }
    }
}

/// Display, renderer and buzzer driven from the UI loop.
pub struct Frontend {
    panel: Panel,
    renderer: ScreenRenderer,
    buzzer: Buzzer<Output<'static>>,
    display_fault_logged: bool,
    first_frame_logged: bool,
}

impl Frontend {
    pub fn new(mut panel: Panel, buzzer_pin: Output<'static>) -> Self {
        let mut delay = Delay::new();
        esp_println::println!("display: init begin (ILI9488 8-bit, WR=17 DC=18 CS=8 RST=21)");
        let display_fault_logged = match panel.initialize(&mut delay) {
            Ok(()) => {
                esp_println::println!("display: initialize ok");
                false
            }
            Err(err) => {
                esp_println::println!("display: initialize failed");
                info!("display initialize failed: {:?}", err);
                true
            }
        };

        let Ok(buzzer) = Buzzer::new(buzzer_pin);

        Self {
            panel,
            renderer: ScreenRenderer::new(),
            buzzer,
            display_fault_logged,
            first_frame_logged: false,
        }
    }

    pub fn draw(&mut self, screen: Screen<'_>) {
        match self.renderer.render(screen, &mut self.panel) {
            Ok(()) if !self.first_frame_logged => {
                esp_println::println!("display: first frame ok");
                self.first_frame_logged = true;
            }
            Ok(()) => {}
            Err(err) => {
                if !self.display_fault_logged {
                    esp_println::println!("display: draw failed");
                    info!("display draw failed: {:?}", err);
                    self.display_fault_logged = true;
                }
            }
        }
    }

    pub async fn apply(&mut self, effect: Effect, now_ms: u64) {
        match effect {
            Effect::Tone(pattern) => {
                let Ok(()) = self.buzzer.play(pattern, now_ms);
            }
            Effect::Restart => {
                info!("boot: restarting to apply new settings");
                Timer::after_millis(RESTART_NOTICE_MS).await;
                esp_hal::system::software_reset();
            }
        }
    }

    pub fn poll(&mut self, now_ms: u64) {
        let Ok(()) = self.buzzer.poll(now_ms);
    }
}

/// Parses a numeric build-time setting, logging when the default is used.
pub fn env_number<T>(name: &str, raw: Option<&str>, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Display + Copy,
{
    match raw.map(str::parse::<T>) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            warn!("config: {} is not a number, using {}", name, default);
            default
        }
        None => {
            info!("config: {} unset, using {}", name, default);
            default
        }
    }
}
