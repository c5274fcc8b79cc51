#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::net::Ipv4Addr;

use embassy_executor::Spawner;
use embassy_net::{Ipv4Cidr, StackResources, StaticConfigV4};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Timer;
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    spi::master::Spi,
    time::{Instant, Rate},
    timer::timg::TimerGroup,
    uart::Uart,
};
use lifeline_core::{
    app::{ReceiverApp, ReceiverConfig, TickResult},
    input::ChainedInput,
    radio::RawFrame,
};
use lifeline_hal_esp32s3::{
    input::{
        button::{ButtonConfig, PortalButton},
        serial::SerialLineInput,
    },
    network::{
        NetworkBridge, NetworkChannels,
        dashboard::{DashboardConfig, dashboard_loop},
        dhcp::dhcp_server_loop,
        portal_http::portal_http_loop,
    },
    platform::display::Ili9488,
    radio::lora::{ChannelPacketSource, RX_QUEUE_DEPTH},
    storage::flash_credentials::FlashCredentialStore,
};
use log::{LevelFilter, error, info, warn};
use static_cell::StaticCell;

use board::{Frontend, LORA_SPI_HZ, UI_POLL_MS};

#[path = "shared/board.rs"]
mod board;
#[path = "receiver/wifi.rs"]
mod wifi;

const PORTAL_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
const PORTAL_ADDRESS_TEXT: &str = "192.168.4.1";
const DEFAULT_AP_SSID: &str = "Lifeline-Setup";
const DEFAULT_DASHBOARD_HOST: &str = "192.168.1.100";
const DEFAULT_DASHBOARD_PORT: u16 = 8080;
const DEFAULT_DASHBOARD_PATH: &str = "/api/alerts";

static NETWORK: NetworkChannels = NetworkChannels::new();
static FRAMES: Channel<CriticalSectionRawMutex, RawFrame, RX_QUEUE_DEPTH> = Channel::new();
static STA_RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();
static AP_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

fn env_str(name: &str, raw: Option<&'static str>, default: &'static str) -> &'static str {
    match raw {
        Some(value) if !value.is_empty() => value,
        _ => {
            info!("config: {} unset, using {}", name, default);
            default
        }
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: lifeline receiver starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let ap_ssid = env_str(
        "LIFELINE_PORTAL_SSID",
        option_env!("LIFELINE_PORTAL_SSID"),
        DEFAULT_AP_SSID,
    );
    let dashboard = DashboardConfig {
        host: env_str(
            "LIFELINE_DASHBOARD_HOST",
            option_env!("LIFELINE_DASHBOARD_HOST"),
            DEFAULT_DASHBOARD_HOST,
        ),
        port: board::env_number(
            "LIFELINE_DASHBOARD_PORT",
            option_env!("LIFELINE_DASHBOARD_PORT"),
            DEFAULT_DASHBOARD_PORT,
        ),
        path: env_str(
            "LIFELINE_DASHBOARD_PATH",
            option_env!("LIFELINE_DASHBOARD_PATH"),
            DEFAULT_DASHBOARD_PATH,
        ),
    };
    let profile = board::radio_profile();

    let out = OutputConfig::default();
    let panel = Ili9488::new(
        [
            Output::new(peripherals.GPIO1, Level::Low, out),
            Output::new(peripherals.GPIO2, Level::Low, out),
            Output::new(peripherals.GPIO4, Level::Low, out),
            Output::new(peripherals.GPIO5, Level::Low, out),
            Output::new(peripherals.GPIO6, Level::Low, out),
            Output::new(peripherals.GPIO7, Level::Low, out),
            Output::new(peripherals.GPIO15, Level::Low, out),
            Output::new(peripherals.GPIO16, Level::Low, out),
        ],
        Output::new(peripherals.GPIO17, Level::High, out),
        Output::new(peripherals.GPIO18, Level::High, out),
        Output::new(peripherals.GPIO8, Level::High, out),
        Output::new(peripherals.GPIO21, Level::High, out),
    );
    let mut frontend = Frontend::new(panel, Output::new(peripherals.GPIO47, Level::Low, out));

    let pull_up = InputConfig::default().with_pull(Pull::Up);
    let keypad = board::keypad(
        [
            Output::new(peripherals.GPIO35, Level::High, out),
            Output::new(peripherals.GPIO36, Level::High, out),
            Output::new(peripherals.GPIO37, Level::High, out),
            Output::new(peripherals.GPIO38, Level::High, out),
        ],
        [
            Input::new(peripherals.GPIO39, pull_up),
            Input::new(peripherals.GPIO40, pull_up),
            Input::new(peripherals.GPIO41, pull_up),
            Input::new(peripherals.GPIO42, pull_up),
        ],
    );
    let Ok(button) = PortalButton::new(
        Input::new(peripherals.GPIO0, pull_up),
        ButtonConfig::default(),
    );

    let serial = match Uart::new(peripherals.UART0, esp_hal::uart::Config::default()) {
        Ok(uart) => Some(SerialLineInput::new(
            uart.with_tx(peripherals.GPIO43).with_rx(peripherals.GPIO44),
        )),
        Err(err) => {
            warn!("serial: debug console unavailable: {:?}", err);
            None
        }
    };

    let spi_config = esp_hal::spi::master::Config::default()
        .with_frequency(Rate::from_hz(LORA_SPI_HZ))
        .with_mode(esp_hal::spi::Mode::_0);
    let lora = match Spi::new(peripherals.SPI2, spi_config) {
        Ok(spi) => {
            let spi = spi
                .with_sck(peripherals.GPIO12)
                .with_mosi(peripherals.GPIO11)
                .with_miso(peripherals.GPIO13)
                .into_async();
            board::lora_device(
                spi,
                Output::new(peripherals.GPIO10, Level::High, out),
                Output::new(peripherals.GPIO9, Level::High, out),
                Input::new(peripherals.GPIO14, InputConfig::default()),
                profile,
            )
            .await
        }
        Err(err) => {
            error!("radio: spi config failed: {:?}", err);
            None
        }
    };
    let packets = lora
        .is_some()
        .then(|| ChannelPacketSource::new(FRAMES.receiver()));

    let store = match FlashCredentialStore::new() {
        Ok(store) => Some(store),
        Err(err) => {
            warn!("storage: credentials unavailable: {:?}", err);
            None
        }
    };

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };

    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                loop {
                    Timer::after_secs(1).await;
                }
            }
        };

    let (sta_stack, mut sta_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STA_RESOURCES.init(StackResources::<5>::new()),
        0x4C1F_E11E_0A7E_5EED,
    );
    let ap_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(PORTAL_ADDRESS, 24),
        gateway: Some(PORTAL_ADDRESS),
        dns_servers: Default::default(),
    });
    let (ap_stack, mut ap_runner) = embassy_net::new(
        interfaces.ap,
        ap_config,
        AP_RESOURCES.init(StackResources::<3>::new()),
        0x9D2C_44A1_6B30_F00D,
    );

    let app_config = ReceiverConfig {
        ap_ssid,
        portal_address: PORTAL_ADDRESS_TEXT,
        ..ReceiverConfig::default()
    };
    let input = ChainedInput::new(ChainedInput::new(keypad, button), serial);
    let mut app = ReceiverApp::new(
        input,
        packets,
        store,
        NetworkBridge::new(&NETWORK),
        app_config,
    );

    info!(
        "Receiver started: radio_ok={} freq_hz={} portal_ssid={}",
        lora.is_some(),
        profile.frequency_hz,
        ap_ssid
    );
    info!("Display pins: D0..D7=GPIO1,2,4,5,6,7,15,16 WR=17 DC=18 CS=8 RST=21");
    info!("LoRa pins: SCK=12 MOSI=11 MISO=13 NSS=10 RST=9 DIO0=14");
    info!("Keypad pins: rows=35..38 cols=39..42, setup button=GPIO0");

    let net_future = embassy_futures::join::join(sta_runner.run(), ap_runner.run());
    let wifi_future = wifi::wifi_control_loop(&mut wifi_controller, sta_stack, &NETWORK, ap_ssid);
    let radio_future = async {
        if let Some(device) = lora {
            device.receive_loop(FRAMES.sender()).await;
        }
        core::future::pending::<()>().await
    };
    let services_future = embassy_futures::join::join3(
        portal_http_loop(ap_stack, &NETWORK),
        dhcp_server_loop(ap_stack, PORTAL_ADDRESS),
        dashboard_loop(sta_stack, &NETWORK, dashboard),
    );
    let ui_future = async {
        let loop_start = Instant::now();
        loop {
            let now_ms = loop_start.elapsed().as_millis();

            if app.tick(now_ms) == TickResult::RenderRequested {
                app.with_screen(now_ms, |screen| frontend.draw(screen));
            }
            while let Some(effect) = app.next_effect() {
                frontend.apply(effect, now_ms).await;
            }
            frontend.poll(now_ms);

            Timer::after_millis(UI_POLL_MS).await;
        }
    };

    let _ = embassy_futures::join::join5(
        net_future,
        wifi_future,
        radio_future,
        services_future,
        ui_future,
    )
    .await;
    unreachable!()
}
