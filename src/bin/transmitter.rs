#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
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
    app::{TickResult, TransmitterApp, TransmitterConfig},
    input::ChainedInput,
};
use lifeline_hal_esp32s3::{
    input::serial::SerialLineInput, platform::display::Ili9488, radio::lora::LoraTransmitter,
};
use log::{LevelFilter, error, info, warn};

use board::{Frontend, LORA_SPI_HZ, UI_POLL_MS};

#[path = "shared/board.rs"]
mod board;

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: lifeline transmitter starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-rtos is built with esp-alloc support.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 32768);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let device_id = board::env_number(
        "LIFELINE_DEVICE_ID",
        option_env!("LIFELINE_DEVICE_ID"),
        TransmitterConfig::default().device_id,
    );
    let device_id = if device_id > 999 {
        warn!("config: LIFELINE_DEVICE_ID={} exceeds 999, using 1", device_id);
        1
    } else {
        device_id
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
    let radio = match Spi::new(peripherals.SPI2, spi_config) {
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
            .map(LoraTransmitter::new)
        }
        Err(err) => {
            error!("radio: spi config failed: {:?}", err);
            None
        }
    };

    let app_config = TransmitterConfig {
        device_id,
        profile,
        ..TransmitterConfig::default()
    };
    let mut app = TransmitterApp::new(ChainedInput::new(keypad, serial), radio, app_config);

    info!(
        "Transmitter started: device_id={} radio_ok={} freq_hz={}",
        device_id,
        app.radio_available(),
        profile.frequency_hz
    );
    info!("Display pins: D0..D7=GPIO1,2,4,5,6,7,15,16 WR=17 DC=18 CS=8 RST=21");
    info!("LoRa pins: SCK=12 MOSI=11 MISO=13 NSS=10 RST=9 DIO0=14");
    info!("Keypad pins: rows=35..38 cols=39..42");

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
}
