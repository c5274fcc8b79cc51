//! SX1278 (433 MHz) link over `lora-phy`.
//!
//! lora-phy drives the SX1278 through its `Sx1276` variant; the two parts
//! share a register map and differ only in supported bands.

use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice;
use embassy_futures::block_on;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Receiver, Sender},
    mutex::Mutex,
};
use embassy_time::{Delay, Timer};
use esp_hal::{
    Async,
    gpio::{Input, Output},
    spi::master::Spi,
};
use lifeline_core::radio::{
    Bandwidth, CodingRate, MAX_FRAME_BYTES, PacketSource, RadioLink, RadioProfile, RawFrame,
    SpreadingFactor,
};
use log::{error, info, warn};
use lora_phy::{
    LoRa, RxMode,
    iv::GenericSx127xInterfaceVariant,
    mod_params::{self, ModulationParams, PacketParams, RadioError},
    sx127x::{Config, Sx127x, Sx1276},
};

/// Frames buffered between the receive future and the UI loop.
pub const RX_QUEUE_DEPTH: usize = 4;
const RX_ERROR_BACKOFF_MS: u64 = 200;

pub type LoraSpiBus = Mutex<CriticalSectionRawMutex, Spi<'static, Async>>;

pub type LoraRadio = LoRa<
    Sx127x<
        SpiDevice<'static, CriticalSectionRawMutex, Spi<'static, Async>, Output<'static>>,
        GenericSx127xInterfaceVariant<Output<'static>, Input<'static>>,
        Sx1276,
    >,
    Delay,
>;

pub type FrameSender = Sender<'static, CriticalSectionRawMutex, RawFrame, RX_QUEUE_DEPTH>;
pub type FrameReceiver = Receiver<'static, CriticalSectionRawMutex, RawFrame, RX_QUEUE_DEPTH>;

#[derive(Debug)]
pub enum LoraInitError {
    Interface(RadioError),
    Radio(RadioError),
    Modulation(RadioError),
    PacketParams(RadioError),
}

/// Initialised radio with its modulation and packet parameters.
pub struct LoraDevice {
    lora: LoraRadio,
    profile: RadioProfile,
    modulation: ModulationParams,
    tx_params: PacketParams,
    rx_params: PacketParams,
}

impl LoraDevice {
    pub async fn new(
        bus: &'static LoraSpiBus,
        cs: Output<'static>,
        reset: Output<'static>,
        dio0: Input<'static>,
        profile: RadioProfile,
    ) -> Result<Self, LoraInitError> {
        let config = Config {
            chip: Sx1276,
            tcxo_used: false,
            // Ra-02 style modules route the antenna through PA_BOOST.
            tx_boost: true,
            rx_boost: true,
        };

        let iv = GenericSx127xInterfaceVariant::new(reset, dio0, None, None)
            .map_err(LoraInitError::Interface)?;
        let radio = Sx127x::new(SpiDevice::new(bus, cs), iv, config);
        let mut lora = LoRa::new(radio, false, Delay)
            .await
            .map_err(LoraInitError::Radio)?;

        let modulation = lora
            .create_modulation_params(
                spreading_factor(profile.spreading_factor),
                bandwidth(profile.bandwidth),
                coding_rate(profile.coding_rate),
                profile.frequency_hz,
            )
            .map_err(LoraInitError::Modulation)?;
        let tx_params = lora
            .create_tx_packet_params(profile.preamble_len, false, true, false, &modulation)
            .map_err(LoraInitError::PacketParams)?;
        let rx_params = lora
            .create_rx_packet_params(
                profile.preamble_len,
                false,
                MAX_FRAME_BYTES as u8,
                true,
                false,
                &modulation,
            )
            .map_err(LoraInitError::PacketParams)?;

        info!(
            "radio: ready freq_hz={} sf={:?} bw={:?} cr={:?} power_dbm={}",
            profile.frequency_hz,
            profile.spreading_factor,
            profile.bandwidth,
            profile.coding_rate,
            profile.tx_power_dbm
        );

        Ok(Self {
            lora,
            profile,
            modulation,
            tx_params,
            rx_params,
        })
    }

    pub const fn profile(&self) -> RadioProfile {
        self.profile
    }

    pub async fn transmit(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.lora
            .prepare_for_tx(
                &self.modulation,
                &mut self.tx_params,
                self.profile.tx_power_dbm as i32,
                payload,
            )
            .await?;
        self.lora.tx().await?;
        self.lora.sleep(false).await
    }

    async fn start_continuous_rx(&mut self) -> Result<(), RadioError> {
        self.lora
            .prepare_for_rx(RxMode::Continuous, &self.modulation, &self.rx_params)
            .await
    }

    /// Listens forever, forwarding every received frame to `frames`.
    ///
    /// Frames are dropped with a warning when the UI loop falls behind.
    pub async fn receive_loop(mut self, frames: FrameSender) -> ! {
        let mut buf = [0u8; MAX_FRAME_BYTES];

        loop {
            if let Err(err) = self.start_continuous_rx().await {
                error!("radio: prepare_for_rx failed: {:?}", err);
                Timer::after_millis(RX_ERROR_BACKOFF_MS).await;
                continue;
            }

            loop {
                match self.lora.rx(&self.rx_params, &mut buf).await {
                    Ok((len, status)) => {
                        let len = (len as usize).min(buf.len());
                        if frames
                            .try_send(RawFrame::from_slice(&buf[..len], status.rssi))
                            .is_err()
                        {
                            warn!("radio: frame queue full, dropped {} bytes", len);
                        }
                    }
                    Err(err) => {
                        warn!("radio: rx failed: {:?}", err);
                        Timer::after_millis(RX_ERROR_BACKOFF_MS).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Blocking transmitter handed to the transmitter state machine.
///
/// Each call runs the async transmit to completion, which bounds the UI
/// stall to one time-on-air.
pub struct LoraTransmitter {
    device: LoraDevice,
}

impl LoraTransmitter {
    pub const fn new(device: LoraDevice) -> Self {
        Self { device }
    }
}

impl RadioLink for LoraTransmitter {
    type Error = RadioError;

    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        block_on(self.device.transmit(payload))
    }
}

/// UI-side end of the receive queue.
pub struct ChannelPacketSource {
    frames: FrameReceiver,
}

impl ChannelPacketSource {
    pub const fn new(frames: FrameReceiver) -> Self {
        Self { frames }
    }
}

impl PacketSource for ChannelPacketSource {
    type Error = core::convert::Infallible;

    fn poll_frame(&mut self) -> Result<Option<RawFrame>, Self::Error> {
        Ok(self.frames.try_receive().ok())
    }
}

fn spreading_factor(sf: SpreadingFactor) -> mod_params::SpreadingFactor {
    match sf {
        SpreadingFactor::Sf7 => mod_params::SpreadingFactor::_7,
        SpreadingFactor::Sf8 => mod_params::SpreadingFactor::_8,
        SpreadingFactor::Sf9 => mod_params::SpreadingFactor::_9,
        SpreadingFactor::Sf10 => mod_params::SpreadingFactor::_10,
        SpreadingFactor::Sf11 => mod_params::SpreadingFactor::_11,
        SpreadingFactor::Sf12 => mod_params::SpreadingFactor::_12,
    }
}

fn bandwidth(bw: Bandwidth) -> mod_params::Bandwidth {
    match bw {
        Bandwidth::Khz125 => mod_params::Bandwidth::_125KHz,
        Bandwidth::Khz250 => mod_params::Bandwidth::_250KHz,
        Bandwidth::Khz500 => mod_params::Bandwidth::_500KHz,
    }
}

fn coding_rate(cr: CodingRate) -> mod_params::CodingRate {
    match cr {
        CodingRate::Cr4_5 => mod_params::CodingRate::_4_5,
        CodingRate::Cr4_6 => mod_params::CodingRate::_4_6,
        CodingRate::Cr4_7 => mod_params::CodingRate::_4_7,
        CodingRate::Cr4_8 => mod_params::CodingRate::_4_8,
    }
}
