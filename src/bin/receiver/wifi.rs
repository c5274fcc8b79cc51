use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_time::{Duration, Timer, WithTimeout};
use esp_radio::wifi::{
    AccessPointConfig, AuthMethod, ClientConfig, ModeConfig, WifiController, WifiError,
};
use lifeline_core::{
    network::{NetworkAction, NetworkEvent},
    provisioning::WifiCredentials,
};
use lifeline_hal_esp32s3::network::NetworkChannels;
use log::{info, warn};

const NETWORK_POLL_INTERVAL_MS: u64 = 500;
const DHCP_TIMEOUT_SECS: u64 = 15;

/// What the radio should be doing, rebuilt from each action.
#[derive(Default)]
struct WifiPlan {
    station: Option<WifiCredentials>,
    portal: bool,
}

impl WifiPlan {
    fn mode(&self, ap_ssid: &str) -> Option<ModeConfig> {
        let access_point = || {
            AccessPointConfig::default()
                .with_ssid(ap_ssid.into())
                .with_auth_method(AuthMethod::None)
        };
        let client = |credentials: &WifiCredentials| {
            ClientConfig::default()
                .with_ssid(credentials.ssid.as_str().into())
                .with_password(credentials.password.as_str().into())
        };

        match (&self.station, self.portal) {
            (None, false) => None,
            (Some(credentials), false) => Some(ModeConfig::Client(client(credentials))),
            (None, true) => Some(ModeConfig::AccessPoint(access_point())),
            (Some(credentials), true) => {
                Some(ModeConfig::ApSta(client(credentials), access_point()))
            }
        }
    }
}

/// Carries out provisioning actions and reports link changes back.
pub async fn wifi_control_loop(
    controller: &mut WifiController<'_>,
    station: Stack<'_>,
    channels: &'static NetworkChannels,
    ap_ssid: &'static str,
) -> ! {
    let mut plan = WifiPlan::default();
    let mut online = false;

    loop {
        let action = if online {
            match select(
                channels.next_action(),
                Timer::after_millis(NETWORK_POLL_INTERVAL_MS),
            )
            .await
            {
                Either::First(action) => action,
                Either::Second(()) => {
                    if !link_healthy(controller, station) {
                        warn!(
                            "wifi: link lost (link_up={} has_ipv4={})",
                            station.is_link_up(),
                            station.config_v4().is_some()
                        );
                        online = false;
                        channels.publish(NetworkEvent::LinkLost);
                    }
                    continue;
                }
            }
        } else {
            channels.next_action().await
        };

        let connect = match action {
            NetworkAction::ConnectStation(credentials) => {
                info!("wifi: connect ssid={}", credentials.ssid.as_str());
                plan.station = Some(credentials);
                true
            }
            NetworkAction::StopStation => {
                info!("wifi: station off");
                plan.station = None;
                false
            }
            NetworkAction::StartPortal => {
                info!("wifi: access point {} on", ap_ssid);
                plan.portal = true;
                false
            }
            NetworkAction::StopPortal => {
                info!("wifi: access point off");
                plan.portal = false;
                false
            }
        };

        let was_online = online && plan.station.is_some();
        online = false;

        if let Err(err) = apply_plan(controller, &plan, ap_ssid).await {
            warn!("wifi: mode change failed: {:?}", err);
            if connect {
                channels.publish(NetworkEvent::LinkFailed);
            } else if was_online {
                channels.publish(NetworkEvent::LinkLost);
            }
            continue;
        }

        if connect {
            online = connect_station(controller, station).await;
            channels.publish(if online {
                NetworkEvent::LinkUp
            } else {
                NetworkEvent::LinkFailed
            });
        } else if was_online {
            // The restart dropped the association; rejoin quietly.
            online = connect_station(controller, station).await;
            if !online {
                channels.publish(NetworkEvent::LinkLost);
            }
        }
    }
}

/// Restarts the controller in the mode `plan` asks for.
///
/// Restarting drops an existing station association, so the caller
/// reconnects whenever the station stays in the plan.
async fn apply_plan(
    controller: &mut WifiController<'_>,
    plan: &WifiPlan,
    ap_ssid: &str,
) -> Result<(), WifiError> {
    if matches!(controller.is_started(), Ok(true)) {
        controller.stop_async().await?;
    }

    let Some(mode) = plan.mode(ap_ssid) else {
        return Ok(());
    };
    controller.set_config(&mode)?;
    controller.start_async().await
}

async fn connect_station(controller: &mut WifiController<'_>, station: Stack<'_>) -> bool {
    if let Err(err) = controller.connect_async().await {
        warn!("wifi: connect failed: {:?}", err);
        return false;
    }

    match station
        .wait_config_up()
        .with_timeout(Duration::from_secs(DHCP_TIMEOUT_SECS))
        .await
    {
        Ok(()) => {
            if let Some(config) = station.config_v4() {
                info!("wifi: online address={}", config.address);
            }
            true
        }
        Err(_) => {
            warn!("wifi: dhcp timeout");
            let _ = controller.disconnect_async().await;
            false
        }
    }
}

fn link_healthy(controller: &WifiController<'_>, station: Stack<'_>) -> bool {
    station.is_link_up()
        && station.config_v4().is_some()
        && matches!(controller.is_connected(), Ok(true))
}
