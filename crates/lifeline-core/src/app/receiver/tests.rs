use std::{cell::RefCell, collections::VecDeque, rc::Rc, vec::Vec};

use super::*;
use crate::{
    catalog::AlertCode,
    input::Key,
    network::NetworkAction,
    provisioning::{
        WifiCredentials,
        portal::{Method, PortalRequest, PortalResponse, Status},
    },
    radio::RawFrame,
};

#[derive(Clone, Default)]
struct ScriptedInput {
    events: Rc<RefCell<VecDeque<InputEvent>>>,
}

impl ScriptedInput {
    fn push(&self, event: InputEvent) {
        self.events.borrow_mut().push_back(event);
    }
}

impl InputProvider for ScriptedInput {
    type Error = ();

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        Ok(self.events.borrow_mut().pop_front())
    }
}

#[derive(Clone, Default)]
struct QueuedFrames {
    frames: Rc<RefCell<VecDeque<RawFrame>>>,
}

impl QueuedFrames {
    fn push(&self, payload: &str, rssi: i16) {
        self.frames
            .borrow_mut()
            .push_back(RawFrame::from_slice(payload.as_bytes(), rssi));
    }
}

impl PacketSource for QueuedFrames {
    type Error = ();

    fn poll_frame(&mut self) -> Result<Option<RawFrame>, Self::Error> {
        Ok(self.frames.borrow_mut().pop_front())
    }
}

#[derive(Clone, Default)]
struct MemoryCredentialStore {
    stored: Rc<RefCell<Option<WifiCredentials>>>,
}

impl CredentialStore for MemoryCredentialStore {
    type Error = ();

    fn load(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        Ok(self.stored.borrow().clone())
    }

    fn save(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        *self.stored.borrow_mut() = Some(credentials.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingNetwork {
    events: Rc<RefCell<VecDeque<NetworkEvent>>>,
    applied: Rc<RefCell<Vec<NetworkAction>>>,
    responses: Rc<RefCell<Vec<PortalResponse>>>,
    relayed: Rc<RefCell<Vec<DashboardPush>>>,
    /// Number of upcoming `apply` calls to refuse.
    busy_applies: Rc<RefCell<u32>>,
}

impl RecordingNetwork {
    fn push(&self, event: NetworkEvent) {
        self.events.borrow_mut().push_back(event);
    }
}

impl NetworkLink for RecordingNetwork {
    type Error = ();

    fn apply(&mut self, action: NetworkAction) -> Result<(), Self::Error> {
        let mut busy = self.busy_applies.borrow_mut();
        if *busy > 0 {
            *busy -= 1;
            return Err(());
        }
        self.applied.borrow_mut().push(action);
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Option<NetworkEvent>, Self::Error> {
        Ok(self.events.borrow_mut().pop_front())
    }

    fn respond(&mut self, response: PortalResponse) -> Result<(), Self::Error> {
        self.responses.borrow_mut().push(response);
        Ok(())
    }

    fn relay_alert(&mut self, push: DashboardPush) -> Result<(), Self::Error> {
        self.relayed.borrow_mut().push(push);
        Ok(())
    }
}

type TestApp = ReceiverApp<ScriptedInput, QueuedFrames, MemoryCredentialStore, RecordingNetwork>;

struct Rig {
    app: TestApp,
    input: ScriptedInput,
    frames: QueuedFrames,
    store: MemoryCredentialStore,
    network: RecordingNetwork,
}

/// Boots a receiver and lands on the idle screen at t=2000.
fn rig(stored: Option<WifiCredentials>) -> Rig {
    let input = ScriptedInput::default();
    let frames = QueuedFrames::default();
    let store = MemoryCredentialStore::default();
    *store.stored.borrow_mut() = stored;
    let network = RecordingNetwork::default();
    let mut app = ReceiverApp::new(
        input.clone(),
        Some(frames.clone()),
        store.clone(),
        network.clone(),
        ReceiverConfig::default(),
    );

    assert_eq!(app.tick(0), TickResult::RenderRequested);
    assert_eq!(app.screen_kind(), ScreenKind::Boot);
    let _ = app.tick(2_000);
    assert_eq!(app.screen_kind(), ScreenKind::Idle);

    Rig {
        app,
        input,
        frames,
        store,
        network,
    }
}

fn history_ids(app: &TestApp) -> Vec<u16> {
    app.history().iter().map(|record| record.device_id).collect()
}

fn drain_effects(app: &mut TestApp) -> Vec<Effect> {
    core::iter::from_fn(|| app.next_effect()).collect()
}

#[test]
fn new_packet_supersedes_displayed_alert_and_both_are_logged() {
    let mut rig = rig(None);

    rig.frames.push("TX001,A", -60);
    let _ = rig.app.tick(2_100);
    assert_eq!(rig.app.displayed_alert().map(|r| r.device_id), Some(1));

    rig.frames.push("TX002,C", -75);
    let _ = rig.app.tick(2_200);
    let shown = rig.app.displayed_alert().unwrap();
    assert_eq!(shown.device_id, 2);
    assert_eq!(shown.alert_code, AlertCode::clamped(2));
    assert_eq!(shown.rssi, -75);
    assert_eq!(history_ids(&rig.app), [1, 2]);

    // The display timer restarted with the second alert.
    let _ = rig.app.tick(12_199);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Alert);
    let _ = rig.app.tick(12_200);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);
}

#[test]
fn malformed_frames_change_nothing() {
    let mut rig = rig(None);

    rig.frames.push("garbage", -50);
    rig.frames.push("TX007", -50);
    let _ = rig.app.tick(2_100);
    let _ = rig.app.tick(2_200);

    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);
    assert!(rig.app.history().is_empty());
}

#[test]
fn out_of_range_codes_are_recorded_as_other() {
    let mut rig = rig(None);

    rig.frames.push("TX007,99", -80);
    let _ = rig.app.tick(2_100);

    let latest = rig.app.history().latest().copied().unwrap();
    assert_eq!(latest.alert_code, AlertCode::OTHER);
    assert_eq!(latest.device_id, 7);
}

#[test]
fn critical_alerts_use_critical_tone() {
    let mut rig = rig(None);
    rig.frames.push("TX004,B", -90);
    let _ = rig.app.tick(2_100);
    assert_eq!(
        drain_effects(&mut rig.app),
        [Effect::Tone(TonePattern::Critical)]
    );
}

#[test]
fn radio_frame_wins_over_pending_input_in_one_tick() {
    let mut rig = rig(None);

    rig.frames.push("TX001,A", -60);
    rig.input
        .push(InputEvent::SimulatedPacket(Packet::new(9, AlertCode::OTHER)));
    let _ = rig.app.tick(2_100);
    assert_eq!(history_ids(&rig.app), [1]);

    let _ = rig.app.tick(2_200);
    assert_eq!(history_ids(&rig.app), [1, 9]);
    assert_eq!(rig.app.history().latest().map(|r| r.rssi), Some(SIMULATED_RSSI));
}

#[test]
fn hash_dismisses_alert_early() {
    let mut rig = rig(None);
    rig.frames.push("TX001,A", -60);
    let _ = rig.app.tick(2_100);

    rig.input.push(InputEvent::Key(Key::Hash));
    let _ = rig.app.tick(2_200);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);
    assert_eq!(rig.app.history().len(), 1);
}

#[test]
fn alerts_are_relayed_only_while_online() {
    let mut rig = rig(WifiCredentials::new("Home", "pw").ok());
    assert!(matches!(
        rig.network.applied.borrow().as_slice(),
        [NetworkAction::ConnectStation(_)]
    ));

    rig.frames.push("TX005,D", -70);
    let _ = rig.app.tick(2_100);
    assert!(rig.network.relayed.borrow().is_empty());

    rig.network.push(NetworkEvent::LinkUp);
    let _ = rig.app.tick(2_200);
    assert_eq!(rig.app.link_status(), LinkStatus::Online);

    rig.frames.push("TX006,E", -71);
    let _ = rig.app.tick(2_300);
    assert_eq!(
        *rig.network.relayed.borrow(),
        [DashboardPush {
            did: 6,
            message_code: 4,
            rssi: -71
        }]
    );
}

#[test]
fn long_press_opens_portal_and_save_schedules_restart() {
    let mut rig = rig(None);

    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(3_000);
    let _ = rig.app.tick(5_999);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);

    let _ = rig.app.tick(6_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);
    assert_eq!(
        rig.network.applied.borrow().last(),
        Some(&NetworkAction::StartPortal)
    );

    rig.network.push(NetworkEvent::Request(PortalRequest {
        method: Method::Post,
        path: heapless::String::try_from("/save").unwrap(),
        body: heapless::String::try_from("ssid=Home&password=pw").unwrap(),
    }));
    let _ = rig.app.tick(7_000);

    assert_eq!(rig.network.responses.borrow()[0].status, Status::Ok);
    let saved = rig.store.stored.borrow().clone().unwrap();
    assert_eq!(saved.ssid.as_str(), "Home");
    assert!(rig.app.provisioning().restart_scheduled());

    let _ = rig.app.tick(8_500);
    assert!(drain_effects(&mut rig.app).contains(&Effect::Restart));
}

#[test]
fn early_release_rolls_back_hold_progress() {
    let mut rig = rig(None);

    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(3_000);
    let mut shown = None;
    rig.app.with_screen(4_500, |screen| {
        if let Screen::Idle { hold_pct, .. } = screen {
            shown = hold_pct;
        }
    });
    assert_eq!(shown, Some(50));

    rig.input.push(InputEvent::PortalButton(ButtonEdge::Released));
    assert_eq!(rig.app.tick(4_600), TickResult::RenderRequested);
    let _ = rig.app.tick(7_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);
    rig.app.with_screen(7_000, |screen| {
        if let Screen::Idle { hold_pct, .. } = screen {
            shown = hold_pct;
        }
    });
    assert_eq!(shown, None);
}

#[test]
fn idle_portal_times_out_back_to_idle() {
    let mut rig = rig(None);
    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(3_000);
    let _ = rig.app.tick(6_000);
    rig.input.push(InputEvent::PortalButton(ButtonEdge::Released));
    let _ = rig.app.tick(6_100);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);

    let _ = rig.app.tick(185_999);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);
    let _ = rig.app.tick(186_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);
    assert_eq!(
        rig.network.applied.borrow().last(),
        Some(&NetworkAction::StopPortal)
    );
}

#[test]
fn alert_during_portal_returns_to_portal() {
    let mut rig = rig(None);
    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(3_000);
    let _ = rig.app.tick(6_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);

    rig.frames.push("TX010,K", -65);
    let _ = rig.app.tick(6_500);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Alert);

    let _ = rig.app.tick(16_500);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);
}

#[test]
fn second_long_press_closes_portal() {
    let mut rig = rig(None);
    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(3_000);
    let _ = rig.app.tick(6_000);
    rig.input.push(InputEvent::PortalButton(ButtonEdge::Released));
    let _ = rig.app.tick(6_200);

    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(7_000);
    let _ = rig.app.tick(10_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Idle);
    assert!(!rig.app.provisioning().is_portal_active());
}

#[test]
fn missing_radio_still_accepts_simulated_packets() {
    let input = ScriptedInput::default();
    let mut app: TestApp = ReceiverApp::new(
        input.clone(),
        None,
        MemoryCredentialStore::default(),
        RecordingNetwork::default(),
        ReceiverConfig::default(),
    );
    let _ = app.tick(0);
    let _ = app.tick(2_000);

    input.push(InputEvent::SimulatedPacket(Packet::new(3, AlertCode::EMERGENCY)));
    let _ = app.tick(2_100);
    assert_eq!(app.screen_kind(), ScreenKind::Alert);
}

#[test]
fn refused_network_action_is_offered_again() {
    let mut rig = rig(None);
    *rig.network.busy_applies.borrow_mut() = 1;

    rig.input.push(InputEvent::PortalButton(ButtonEdge::Pressed));
    let _ = rig.app.tick(3_000);
    let _ = rig.app.tick(6_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);
    assert!(rig.network.applied.borrow().is_empty());

    let _ = rig.app.tick(6_005);
    assert_eq!(
        *rig.network.applied.borrow(),
        [NetworkAction::StartPortal]
    );
    assert!(rig.app.provisioning().peek_action().is_none());
}

#[test]
fn refused_actions_keep_their_order() {
    let mut rig = rig(WifiCredentials::new("Home", "pw").ok());
    rig.network.push(NetworkEvent::LinkUp);
    let _ = rig.app.tick(2_100);
    rig.network.applied.borrow_mut().clear();
    *rig.network.busy_applies.borrow_mut() = 2;

    rig.input.push(InputEvent::Key(Key::D));
    let _ = rig.app.tick(3_000);
    rig.network.push(NetworkEvent::LinkFailed);
    let _ = rig.app.tick(3_100);
    assert!(rig.network.applied.borrow().is_empty());

    let _ = rig.app.tick(3_200);
    let applied = rig.network.applied.borrow();
    assert!(matches!(
        applied.as_slice(),
        [
            NetworkAction::ConnectStation(_),
            NetworkAction::StopStation,
            NetworkAction::StartPortal
        ]
    ));
}

#[test]
fn failed_operator_reconnect_lands_on_portal() {
    let mut rig = rig(WifiCredentials::new("Home", "pw").ok());
    rig.network.push(NetworkEvent::LinkUp);
    let _ = rig.app.tick(2_100);
    assert_eq!(rig.app.link_status(), LinkStatus::Online);

    rig.input.push(InputEvent::Key(Key::D));
    let _ = rig.app.tick(3_000);
    assert_eq!(rig.app.link_status(), LinkStatus::Connecting);
    assert!(matches!(
        rig.network.applied.borrow().last(),
        Some(NetworkAction::ConnectStation(creds)) if creds.ssid.as_str() == "Home"
    ));

    rig.network.push(NetworkEvent::LinkFailed);
    let _ = rig.app.tick(3_100);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);
    assert_eq!(
        rig.network.applied.borrow().last(),
        Some(&NetworkAction::StartPortal)
    );
}

#[test]
fn reconnect_without_credentials_opens_portal() {
    let mut rig = rig(None);
    rig.input.push(InputEvent::Key(Key::D));
    let _ = rig.app.tick(3_000);
    assert_eq!(rig.app.screen_kind(), ScreenKind::Portal);
}
