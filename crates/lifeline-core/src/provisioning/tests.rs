use super::*;
use crate::network::NetworkEvent;

#[derive(Default)]
struct MemoryCredentialStore {
    stored: Option<WifiCredentials>,
    fail_save: bool,
}

impl CredentialStore for MemoryCredentialStore {
    type Error = ();

    fn load(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        Ok(self.stored.clone())
    }

    fn save(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        if self.fail_save {
            return Err(());
        }
        self.stored = Some(credentials.clone());
        Ok(())
    }
}

fn stored(ssid: &str) -> MemoryCredentialStore {
    MemoryCredentialStore {
        stored: WifiCredentials::new(ssid, "pw").ok(),
        fail_save: false,
    }
}

fn drain(manager: &mut ProvisioningManager) -> std::vec::Vec<NetworkAction> {
    core::iter::from_fn(|| manager.next_action()).collect()
}

fn post_save(body: &str) -> PortalRequest {
    PortalRequest {
        method: Method::Post,
        path: String::try_from("/save").unwrap(),
        body: String::try_from(body).unwrap(),
    }
}

#[test]
fn boot_without_credentials_stays_unconfigured() {
    let mut store = MemoryCredentialStore::default();
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);

    assert_eq!(manager.state(), ProvisioningState::Unconfigured);
    assert!(drain(&mut manager).is_empty());
}

#[test]
fn boot_can_open_portal_when_unconfigured() {
    let mut store = MemoryCredentialStore::default();
    let mut manager = ProvisioningManager::new(ProvisioningConfig {
        open_portal_when_unconfigured: true,
        ..ProvisioningConfig::default()
    });
    manager.boot(&mut store, 0);

    assert!(manager.is_portal_active());
    assert_eq!(drain(&mut manager), [NetworkAction::StartPortal]);
}

#[test]
fn stored_credentials_connect_and_time_out_silently() {
    let mut store = stored("Home");
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 1_000);

    assert!(matches!(
        drain(&mut manager).as_slice(),
        [NetworkAction::ConnectStation(creds)] if creds.ssid.as_str() == "Home"
    ));
    assert_eq!(
        manager.state(),
        ProvisioningState::Connecting {
            deadline_ms: 16_000,
            explicit: false
        }
    );

    manager.tick(15_999);
    assert_eq!(manager.link_status(), LinkStatus::Connecting);
    manager.tick(16_000);
    assert_eq!(manager.state(), ProvisioningState::Unconfigured);
    assert_eq!(drain(&mut manager), [NetworkAction::StopStation]);
}

#[test]
fn link_up_after_connect_timeout_is_torn_down() {
    let mut store = stored("Home");
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    manager.tick(15_000);
    let _ = drain(&mut manager);

    manager.on_network_event(&NetworkEvent::LinkUp, 16_000);

    assert_eq!(manager.state(), ProvisioningState::Unconfigured);
    assert_eq!(manager.link_status(), LinkStatus::Offline);
    assert_eq!(drain(&mut manager), [NetworkAction::StopStation]);
}

#[test]
fn duplicate_link_up_while_connected_changes_nothing() {
    let mut store = stored("Home");
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    manager.on_network_event(&NetworkEvent::LinkUp, 500);
    let _ = drain(&mut manager);

    manager.on_network_event(&NetworkEvent::LinkUp, 900);

    assert_eq!(manager.state(), ProvisioningState::Connected);
    assert!(drain(&mut manager).is_empty());
}

#[test]
fn failed_explicit_reconnect_opens_portal() {
    let mut store = stored("Home");
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    manager.on_network_event(&NetworkEvent::LinkUp, 500);
    assert_eq!(manager.state(), ProvisioningState::Connected);

    manager.reconnect(1_000);
    manager.on_network_event(&NetworkEvent::LinkFailed, 2_000);

    assert!(manager.is_portal_active());
    let actions = drain(&mut manager);
    assert_eq!(actions.last(), Some(&NetworkAction::StartPortal));
}

#[test]
fn idle_portal_reverts_to_station() {
    let mut store = stored("Home");
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    manager.on_network_event(&NetworkEvent::LinkUp, 100);
    manager.open_portal(1_000);
    let _ = drain(&mut manager);

    manager.tick(1_000 + 179_999);
    assert!(manager.is_portal_active());
    manager.tick(1_000 + 180_000);

    assert_eq!(manager.link_status(), LinkStatus::Connecting);
    let actions = drain(&mut manager);
    assert_eq!(actions[0], NetworkAction::StopPortal);
    assert!(matches!(actions[1], NetworkAction::ConnectStation(_)));
}

#[test]
fn portal_activity_postpones_timeout() {
    let mut store = MemoryCredentialStore::default();
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    manager.open_portal(0);

    let request = PortalRequest {
        method: Method::Get,
        path: String::try_from("/").unwrap(),
        body: String::new(),
    };
    let response = manager.handle_request(&request, &mut store, 100_000);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.body, portal::FORM_PAGE);

    manager.tick(200_000);
    assert!(manager.is_portal_active());
    manager.tick(280_000);
    assert_eq!(manager.state(), ProvisioningState::Unconfigured);
}

#[test]
fn save_persists_and_schedules_restart() {
    let mut store = MemoryCredentialStore::default();
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    manager.open_portal(0);

    let response = manager.handle_request(&post_save("ssid=Home&password=hunter2"), &mut store, 5_000);

    assert_eq!(response.status, Status::Ok);
    let saved = store.stored.as_ref().unwrap();
    assert_eq!(saved.ssid.as_str(), "Home");
    assert_eq!(saved.password.as_str(), "hunter2");
    assert!(manager.restart_scheduled());
    assert!(!manager.take_restart_due(6_499));
    assert!(manager.take_restart_due(6_500));
    assert!(!manager.take_restart_due(7_000));
}

#[test]
fn bad_forms_and_paths_get_error_statuses() {
    let mut store = MemoryCredentialStore::default();
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.open_portal(0);

    let empty = manager.handle_request(&post_save("ssid=&password=x"), &mut store, 1);
    assert_eq!(empty.status, Status::BadRequest);
    let missing = manager.handle_request(&post_save("password=x"), &mut store, 1);
    assert_eq!(missing.status, Status::BadRequest);

    let mut wrong_method = post_save("");
    wrong_method.method = Method::Get;
    assert_eq!(
        manager.handle_request(&wrong_method, &mut store, 1).status,
        Status::BadRequest
    );

    let mut unknown = post_save("");
    unknown.path = String::try_from("/admin").unwrap();
    assert_eq!(
        manager.handle_request(&unknown, &mut store, 1).status,
        Status::NotFound
    );
    assert!(store.stored.is_none());
    assert!(!manager.restart_scheduled());
}

#[test]
fn storage_failure_is_a_server_error() {
    let mut store = MemoryCredentialStore {
        stored: None,
        fail_save: true,
    };
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.open_portal(0);

    let response = manager.handle_request(&post_save("ssid=Home"), &mut store, 1);
    assert_eq!(response.status, Status::InternalError);
    assert!(!manager.restart_scheduled());
}

#[test]
fn missing_storage_boots_unconfigured_and_rejects_saves() {
    let mut store: Option<MemoryCredentialStore> = None;
    let mut manager = ProvisioningManager::new(ProvisioningConfig::default());
    manager.boot(&mut store, 0);
    assert_eq!(manager.state(), ProvisioningState::Unconfigured);

    manager.open_portal(0);
    drain(&mut manager);
    let response = manager.handle_request(&post_save("ssid=Home"), &mut store, 1);
    assert_eq!(response.status, Status::InternalError);
}
