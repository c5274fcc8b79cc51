use std::{cell::RefCell, collections::VecDeque, rc::Rc, string::String, vec::Vec};

use super::*;
use crate::input::Key;

#[derive(Clone, Default)]
struct ScriptedInput {
    events: Rc<RefCell<VecDeque<InputEvent>>>,
}

impl ScriptedInput {
    fn press(&self, key: Key) {
        self.events.borrow_mut().push_back(InputEvent::Key(key));
    }

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
struct FakeRadio {
    fail: Rc<RefCell<bool>>,
    sent: Rc<RefCell<Vec<String>>>,
}

impl RadioLink for FakeRadio {
    type Error = ();

    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        self.sent
            .borrow_mut()
            .push(String::from_utf8_lossy(payload).into_owned());
        if *self.fail.borrow() { Err(()) } else { Ok(()) }
    }
}

fn config() -> TransmitterConfig {
    TransmitterConfig {
        device_id: 3,
        ..TransmitterConfig::default()
    }
}

/// Boots the app and lands on the menu at t=2000.
fn booted(radio: Option<FakeRadio>) -> (TransmitterApp<ScriptedInput, FakeRadio>, ScriptedInput) {
    let input = ScriptedInput::default();
    let mut app = TransmitterApp::new(input.clone(), radio, config());
    assert_eq!(app.tick(0), TickResult::RenderRequested);
    let _ = app.tick(1_999);
    assert_eq!(app.screen_kind(), ScreenKind::Boot);
    assert_eq!(app.tick(2_000), TickResult::RenderRequested);
    assert_eq!(app.screen_kind(), ScreenKind::Menu);
    (app, input)
}

fn drain_effects(app: &mut TransmitterApp<ScriptedInput, FakeRadio>) -> Vec<Effect> {
    core::iter::from_fn(|| app.next_effect()).collect()
}

#[test]
fn happy_path_sends_once_and_returns_to_menu() {
    let radio = FakeRadio::default();
    let (mut app, input) = booted(Some(radio.clone()));

    input.press(Key::Digit(1));
    let _ = app.tick(2_100);
    assert_eq!(app.screen_kind(), ScreenKind::Confirm);

    input.press(Key::Hash);
    assert_eq!(app.tick(2_200), TickResult::RenderRequested);
    assert_eq!(app.screen_kind(), ScreenKind::Sending);
    assert!(radio.sent.borrow().is_empty());

    let _ = app.tick(2_300);
    assert_eq!(app.screen_kind(), ScreenKind::ResultSuccess);
    assert_eq!(*radio.sent.borrow(), ["TX003,A"]);
    assert_eq!(app.retry_state().successful_transmissions(), 1);

    let _ = app.tick(4_799);
    assert_eq!(app.screen_kind(), ScreenKind::ResultSuccess);
    let _ = app.tick(4_800);
    assert_eq!(app.screen_kind(), ScreenKind::Menu);
    assert_eq!(app.menu_cursor(), Some(0));

    assert_eq!(
        drain_effects(&mut app),
        [
            Effect::Tone(TonePattern::Critical),
            Effect::Tone(TonePattern::SendOk)
        ]
    );
}

#[test]
fn menu_wraps_in_both_directions_and_keeps_cursor_visible() {
    let (mut app, input) = booted(Some(FakeRadio::default()));

    input.press(Key::A);
    let _ = app.tick(2_100);
    assert_eq!(app.menu_cursor(), Some(14));
    assert_eq!(app.menu_scroll(), Some(10));

    let mut visible = Vec::new();
    app.with_screen(2_100, |screen| {
        if let Screen::Menu { items, cursor, .. } = screen {
            visible = items.iter().map(|item| item.code.index()).collect();
            assert_eq!(cursor, 4);
        }
    });
    assert_eq!(visible, [10, 11, 12, 13, 14]);

    input.press(Key::B);
    let _ = app.tick(2_200);
    assert_eq!(app.menu_cursor(), Some(0));
    assert_eq!(app.menu_scroll(), Some(0));
}

#[test]
fn zero_key_selects_tenth_alert_and_shortcuts_select_directly() {
    let (mut app, input) = booted(Some(FakeRadio::default()));

    input.press(Key::Digit(0));
    let _ = app.tick(2_100);
    let mut selected = None;
    app.with_screen(2_100, |screen| {
        if let Screen::Confirm { alert, .. } = screen {
            selected = Some(alert.code);
        }
    });
    assert_eq!(selected, AlertCode::new(9));

    input.press(Key::Star);
    let _ = app.tick(2_200);
    assert_eq!(app.menu_cursor(), Some(9));

    input.push(InputEvent::Shortcut(AlertCode::OTHER));
    let _ = app.tick(2_300);
    assert_eq!(app.screen_kind(), ScreenKind::Confirm);
}

#[test]
fn cancel_from_confirm_never_transmits() {
    let radio = FakeRadio::default();
    let (mut app, input) = booted(Some(radio.clone()));

    input.press(Key::Digit(3));
    let _ = app.tick(2_100);
    input.press(Key::Star);
    let _ = app.tick(2_200);

    assert_eq!(app.screen_kind(), ScreenKind::Menu);
    assert!(radio.sent.borrow().is_empty());
    assert_eq!(app.retry_state().total_transmissions(), 0);
}

#[test]
fn failed_sends_allow_bounded_retries() {
    let radio = FakeRadio::default();
    *radio.fail.borrow_mut() = true;
    let (mut app, input) = booted(Some(radio.clone()));

    input.press(Key::Digit(2));
    let _ = app.tick(2_100);
    input.press(Key::Hash);
    let _ = app.tick(2_200);
    let _ = app.tick(2_300);
    assert_eq!(
        app.screen_kind(),
        ScreenKind::ResultFailure { can_retry: true }
    );

    // Failures never time out back to the menu.
    let _ = app.tick(60_000);
    assert_eq!(
        app.screen_kind(),
        ScreenKind::ResultFailure { can_retry: true }
    );

    for now in [60_100, 60_300] {
        input.press(Key::Hash);
        let _ = app.tick(now);
        assert_eq!(app.screen_kind(), ScreenKind::Sending);
        let _ = app.tick(now + 100);
    }
    assert_eq!(
        app.screen_kind(),
        ScreenKind::ResultFailure { can_retry: false }
    );
    assert_eq!(radio.sent.borrow().len(), 3);

    input.press(Key::Hash);
    let _ = app.tick(61_000);
    assert_eq!(
        app.screen_kind(),
        ScreenKind::ResultFailure { can_retry: false }
    );

    input.press(Key::Star);
    let _ = app.tick(61_100);
    assert_eq!(app.screen_kind(), ScreenKind::Menu);
    assert_eq!(app.retry_state().attempts_made(), 0);
    assert_eq!(app.retry_state().total_transmissions(), 3);
    assert_eq!(app.retry_state().successful_transmissions(), 0);
}

#[test]
fn missing_radio_keeps_confirm_screen() {
    let (mut app, input) = booted(None);
    assert!(!app.radio_available());

    input.press(Key::Digit(1));
    let _ = app.tick(2_100);
    input.press(Key::Hash);
    let _ = app.tick(2_200);

    assert_eq!(app.screen_kind(), ScreenKind::Confirm);
    assert_eq!(
        drain_effects(&mut app),
        [Effect::Tone(TonePattern::SendFailed)]
    );

    input.press(Key::Star);
    input.press(Key::C);
    let _ = app.tick(2_300);
    let _ = app.tick(2_400);
    let mut radio_ok = None;
    app.with_screen(2_400, |screen| {
        if let Screen::SystemInfo { stats } = screen {
            radio_ok = Some(stats.radio_ok);
        }
    });
    assert_eq!(radio_ok, Some(false));
}

#[test]
fn only_one_transition_per_tick() {
    let radio = FakeRadio::default();
    let (mut app, input) = booted(Some(radio.clone()));

    input.press(Key::Digit(1));
    input.press(Key::Hash);
    let _ = app.tick(2_100);
    assert_eq!(app.screen_kind(), ScreenKind::Confirm);

    let _ = app.tick(2_200);
    assert_eq!(app.screen_kind(), ScreenKind::Sending);
}

#[test]
fn manual_pages_are_bounded_and_system_info_returns_on_any_key() {
    let (mut app, input) = booted(Some(FakeRadio::default()));

    input.press(Key::D);
    let _ = app.tick(2_100);
    assert_eq!(app.screen_kind(), ScreenKind::Manual);

    for _ in 0..6 {
        input.press(Key::B);
    }
    let _ = app.tick(2_200);
    let mut position = String::new();
    app.with_screen(2_200, |screen| {
        if let Screen::Manual { position: label, .. } = screen {
            position = label.into();
        }
    });
    assert_eq!(position, "4/4");

    input.press(Key::Star);
    let _ = app.tick(2_300);
    input.press(Key::C);
    let _ = app.tick(2_400);
    assert_eq!(app.screen_kind(), ScreenKind::SystemInfo);
    input.press(Key::Digit(7));
    let _ = app.tick(2_500);
    assert_eq!(app.screen_kind(), ScreenKind::Menu);
}
