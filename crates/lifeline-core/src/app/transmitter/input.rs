impl<IN, RL> TransmitterApp<IN, RL>
where
    IN: InputProvider,
    RL: RadioLink,
{
    /// Drains input until one event changes the screen.
    fn process_inputs(&mut self, now_ms: u64) {
        loop {
            match self.input.poll_event() {
                Ok(Some(event)) => {
                    if self.apply_input_event(event, now_ms) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    if !self.input_fault_logged {
                        warn!("tx-ui: input provider error");
                        self.input_fault_logged = true;
                    }
                    break;
                }
            }
        }
    }

    /// Returns true when the event caused a screen transition.
    fn apply_input_event(&mut self, event: InputEvent, now_ms: u64) -> bool {
        let Some(command) = dispatch(event, self.screen_kind()) else {
            return false;
        };
        debug!("tx-ui: {:?} -> {:?}", event, command);

        match self.ui {
            UiState::Menu { cursor, scroll } => self.apply_menu_command(cursor, scroll, command, now_ms),
            UiState::Confirm { alert } => self.apply_confirm_command(alert, command, now_ms),
            UiState::Result { alert, success: false, .. } => {
                self.apply_failure_command(alert, command, now_ms)
            }
            UiState::SystemInfo { return_cursor } => {
                self.enter_menu(return_cursor, now_ms);
                true
            }
            UiState::Manual {
                page,
                return_cursor,
            } => self.apply_manual_command(page, return_cursor, command, now_ms),
            UiState::Boot { .. } | UiState::Sending { .. } | UiState::Result { .. } => false,
        }
    }

    fn apply_menu_command(&mut self, cursor: u8, scroll: u8, command: Command, now_ms: u64) -> bool {
        match command {
            Command::Next => {
                let cursor = rotate_cw(cursor, ALERT_COUNT);
                self.ui = UiState::Menu {
                    cursor,
                    scroll: self.scroll_for(cursor, scroll),
                };
                self.start_transition(AnimationKind::SlideLeft, now_ms, ANIM_MENU_MS);
                self.pending_redraw = true;
                false
            }
            Command::Previous => {
                let cursor = rotate_ccw(cursor, ALERT_COUNT);
                self.ui = UiState::Menu {
                    cursor,
                    scroll: self.scroll_for(cursor, scroll),
                };
                self.start_transition(AnimationKind::SlideRight, now_ms, ANIM_MENU_MS);
                self.pending_redraw = true;
                false
            }
            Command::SelectHighlighted => self.try_enter_confirm(cursor, now_ms),
            Command::SelectIndex(index) => self.try_enter_confirm(index, now_ms),
            Command::OpenSystemInfo => {
                self.ui = UiState::SystemInfo {
                    return_cursor: cursor,
                };
                self.start_transition(AnimationKind::Fade, now_ms, ANIM_SCREEN_MS);
                self.pending_redraw = true;
                true
            }
            Command::OpenManual => {
                self.ui = UiState::Manual {
                    page: 0,
                    return_cursor: cursor,
                };
                self.start_transition(AnimationKind::Fade, now_ms, ANIM_SCREEN_MS);
                self.pending_redraw = true;
                true
            }
            _ => false,
        }
    }

    fn apply_confirm_command(&mut self, alert: AlertCode, command: Command, now_ms: u64) -> bool {
        match command {
            Command::Confirm => {
                if self.radio.is_none() {
                    warn!("tx-ui: confirm ignored, radio unavailable");
                    self.effects.push(Effect::Tone(TonePattern::SendFailed));
                    return false;
                }
                self.enter_sending(alert);
                true
            }
            Command::Cancel => {
                info!("tx-ui: cancelled alert={}", alert.descriptor().short_name);
                self.enter_menu(alert.index(), now_ms);
                true
            }
            _ => false,
        }
    }

    fn apply_failure_command(&mut self, alert: AlertCode, command: Command, now_ms: u64) -> bool {
        match command {
            Command::Retry if self.retry.can_retry() => {
                self.enter_sending(alert);
                true
            }
            Command::BackToMenu => {
                self.retry.abandon();
                self.enter_menu(alert.index(), now_ms);
                true
            }
            _ => false,
        }
    }

    fn apply_manual_command(
        &mut self,
        page: u8,
        return_cursor: u8,
        command: Command,
        now_ms: u64,
    ) -> bool {
        let last_page = (MANUAL_PAGES.len() - 1) as u8;
        match command {
            Command::PageNext if page < last_page => {
                self.ui = UiState::Manual {
                    page: page + 1,
                    return_cursor,
                };
                self.start_transition(AnimationKind::SlideLeft, now_ms, ANIM_MENU_MS);
                self.pending_redraw = true;
                false
            }
            Command::PagePrevious if page > 0 => {
                self.ui = UiState::Manual {
                    page: page - 1,
                    return_cursor,
                };
                self.start_transition(AnimationKind::SlideRight, now_ms, ANIM_MENU_MS);
                self.pending_redraw = true;
                false
            }
            Command::BackToMenu => {
                self.enter_menu(return_cursor, now_ms);
                true
            }
            _ => false,
        }
    }

    fn try_enter_confirm(&mut self, index: u8, now_ms: u64) -> bool {
        let Some(alert) = AlertCode::new(index) else {
            return false;
        };
        self.enter_confirm(alert, now_ms);
        true
    }
}
