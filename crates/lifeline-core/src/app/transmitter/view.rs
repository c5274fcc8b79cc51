impl<IN, RL> TransmitterApp<IN, RL>
where
    IN: InputProvider,
    RL: RadioLink,
{
    pub fn new(input: IN, radio: Option<RL>, mut config: TransmitterConfig) -> Self {
        config.menu_page_size = config.menu_page_size.clamp(1, MAX_MENU_PAGE as u8);
        if radio.is_none() {
            warn!("tx-ui: radio unavailable, sending disabled");
        }

        Self {
            input,
            radio,
            config,
            ui: UiState::Boot { until_ms: None },
            pending_redraw: true,
            transition: None,
            retry: RetryController::new(),
            effects: EffectQueue::new(),
            started_ms: None,
            input_fault_logged: false,
        }
    }

    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        if self.started_ms.is_none() {
            self.started_ms = Some(now_ms);
            self.ui = UiState::Boot {
                until_ms: Some(now_ms + self.config.boot_ms),
            };
        }

        self.process_inputs(now_ms);

        let rendered = match self.ui {
            UiState::Boot { .. } => self.tick_boot(now_ms),
            UiState::Sending { .. } => self.tick_sending(now_ms),
            UiState::Result { .. } => self.tick_result(now_ms),
            UiState::Menu { .. }
            | UiState::Confirm { .. }
            | UiState::SystemInfo { .. }
            | UiState::Manual { .. } => self.take_redraw(),
        };

        if self.transition_frame(now_ms).is_some() {
            TickResult::RenderRequested
        } else {
            rendered
        }
    }

    pub fn with_screen<F>(&self, now_ms: u64, f: F)
    where
        F: FnOnce(Screen<'_>),
    {
        let animation = self.transition_frame(now_ms);

        match self.ui {
            UiState::Boot { .. } => {
                let mut id_buf = [0u8; 8];
                let status = if self.radio.is_some() {
                    "LoRa ready"
                } else {
                    "RADIO UNAVAILABLE"
                };
                f(Screen::Boot {
                    title: "LIFELINE TX",
                    subtitle: device_label(self.config.device_id, &mut id_buf),
                    status,
                });
            }
            UiState::Menu { cursor, scroll } => {
                let mut items = [MenuItemView::default(); MAX_MENU_PAGE];
                let page = self.config.menu_page_size as usize;
                let mut count = 0usize;
                for idx in scroll..ALERT_COUNT.min(scroll.saturating_add(page as u8)) {
                    if let Some(code) = AlertCode::new(idx) {
                        items[count] = MenuItemView {
                            code,
                            descriptor: code.descriptor(),
                        };
                        count += 1;
                    }
                }

                let mut position_buf = [0u8; 8];
                f(Screen::Menu {
                    title: "SELECT ALERT",
                    items: &items[..count],
                    cursor: cursor.saturating_sub(scroll) as usize,
                    position: fraction_label(cursor as u16 + 1, ALERT_COUNT as u16, &mut position_buf),
                    radio_ok: self.radio.is_some(),
                    animation,
                });
            }
            UiState::Confirm { alert } => {
                let mut id_buf = [0u8; 8];
                f(Screen::Confirm {
                    alert: alert.descriptor(),
                    device: device_label(self.config.device_id, &mut id_buf),
                    radio_ok: self.radio.is_some(),
                    animation,
                });
            }
            UiState::Sending { alert } => f(Screen::Sending {
                alert: alert.descriptor(),
                attempt: self.retry.attempts_made() + 1,
                max_attempts: MAX_RETRY_ATTEMPTS,
            }),
            UiState::Result { alert, success, .. } => f(Screen::TransmitResult {
                alert: alert.descriptor(),
                success,
                attempt: self.retry.attempts_made(),
                max_attempts: MAX_RETRY_ATTEMPTS,
                can_retry: !success && self.retry.can_retry(),
                animation,
            }),
            UiState::SystemInfo { .. } => f(Screen::SystemInfo {
                stats: TransmitterStats {
                    device_id: self.config.device_id,
                    radio_ok: self.radio.is_some(),
                    total_transmissions: self.retry.total_transmissions(),
                    successful_transmissions: self.retry.successful_transmissions(),
                    profile: self.config.profile,
                    uptime_ms: now_ms.saturating_sub(self.started_ms.unwrap_or(now_ms)),
                },
            }),
            UiState::Manual { page, .. } => {
                let mut position_buf = [0u8; 8];
                f(Screen::Manual {
                    title: "MANUAL",
                    lines: MANUAL_PAGES[page as usize % MANUAL_PAGES.len()],
                    position: fraction_label(page as u16 + 1, MANUAL_PAGES.len() as u16, &mut position_buf),
                });
            }
        }
    }

    /// Next side effect for the board to play out.
    pub fn next_effect(&mut self) -> Option<Effect> {
        self.effects.pop()
    }

    pub fn retry_state(&self) -> &RetryController {
        &self.retry
    }

    pub fn radio_available(&self) -> bool {
        self.radio.is_some()
    }

    pub fn config(&self) -> &TransmitterConfig {
        &self.config
    }

    pub fn screen_kind(&self) -> ScreenKind {
        match self.ui {
            UiState::Boot { .. } => ScreenKind::Boot,
            UiState::Menu { .. } => ScreenKind::Menu,
            UiState::Confirm { .. } => ScreenKind::Confirm,
            UiState::Sending { .. } => ScreenKind::Sending,
            UiState::Result { success: true, .. } => ScreenKind::ResultSuccess,
            UiState::Result { success: false, .. } => ScreenKind::ResultFailure {
                can_retry: self.retry.can_retry(),
            },
            UiState::SystemInfo { .. } => ScreenKind::SystemInfo,
            UiState::Manual { .. } => ScreenKind::Manual,
        }
    }

    /// Highlighted entry while the menu is showing.
    pub fn menu_cursor(&self) -> Option<u8> {
        match self.ui {
            UiState::Menu { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    pub fn menu_scroll(&self) -> Option<u8> {
        match self.ui {
            UiState::Menu { scroll, .. } => Some(scroll),
            _ => None,
        }
    }

    fn take_redraw(&mut self) -> TickResult {
        if self.pending_redraw {
            self.pending_redraw = false;
            TickResult::RenderRequested
        } else {
            TickResult::NoRender
        }
    }

    fn start_transition(&mut self, kind: AnimationKind, now_ms: u64, duration_ms: u16) {
        self.transition = Some(AnimationSpec::new(kind, now_ms, duration_ms));
    }

    fn transition_frame(&self, now_ms: u64) -> Option<crate::render::AnimationFrame> {
        self.transition.and_then(|anim| anim.frame(now_ms))
    }
}
