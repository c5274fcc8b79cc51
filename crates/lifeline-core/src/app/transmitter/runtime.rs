impl<IN, RL> TransmitterApp<IN, RL>
where
    IN: InputProvider,
    RL: RadioLink,
{
    fn tick_boot(&mut self, now_ms: u64) -> TickResult {
        if self.pending_redraw {
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }

        match self.ui {
            UiState::Boot {
                until_ms: Some(until_ms),
            } if now_ms >= until_ms => {
                self.enter_menu(0, now_ms);
                self.take_redraw()
            }
            _ => TickResult::NoRender,
        }
    }

    /// The sending screen is drawn first; the blocking transmit happens on
    /// the following tick.
    fn tick_sending(&mut self, now_ms: u64) -> TickResult {
        if self.pending_redraw {
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }

        let UiState::Sending { alert } = self.ui else {
            return TickResult::NoRender;
        };

        let succeeded = match self.radio.as_mut() {
            Some(radio) => self.retry.attempt(radio, self.config.device_id, alert),
            None => false,
        };
        self.enter_result(alert, succeeded, now_ms);
        self.take_redraw()
    }

    fn tick_result(&mut self, now_ms: u64) -> TickResult {
        if self.pending_redraw {
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }

        match self.ui {
            UiState::Result {
                alert,
                success: true,
                since_ms,
            } if now_ms.saturating_sub(since_ms) >= self.config.success_hold_ms => {
                self.retry.begin();
                self.enter_menu(alert.index(), now_ms);
                self.take_redraw()
            }
            _ => TickResult::NoRender,
        }
    }

    fn enter_menu(&mut self, cursor: u8, now_ms: u64) {
        let cursor = cursor.min(ALERT_COUNT - 1);
        let page = self.config.menu_page_size;
        let scroll = cursor.saturating_sub(page - 1).min(ALERT_COUNT.saturating_sub(page));
        self.ui = UiState::Menu { cursor, scroll };
        self.start_transition(AnimationKind::SlideRight, now_ms, ANIM_MENU_MS);
        self.pending_redraw = true;
    }

    fn enter_confirm(&mut self, alert: AlertCode, now_ms: u64) {
        self.retry.begin();
        debug!("tx-ui: confirm alert={}", alert.descriptor().long_name);
        self.ui = UiState::Confirm { alert };
        self.start_transition(AnimationKind::SlideLeft, now_ms, ANIM_SCREEN_MS);
        self.pending_redraw = true;
    }

    fn enter_sending(&mut self, alert: AlertCode) {
        let descriptor = alert.descriptor();
        info!(
            "tx-ui: sending alert={} attempt={}/{}",
            descriptor.short_name,
            self.retry.attempts_made() + 1,
            MAX_RETRY_ATTEMPTS
        );
        self.ui = UiState::Sending { alert };
        self.effects
            .push(Effect::Tone(TonePattern::for_priority(descriptor.priority)));
        self.transition = None;
        self.pending_redraw = true;
    }

    fn enter_result(&mut self, alert: AlertCode, success: bool, now_ms: u64) {
        self.ui = UiState::Result {
            alert,
            success,
            since_ms: now_ms,
        };
        self.effects.push(Effect::Tone(if success {
            TonePattern::SendOk
        } else {
            TonePattern::SendFailed
        }));
        self.start_transition(AnimationKind::Fade, now_ms, ANIM_SCREEN_MS);
        self.pending_redraw = true;
    }

    /// Keeps `cursor` inside a page-sized window, snapping on wrap-around.
    fn scroll_for(&self, cursor: u8, scroll: u8) -> u8 {
        let page = self.config.menu_page_size;
        let max_scroll = ALERT_COUNT.saturating_sub(page);
        let scroll = if cursor < scroll {
            cursor
        } else if cursor >= scroll.saturating_add(page) {
            cursor + 1 - page
        } else {
            scroll
        };
        scroll.min(max_scroll)
    }
}
