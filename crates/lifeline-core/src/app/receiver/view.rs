impl<IN, PK, ST, NET> ReceiverApp<IN, PK, ST, NET>
where
    IN: InputProvider,
    PK: PacketSource,
    ST: CredentialStore,
    NET: NetworkLink,
{
    pub fn new(input: IN, packets: Option<PK>, store: ST, network: NET, config: ReceiverConfig) -> Self {
        if packets.is_none() {
            warn!("rx-ui: radio unavailable, reception disabled");
        }

        Self {
            input,
            packets,
            store,
            network,
            config,
            ui: UiState::Boot { until_ms: None },
            pending_redraw: true,
            transition: None,
            history: AlertHistory::new(),
            provisioning: ProvisioningManager::new(config.provisioning),
            hold: HoldDetector::new(config.hold_ms),
            last_hold_pct: None,
            last_portal_remaining_s: 0,
            effects: EffectQueue::new(),
            started: false,
            input_fault_logged: false,
            radio_fault_logged: false,
            network_fault_logged: false,
            network_backlogged: false,
        }
    }

    /// One pass of the receive loop: radio, then input, then network, then
    /// timers. At most one event-driven transition happens per call.
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        if !self.started {
            self.start(now_ms);
        }

        let mut transitioned = self.poll_radio(now_ms);
        if !transitioned {
            transitioned = self.process_inputs(now_ms);
        }
        if !transitioned {
            self.process_network(now_ms);
        }

        self.run_timers(now_ms);
        self.flush_network_actions();

        let rendered = self.take_redraw();
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
        let hold_pct = self.hold.progress_pct(now_ms);

        match self.ui {
            UiState::Boot { .. } => f(Screen::Boot {
                title: "LIFELINE RX",
                subtitle: "Base station",
                status: if self.packets.is_some() {
                    "LoRa listening"
                } else {
                    "RADIO UNAVAILABLE"
                },
            }),
            UiState::Idle => {
                let mut rows = [AlertRowView {
                    descriptor: crate::catalog::AlertCode::EMERGENCY.descriptor(),
                    device_id: 0,
                    rssi: 0,
                    age_ms: 0,
                }; HISTORY_CAPACITY];
                let mut count = 0usize;
                for record in self.history.iter().rev() {
                    rows[count] = AlertRowView {
                        descriptor: record.alert_code.descriptor(),
                        device_id: record.device_id,
                        rssi: record.rssi,
                        age_ms: now_ms.saturating_sub(record.received_at_ms),
                    };
                    count += 1;
                }

                f(Screen::Idle {
                    title: "LIFELINE RX",
                    recent: &rows[..count],
                    total_received: self.history.total_received(),
                    link: self.provisioning.link_status(),
                    radio_ok: self.packets.is_some(),
                    hold_pct,
                });
            }
            UiState::Alert { record, .. } => {
                let mut id_buf = [0u8; 8];
                let mut rssi_buf = [0u8; 12];
                f(Screen::Alert {
                    alert: record.alert_code.descriptor(),
                    device: device_label(record.device_id, &mut id_buf),
                    rssi: rssi_label(record.rssi, &mut rssi_buf),
                    link: self.provisioning.link_status(),
                    hold_pct,
                    animation: self.transition_frame(now_ms),
                });
            }
            UiState::Portal => f(Screen::Portal {
                ap_ssid: self.config.ap_ssid,
                address: self.config.portal_address,
                remaining_s: self.portal_remaining_ms(now_ms).div_ceil(1_000) as u32,
                saved: self.provisioning.restart_scheduled(),
                hold_pct,
            }),
        }
    }

    /// Next side effect for the board to play out.
    pub fn next_effect(&mut self) -> Option<Effect> {
        self.effects.pop()
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    pub fn provisioning(&self) -> &ProvisioningManager {
        &self.provisioning
    }

    pub fn link_status(&self) -> LinkStatus {
        self.provisioning.link_status()
    }

    /// Record currently on screen, if any.
    pub fn displayed_alert(&self) -> Option<AlertRecord> {
        match self.ui {
            UiState::Alert { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn screen_kind(&self) -> ScreenKind {
        match self.ui {
            UiState::Boot { .. } => ScreenKind::Boot,
            UiState::Idle => ScreenKind::Idle,
            UiState::Alert { .. } => ScreenKind::Alert,
            UiState::Portal => ScreenKind::Portal,
        }
    }

    fn portal_remaining_ms(&self, now_ms: u64) -> u64 {
        match self.provisioning.state() {
            ProvisioningState::PortalActive {
                last_activity_ms, ..
            } => (last_activity_ms + self.config.provisioning.portal_timeout_ms)
                .saturating_sub(now_ms),
            _ => 0,
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
