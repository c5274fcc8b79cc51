impl<IN, PK, ST, NET> ReceiverApp<IN, PK, ST, NET>
where
    IN: InputProvider,
    PK: PacketSource,
    ST: CredentialStore,
    NET: NetworkLink,
{
    /// Drains input until one event changes the screen.
    fn process_inputs(&mut self, now_ms: u64) -> bool {
        loop {
            match self.input.poll_event() {
                Ok(Some(event)) => {
                    if self.apply_input_event(event, now_ms) {
                        return true;
                    }
                }
                Ok(None) => return false,
                Err(_) => {
                    if !self.input_fault_logged {
                        warn!("rx-ui: input provider error");
                        self.input_fault_logged = true;
                    }
                    return false;
                }
            }
        }
    }

    fn apply_input_event(&mut self, event: InputEvent, now_ms: u64) -> bool {
        let Some(command) = dispatch(event, self.screen_kind()) else {
            return false;
        };
        debug!("rx-ui: {:?} -> {:?}", event, command);

        match command {
            Command::InjectPacket(packet) => {
                info!("rx-ui: simulated packet id={}", packet.device_id);
                self.accept_packet(packet, SIMULATED_RSSI, now_ms);
                true
            }
            Command::DismissAlert => {
                self.leave_alert(now_ms);
                true
            }
            Command::ReconnectWifi => {
                info!("rx-ui: operator reconnect");
                self.provisioning.reconnect(now_ms);
                self.pending_redraw = true;
                false
            }
            Command::PortalButton(edge) => self.apply_button_edge(edge, now_ms),
            _ => false,
        }
    }

    fn apply_button_edge(&mut self, edge: ButtonEdge, now_ms: u64) -> bool {
        match self.hold.on_edge(edge, now_ms) {
            HoldEvent::Started => {
                debug!("rx-ui: portal button held");
                self.last_hold_pct = Some(0);
                self.pending_redraw = true;
            }
            HoldEvent::Cancelled => {
                debug!("rx-ui: portal hold released early");
                self.last_hold_pct = None;
                self.pending_redraw = true;
            }
            HoldEvent::Idle | HoldEvent::Progress { .. } | HoldEvent::Completed => {}
        }
        false
    }

    /// Redraws the hold overlay in 10% steps and toggles the portal once the
    /// hold completes.
    fn poll_hold(&mut self, now_ms: u64) {
        match self.hold.poll(now_ms) {
            HoldEvent::Progress { pct } => {
                let bucket = pct / 10;
                if self.last_hold_pct.map(|last| last / 10) != Some(bucket) {
                    self.last_hold_pct = Some(pct);
                    self.pending_redraw = true;
                }
            }
            HoldEvent::Completed => {
                self.last_hold_pct = None;
                self.pending_redraw = true;
                if self.provisioning.is_portal_active() {
                    info!("rx-ui: long press, closing portal");
                    self.provisioning.close_portal(now_ms);
                } else {
                    info!("rx-ui: long press, opening portal");
                    self.provisioning.open_portal(now_ms);
                    self.effects.push(Effect::Tone(TonePattern::PortalOpened));
                    if matches!(self.ui, UiState::Alert { .. }) {
                        self.enter_portal(now_ms);
                    }
                }
            }
            HoldEvent::Idle | HoldEvent::Started | HoldEvent::Cancelled => {}
        }
    }
}
