impl<IN, PK, ST, NET> ReceiverApp<IN, PK, ST, NET>
where
    IN: InputProvider,
    PK: PacketSource,
    ST: CredentialStore,
    NET: NetworkLink,
{
    fn start(&mut self, now_ms: u64) {
        self.started = true;
        self.ui = UiState::Boot {
            until_ms: Some(now_ms + self.config.boot_ms),
        };
        self.provisioning.boot(&mut self.store, now_ms);
        self.pending_redraw = true;
    }

    fn poll_radio(&mut self, now_ms: u64) -> bool {
        let Some(source) = self.packets.as_mut() else {
            return false;
        };

        match source.poll_frame() {
            Ok(Some(frame)) => match packet::decode_frame(&frame.bytes, self.config.decode) {
                Ok(packet) => {
                    self.accept_packet(packet, frame.rssi, now_ms);
                    true
                }
                Err(err) => {
                    warn!("rx: dropped frame ({} bytes): {:?}", frame.bytes.len(), err);
                    false
                }
            },
            Ok(None) => false,
            Err(_) => {
                if !self.radio_fault_logged {
                    warn!("rx: packet source error");
                    self.radio_fault_logged = true;
                }
                false
            }
        }
    }

    /// Records, relays and shows a packet, whatever is currently on screen.
    fn accept_packet(&mut self, packet: Packet, rssi: i16, now_ms: u64) {
        let record = AlertRecord::from_packet(packet, rssi, now_ms);
        let descriptor = packet.descriptor();
        info!(
            "rx: alert id={} code={} ({}) rssi={}",
            packet.device_id,
            packet.alert_code.index(),
            descriptor.long_name,
            rssi
        );

        self.history.push(record);
        self.relay(&record);
        self.enter_alert(record, now_ms);
    }

    fn relay(&mut self, record: &AlertRecord) {
        if self.provisioning.link_status() != LinkStatus::Online {
            debug!("relay: offline, not forwarding id={}", record.device_id);
            return;
        }
        if self
            .network
            .relay_alert(DashboardPush::from_record(record))
            .is_err()
        {
            warn!("relay: could not queue dashboard push");
        }
    }

    fn process_network(&mut self, now_ms: u64) {
        loop {
            let event = match self.network.poll_event() {
                Ok(Some(event)) => event,
                Ok(None) => return,
                Err(_) => {
                    if !self.network_fault_logged {
                        warn!("rx: network link error");
                        self.network_fault_logged = true;
                    }
                    return;
                }
            };

            self.provisioning.on_network_event(&event, now_ms);
            match event {
                NetworkEvent::Request(request) => {
                    let response = self
                        .provisioning
                        .handle_request(&request, &mut self.store, now_ms);
                    if self.network.respond(response).is_err() {
                        warn!("portal: response dropped");
                    }
                    if self.provisioning.restart_scheduled() {
                        self.pending_redraw = true;
                    }
                }
                NetworkEvent::LinkUp | NetworkEvent::LinkFailed | NetworkEvent::LinkLost => {
                    self.pending_redraw = true;
                }
            }
        }
    }

    fn run_timers(&mut self, now_ms: u64) {
        match self.ui {
            UiState::Boot {
                until_ms: Some(until_ms),
            } if now_ms >= until_ms => self.enter_idle(now_ms),
            UiState::Alert { until_ms, .. } if now_ms >= until_ms => self.leave_alert(now_ms),
            UiState::Portal => {
                let remaining_s = self.portal_remaining_ms(now_ms).div_ceil(1_000) as u32;
                if remaining_s != self.last_portal_remaining_s {
                    self.last_portal_remaining_s = remaining_s;
                    self.pending_redraw = true;
                }
            }
            _ => {}
        }

        self.provisioning.tick(now_ms);
        self.poll_hold(now_ms);
        self.sync_portal_screen(now_ms);

        if self.provisioning.take_restart_due(now_ms) {
            info!("rx: restarting to apply new WiFi credentials");
            self.effects.push(Effect::Restart);
        }
    }

    /// Hands queued actions to the board in order. A rejected action stays
    /// at the head of the queue and is offered again on the next tick.
    fn flush_network_actions(&mut self) {
        while let Some(action) = self.provisioning.peek_action().cloned() {
            debug!("rx: network action {:?}", action);
            if self.network.apply(action).is_err() {
                if !self.network_backlogged {
                    warn!("rx: network busy, holding actions");
                    self.network_backlogged = true;
                }
                return;
            }
            let _ = self.provisioning.next_action();
            if self.network_backlogged {
                info!("rx: network accepted held actions");
                self.network_backlogged = false;
            }
        }
    }

    fn sync_portal_screen(&mut self, now_ms: u64) {
        let active = self.provisioning.is_portal_active();
        match self.ui {
            UiState::Idle if active => self.enter_portal(now_ms),
            UiState::Portal if !active => self.enter_idle(now_ms),
            _ => {}
        }
    }

    fn enter_idle(&mut self, now_ms: u64) {
        self.ui = UiState::Idle;
        self.start_transition(AnimationKind::Fade, now_ms, ANIM_SCREEN_MS);
        self.pending_redraw = true;
    }

    fn enter_portal(&mut self, now_ms: u64) {
        self.ui = UiState::Portal;
        self.last_portal_remaining_s = self.portal_remaining_ms(now_ms).div_ceil(1_000) as u32;
        self.start_transition(AnimationKind::SlideLeft, now_ms, ANIM_SCREEN_MS);
        self.pending_redraw = true;
    }

    fn enter_alert(&mut self, record: AlertRecord, now_ms: u64) {
        let priority = record.alert_code.descriptor().priority;
        self.ui = UiState::Alert {
            record,
            until_ms: now_ms + self.config.alert_display_ms,
        };
        self.effects
            .push(Effect::Tone(TonePattern::for_priority(priority)));
        self.start_transition(AnimationKind::Flash, now_ms, ANIM_ALERT_FLASH_MS);
        self.pending_redraw = true;
    }

    /// Back to whatever the alert interrupted.
    fn leave_alert(&mut self, now_ms: u64) {
        if self.provisioning.is_portal_active() {
            self.enter_portal(now_ms);
        } else {
            self.enter_idle(now_ms);
        }
    }
}
