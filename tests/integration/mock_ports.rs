//! Mock collaborator ports for integration tests.
//!
//! Records every port call so tests can assert on the full command history
//! without a real LPM, audio path or network service.

use productctl::app::events::ControllerEvent;
use productctl::app::ports::{
    AudioPort, EventSink, FrontDoorPort, IntentPort, KeyEvent, KeyState, LpmPort,
    NetworkServicePort, TimerPort,
};
use productctl::product::events::{AdaptIqAction, DspImage, Intent, SystemState};

// ── Port call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    SystemState(SystemState),
    Amp { powered: bool, muted: bool },
    Reboot,
    PowerMacro(bool),
    AccessPoint(bool),
    BleAdvertising(bool),
    RemotePairing(bool),
    WifiSetupMode,
    WifiAutoSwitching,
    Execute(Intent),
    Chime,
    StopPlayback,
    BootDsp(DspImage),
    AdaptIq(AdaptIqAction),
    Voice(bool),
    AccessoryTones { sub: bool, rear: bool },
    Volume(u8),
    SourceSelect(bool),
    StartTimer(u32),
    StopTimer,
}

// ── MockPorts ─────────────────────────────────────────────────

pub struct MockPorts {
    pub calls: Vec<Call>,
    pub key_map: Vec<(u32, Intent)>,
}

#[allow(dead_code)]
impl MockPorts {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            key_map: vec![(1, Intent::PowerToggle), (5, Intent::PlayPause)],
        }
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn made(&self, call: &Call) -> bool {
        self.calls.contains(call)
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn last_system_state(&self) -> Option<SystemState> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::SystemState(s) => Some(*s),
            _ => None,
        })
    }
}

impl Default for MockPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl LpmPort for MockPorts {
    fn connect(&mut self) {
        self.calls.push(Call::Connect);
    }

    fn set_system_state(&mut self, state: SystemState) {
        self.calls.push(Call::SystemState(state));
    }

    fn set_amp(&mut self, powered: bool, muted: bool) {
        self.calls.push(Call::Amp { powered, muted });
    }

    fn reboot(&mut self) {
        self.calls.push(Call::Reboot);
    }

    fn set_power_macro(&mut self, enabled: bool) {
        self.calls.push(Call::PowerMacro(enabled));
    }
}

impl FrontDoorPort for MockPorts {
    fn set_network_access_point(&mut self, enabled: bool) {
        self.calls.push(Call::AccessPoint(enabled));
    }

    fn set_ble_advertising(&mut self, enabled: bool) {
        self.calls.push(Call::BleAdvertising(enabled));
    }

    fn set_remote_pairing(&mut self, enabled: bool) {
        self.calls.push(Call::RemotePairing(enabled));
    }
}

impl NetworkServicePort for MockPorts {
    fn enable_wifi_setup_mode(&mut self) {
        self.calls.push(Call::WifiSetupMode);
    }

    fn enable_wifi_auto_switching_mode(&mut self) {
        self.calls.push(Call::WifiAutoSwitching);
    }
}

impl IntentPort for MockPorts {
    fn execute_intent(&mut self, intent: Intent) {
        self.calls.push(Call::Execute(intent));
    }

    fn translate_key(&self, key: &KeyEvent) -> Option<Intent> {
        if key.state != KeyState::Press {
            return None;
        }
        self.key_map
            .iter()
            .find(|(id, _)| *id == key.key_id)
            .map(|(_, i)| *i)
    }
}

impl AudioPort for MockPorts {
    fn play_chime(&mut self) {
        self.calls.push(Call::Chime);
    }

    fn stop_playback(&mut self) {
        self.calls.push(Call::StopPlayback);
    }

    fn boot_dsp_image(&mut self, image: DspImage) {
        self.calls.push(Call::BootDsp(image));
    }

    fn adaptiq_control(&mut self, action: AdaptIqAction) {
        self.calls.push(Call::AdaptIq(action));
    }

    fn set_voice_enabled(&mut self, enabled: bool) {
        self.calls.push(Call::Voice(enabled));
    }

    fn play_accessory_tones(&mut self, sub_valid: bool, rear_valid: bool) {
        self.calls.push(Call::AccessoryTones {
            sub: sub_valid,
            rear: rear_valid,
        });
    }

    fn set_volume(&mut self, volume: u8) {
        self.calls.push(Call::Volume(volume));
    }

    fn set_source_select_allowed(&mut self, allowed: bool) {
        self.calls.push(Call::SourceSelect(allowed));
    }
}

impl TimerPort for MockPorts {
    fn start_inactivity_timer(&mut self, secs: u32) {
        self.calls.push(Call::StartTimer(secs));
    }

    fn stop_inactivity_timer(&mut self) {
        self.calls.push(Call::StopTimer);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that records everything emitted.
pub struct RecordingSink {
    pub events: Vec<ControllerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn transitions(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::StateChanged { from, to } => {
                    Some((from.to_string(), to.to_string()))
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(event.clone());
    }
}
