//! Collaborator adapter that only logs.
//!
//! Stands in for the LPM, FrontDoor, network service, audio path and
//! timers when the controller runs without them (the `productctl` binary,
//! bench bring-up).  Every port call is logged at INFO; the last requested
//! system state is kept so a driver can echo the matching power status.

use log::info;

use crate::app::ports::{
    AudioPort, FrontDoorPort, IntentPort, KeyEvent, KeyState, LpmPort, NetworkServicePort,
    TimerPort,
};
use crate::product::events::{AdaptIqAction, DspImage, Intent, PairingAction, SystemState};

/// Default key map: `(key_id, intent)`, acted on at press.
pub const DEFAULT_KEY_MAP: &[(u32, Intent)] = &[
    (1, Intent::PowerToggle),
    (2, Intent::VolumeUp),
    (3, Intent::VolumeDown),
    (4, Intent::MuteToggle),
    (5, Intent::PlayPause),
    (6, Intent::AuxIn),
    (7, Intent::BluetoothPairing),
    (8, Intent::VoiceActivate),
    (9, Intent::SpeakerPairing(PairingAction::Start)),
    (10, Intent::AudioModeToggle),
];

#[derive(Debug)]
pub struct LogPorts {
    key_map: Vec<(u32, Intent)>,
    last_system_state: Option<SystemState>,
    timer_secs: Option<u32>,
}

impl LogPorts {
    pub fn new() -> Self {
        Self::with_key_map(DEFAULT_KEY_MAP.to_vec())
    }

    pub fn with_key_map(key_map: Vec<(u32, Intent)>) -> Self {
        Self {
            key_map,
            last_system_state: None,
            timer_secs: None,
        }
    }

    pub fn last_system_state(&self) -> Option<SystemState> {
        self.last_system_state
    }

    /// Seconds of the running inactivity timer, if any.
    pub fn timer_secs(&self) -> Option<u32> {
        self.timer_secs
    }
}

impl Default for LogPorts {
    fn default() -> Self {
        Self::new()
    }
}

// ── LpmPort ───────────────────────────────────────────────────

impl LpmPort for LogPorts {
    fn connect(&mut self) {
        info!("LPM | connect");
    }

    fn set_system_state(&mut self, state: SystemState) {
        info!("LPM | system state {state:?}");
        self.last_system_state = Some(state);
    }

    fn set_amp(&mut self, powered: bool, muted: bool) {
        info!("LPM | amp powered={powered} muted={muted}");
    }

    fn reboot(&mut self) {
        info!("LPM | reboot requested");
    }

    fn set_power_macro(&mut self, enabled: bool) {
        info!("LPM | power macro {}", if enabled { "on" } else { "off" });
    }
}

// ── FrontDoorPort ─────────────────────────────────────────────

impl FrontDoorPort for LogPorts {
    fn set_network_access_point(&mut self, enabled: bool) {
        info!("FRONTDOOR | access point {enabled}");
    }

    fn set_ble_advertising(&mut self, enabled: bool) {
        info!("FRONTDOOR | BLE advertising {enabled}");
    }

    fn set_remote_pairing(&mut self, enabled: bool) {
        info!("FRONTDOOR | remote pairing {enabled}");
    }
}

// ── NetworkServicePort ────────────────────────────────────────

impl NetworkServicePort for LogPorts {
    fn enable_wifi_setup_mode(&mut self) {
        info!("NETWORK | WiFi setup mode");
    }

    fn enable_wifi_auto_switching_mode(&mut self) {
        info!("NETWORK | WiFi auto-switching mode");
    }
}

// ── IntentPort ────────────────────────────────────────────────

impl IntentPort for LogPorts {
    fn execute_intent(&mut self, intent: Intent) {
        info!("INTENT | execute {intent:?}");
    }

    fn translate_key(&self, key: &KeyEvent) -> Option<Intent> {
        if key.state != KeyState::Press {
            return None;
        }
        self.key_map
            .iter()
            .find(|(id, _)| *id == key.key_id)
            .map(|(_, intent)| *intent)
    }
}

// ── AudioPort ─────────────────────────────────────────────────

impl AudioPort for LogPorts {
    fn play_chime(&mut self) {
        info!("AUDIO | chime");
    }

    fn stop_playback(&mut self) {
        info!("AUDIO | stop playback");
    }

    fn boot_dsp_image(&mut self, image: DspImage) {
        info!("AUDIO | boot DSP image {image:?}");
    }

    fn adaptiq_control(&mut self, action: AdaptIqAction) {
        info!("AUDIO | AdaptIQ {action:?}");
    }

    fn set_voice_enabled(&mut self, enabled: bool) {
        info!("AUDIO | voice {}", if enabled { "on" } else { "off" });
    }

    fn play_accessory_tones(&mut self, sub_valid: bool, rear_valid: bool) {
        info!("AUDIO | accessory tones sub={sub_valid} rear={rear_valid}");
    }

    fn set_volume(&mut self, volume: u8) {
        info!("AUDIO | volume {volume}");
    }

    fn set_source_select_allowed(&mut self, allowed: bool) {
        info!("AUDIO | source select allowed={allowed}");
    }
}

// ── TimerPort ─────────────────────────────────────────────────

impl TimerPort for LogPorts {
    fn start_inactivity_timer(&mut self, secs: u32) {
        info!("TIMER | inactivity {secs}s");
        self.timer_secs = Some(secs);
    }

    fn stop_inactivity_timer(&mut self) {
        info!("TIMER | stopped");
        self.timer_secs = None;
    }
}
