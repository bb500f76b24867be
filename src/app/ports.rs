//! Port traits: the hexagonal boundary between the controller and its
//! collaborators.
//!
//! ```text
//!   Collaborator adapter ──▶ Port trait ──▶ ProductController (domain)
//! ```
//!
//! Every call the state machine makes into the outside world goes through
//! one of these traits.  All of them are fire-and-forget: results come back
//! later as events posted to the controller mailbox, never as return values.
//! One hardware handle implements all of them (see [`Collaborators`]) so the
//! context can hold a single `H`.

use crate::product::events::{AdaptIqAction, DspImage, Intent, SystemState};

use super::events::ControllerEvent;

// ───────────────────────────────────────────────────────────────
// LPM port (low-power microcontroller)
// ───────────────────────────────────────────────────────────────

/// Power sequencing and amplifier control on the LPM.
pub trait LpmPort {
    /// Open the IPC link.  The outcome arrives as
    /// [`ControllerMsg::LpmConnected`](super::mailbox::ControllerMsg::LpmConnected).
    fn connect(&mut self);

    /// Request a system power state.
    fn set_system_state(&mut self, state: SystemState);

    /// Power and mute the amplifier.
    fn set_amp(&mut self, powered: bool, muted: bool);

    /// Ask the LPM to reboot the whole system.
    fn reboot(&mut self);

    /// Run or cancel the power-on macro for attached devices.
    fn set_power_macro(&mut self, enabled: bool);
}

// ───────────────────────────────────────────────────────────────
// FrontDoor port (network API gateway)
// ───────────────────────────────────────────────────────────────

/// Toggles exposed by the FrontDoor utility.
pub trait FrontDoorPort {
    fn set_network_access_point(&mut self, enabled: bool);

    fn set_ble_advertising(&mut self, enabled: bool);

    /// Accept remote-control pairing requests.
    fn set_remote_pairing(&mut self, enabled: bool);
}

// ───────────────────────────────────────────────────────────────
// Network service port
// ───────────────────────────────────────────────────────────────

pub trait NetworkServicePort {
    /// Bring WiFi up in setup (access point) mode.
    fn enable_wifi_setup_mode(&mut self);

    /// Return WiFi to normal profile auto-switching.
    fn enable_wifi_auto_switching_mode(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Intent port (key handler + intent executor)
// ───────────────────────────────────────────────────────────────

/// Where a key event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Console,
    Capsense,
    Ir,
    Rf,
    Cec,
    Network,
}

/// Key transition reported by the LPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Press,
    Release,
}

/// A raw key event as delivered by the LPM key callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub origin: KeyOrigin,
    pub state: KeyState,
    pub key_id: u32,
}

pub trait IntentPort {
    /// Carry out an intent the state machine decided to act on.
    fn execute_intent(&mut self, intent: Intent);

    /// Translate a raw key event through the product key map.
    fn translate_key(&self, key: &KeyEvent) -> Option<Intent>;
}

// ───────────────────────────────────────────────────────────────
// Audio port
// ───────────────────────────────────────────────────────────────

/// Audio path, DSP and voice control.
pub trait AudioPort {
    fn play_chime(&mut self);

    /// Stop whatever is playing.  Completion arrives as
    /// [`Event::StopPlaybackResponse`](crate::product::events::Event::StopPlaybackResponse).
    fn stop_playback(&mut self);

    fn boot_dsp_image(&mut self, image: DspImage);

    fn adaptiq_control(&mut self, action: AdaptIqAction);

    fn set_voice_enabled(&mut self, enabled: bool);

    /// Confirmation tones after accessory pairing.
    fn play_accessory_tones(&mut self, sub_valid: bool, rear_valid: bool);

    fn set_volume(&mut self, volume: u8);

    /// Allow or block user source changes.
    fn set_source_select_allowed(&mut self, allowed: bool);
}

// ───────────────────────────────────────────────────────────────
// Timer port
// ───────────────────────────────────────────────────────────────

/// One-shot inactivity timer.  Expiry arrives as
/// [`Event::InactivityTimeout`](crate::product::events::Event::InactivityTimeout).
pub trait TimerPort {
    fn start_inactivity_timer(&mut self, secs: u32);

    fn stop_inactivity_timer(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`ControllerEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Everything the product states call into.
pub trait Collaborators:
    LpmPort + FrontDoorPort + NetworkServicePort + IntentPort + AudioPort + TimerPort
{
}

impl<T> Collaborators for T where
    T: LpmPort + FrontDoorPort + NetworkServicePort + IntentPort + AudioPort + TimerPort
{
}
