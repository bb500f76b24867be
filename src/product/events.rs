//! Events the product controller feeds into the state machine.
//!
//! Each variant belongs to exactly one [`EventKind`]; handler tables hold one
//! slot per kind.  Payloads are the decoded forms of what the LPM, the
//! network service and the intent handler report.

use crate::hsm::HsmEvent;

// ───────────────────────────────────────────────────────────────
// Payload types
// ───────────────────────────────────────────────────────────────

/// Power state reported by the LPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    ColdBoot,
    LowPower,
    NetworkStandby,
    AutoWakeStandby,
    FullPower,
}

impl PowerStatus {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "coldboot" | "cold-boot" => Some(Self::ColdBoot),
            "lowpower" | "low-power" => Some(Self::LowPower),
            "networkstandby" | "network-standby" => Some(Self::NetworkStandby),
            "autowake" | "autowakestandby" | "autowake-standby" => Some(Self::AutoWakeStandby),
            "fullpower" | "full-power" | "on" => Some(Self::FullPower),
            _ => None,
        }
    }
}

/// Requested system state sent to the LPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    On,
    Standby,
    LowPower,
    Idle,
}

/// Start or stop an accessory (speaker) pairing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingAction {
    Start,
    Stop,
}

/// A normalised user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    PowerToggle,
    PowerOn,
    PowerOff,
    Play,
    Pause,
    PlayPause,
    NextTrack,
    PreviousTrack,
    VolumeUp,
    VolumeDown,
    MuteToggle,
    BluetoothPairing,
    BluetoothClear,
    VoiceActivate,
    AuxIn,
    SpeakerPairing(PairingAction),
    AudioModeToggle,
    NetworkSetup,
}

/// Coarse grouping states use to decide whether they care about an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentCategory {
    Power,
    PlayControl,
    Volume,
    Mute,
    Bluetooth,
    Voice,
    Aux,
    SpeakerPairing,
    AudioMode,
    Setup,
}

impl Intent {
    pub fn category(self) -> IntentCategory {
        match self {
            Self::PowerToggle | Self::PowerOn | Self::PowerOff => IntentCategory::Power,
            Self::Play | Self::Pause | Self::PlayPause | Self::NextTrack | Self::PreviousTrack => {
                IntentCategory::PlayControl
            }
            Self::VolumeUp | Self::VolumeDown => IntentCategory::Volume,
            Self::MuteToggle => IntentCategory::Mute,
            Self::BluetoothPairing | Self::BluetoothClear => IntentCategory::Bluetooth,
            Self::VoiceActivate => IntentCategory::Voice,
            Self::AuxIn => IntentCategory::Aux,
            Self::SpeakerPairing(_) => IntentCategory::SpeakerPairing,
            Self::AudioModeToggle => IntentCategory::AudioMode,
            Self::NetworkSetup => IntentCategory::Setup,
        }
    }

    /// Parse the names used on the command line and in key maps.
    pub fn from_name(name: &str) -> Option<Self> {
        let intent = match name.to_ascii_lowercase().as_str() {
            "power" | "power-toggle" => Self::PowerToggle,
            "power-on" => Self::PowerOn,
            "power-off" => Self::PowerOff,
            "play" => Self::Play,
            "pause" => Self::Pause,
            "play-pause" => Self::PlayPause,
            "next" => Self::NextTrack,
            "prev" | "previous" => Self::PreviousTrack,
            "vol+" | "volume-up" => Self::VolumeUp,
            "vol-" | "volume-down" => Self::VolumeDown,
            "mute" => Self::MuteToggle,
            "bt-pair" => Self::BluetoothPairing,
            "bt-clear" => Self::BluetoothClear,
            "voice" | "alexa" => Self::VoiceActivate,
            "aux" => Self::AuxIn,
            "pair-speakers" => Self::SpeakerPairing(PairingAction::Start),
            "stop-pair" => Self::SpeakerPairing(PairingAction::Stop),
            "audio-mode" => Self::AudioModeToggle,
            "network-setup" => Self::NetworkSetup,
            _ => return None,
        };
        Some(intent)
    }

    pub fn is_power_off(self) -> bool {
        matches!(self, Self::PowerToggle | Self::PowerOff)
    }

    pub fn is_power_on(self) -> bool {
        matches!(self, Self::PowerToggle | Self::PowerOn)
    }
}

/// Which source slot the now-selection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Internal product source used for setup flows.
    Setup,
    Product,
    Bluetooth,
    Aux,
    Network,
}

impl Source {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SETUP" => Some(Self::Setup),
            "PRODUCT" | "TV" => Some(Self::Product),
            "BLUETOOTH" | "BT" => Some(Self::Bluetooth),
            "AUX" => Some(Self::Aux),
            "NETWORK" | "STREAM" => Some(Self::Network),
            _ => None,
        }
    }
}

/// Account names carried with the SETUP source.
pub mod account {
    pub const ADAPTIQ: &str = "ADAPTIQ";
    pub const PAIRING: &str = "PAIRING";
    pub const NETWORK: &str = "NETWORK";
    pub const CONTROL_INTEGRATION: &str = "CONTROL_INTEGRATION";
}

/// The currently selected content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionInfo {
    pub source: Source,
    pub account: String,
    /// Selected but producing no audio.
    pub silent: bool,
}

impl SelectionInfo {
    pub fn new(source: Source, account: impl Into<String>) -> Self {
        Self {
            source,
            account: account.into(),
            silent: false,
        }
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// True for the SETUP source with the given account.
    pub fn is_setup(&self, account: &str) -> bool {
        self.source == Source::Setup && self.account == account
    }
}

/// Accessory pairing progress reported by the LPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingStatus {
    pub active: bool,
    /// Status originated from a LAN (network) pairing request.
    pub from_lan: bool,
    pub sub_valid: bool,
    pub rear_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptIqStatus {
    Running,
    NotRunning,
}

/// Control request for a running AdaptIQ calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptIqAction {
    Start,
    Cancel,
    Advance,
    Previous,
}

/// DSP firmware images the audio path can boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DspImage {
    User,
    AdaptIq,
}

// ───────────────────────────────────────────────────────────────
// Event
// ───────────────────────────────────────────────────────────────

/// Everything the state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ModulesReady,
    LpmState(bool),
    CapsState(bool),
    AudioPathState(bool),
    StsSourcesInit,
    LpmInterfaceState(bool),
    BluetoothModuleState(bool),
    NetworkState { configured: bool, connected: bool },
    VoiceState(bool),
    VoiceListening,
    LpmPowerStatus(PowerStatus),
    Intent(Intent),
    NowSelectionInfo(SelectionInfo),
    AutowakeStatus(bool),
    PairingStatus(PairingStatus),
    AdaptIqStatus(AdaptIqStatus),
    AdaptIqControl(AdaptIqAction),
    DspBooted(DspImage),
    InactivityTimeout,
    StopPlaybackResponse,
    AccessoriesKnown,
    ChimeDone,
}

/// Discriminant of [`Event`], used to index handler tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    ModulesReady,
    LpmState,
    CapsState,
    AudioPathState,
    StsSourcesInit,
    LpmInterfaceState,
    BluetoothModuleState,
    NetworkState,
    VoiceState,
    VoiceListening,
    LpmPowerStatus,
    Intent,
    NowSelectionInfo,
    AutowakeStatus,
    PairingStatus,
    AdaptIqStatus,
    AdaptIqControl,
    DspBooted,
    InactivityTimeout,
    StopPlaybackResponse,
    AccessoriesKnown,
    ChimeDone,
}

impl EventKind {
    pub const COUNT: usize = 22;
}

impl From<EventKind> for usize {
    fn from(kind: EventKind) -> Self {
        kind as usize
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ModulesReady => EventKind::ModulesReady,
            Self::LpmState(_) => EventKind::LpmState,
            Self::CapsState(_) => EventKind::CapsState,
            Self::AudioPathState(_) => EventKind::AudioPathState,
            Self::StsSourcesInit => EventKind::StsSourcesInit,
            Self::LpmInterfaceState(_) => EventKind::LpmInterfaceState,
            Self::BluetoothModuleState(_) => EventKind::BluetoothModuleState,
            Self::NetworkState { .. } => EventKind::NetworkState,
            Self::VoiceState(_) => EventKind::VoiceState,
            Self::VoiceListening => EventKind::VoiceListening,
            Self::LpmPowerStatus(_) => EventKind::LpmPowerStatus,
            Self::Intent(_) => EventKind::Intent,
            Self::NowSelectionInfo(_) => EventKind::NowSelectionInfo,
            Self::AutowakeStatus(_) => EventKind::AutowakeStatus,
            Self::PairingStatus(_) => EventKind::PairingStatus,
            Self::AdaptIqStatus(_) => EventKind::AdaptIqStatus,
            Self::AdaptIqControl(_) => EventKind::AdaptIqControl,
            Self::DspBooted(_) => EventKind::DspBooted,
            Self::InactivityTimeout => EventKind::InactivityTimeout,
            Self::StopPlaybackResponse => EventKind::StopPlaybackResponse,
            Self::AccessoriesKnown => EventKind::AccessoriesKnown,
            Self::ChimeDone => EventKind::ChimeDone,
        }
    }
}

impl Event {
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Self::Intent(intent) => Some(*intent),
            _ => None,
        }
    }

    pub fn power_status(&self) -> Option<PowerStatus> {
        match self {
            Self::LpmPowerStatus(status) => Some(*status),
            _ => None,
        }
    }

    pub fn pairing_status(&self) -> Option<PairingStatus> {
        match self {
            Self::PairingStatus(status) => Some(*status),
            _ => None,
        }
    }
}

impl HsmEvent for Event {
    const KIND_COUNT: usize = EventKind::COUNT;

    fn kind_index(&self) -> usize {
        self.kind().into()
    }
}
