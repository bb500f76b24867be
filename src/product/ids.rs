//! Product state identities and the product tree.
//!
//! Raw value 0 belongs to Top.  A product override of a common state keeps
//! the common state's id, so transitions requested by generic code land on
//! the product version.
//!
//! ```text
//! Top
//! ├── Booting · Booted · FirstBootGreetingTransition · FirstBootGreeting
//! ├── Setup · SwUpdating · CriticalError
//! ├── LowPowerStandbyTransition · LowPowerStandby · LowPowerResume
//! ├── PlayableTransition ─┬─ PlayableTransitionIdle
//! │                       └─ PlayableTransitionNetworkStandby
//! ├── PlayingTransition ── PlayingTransitionSwitch
//! ├── Playable ─┬─ NetworkStandby
//! │             └─ Idle
//! └── On ── Playing ─┬─ PlayingDeselected
//!                    └─ PlayingSelected ─┬─ PlayingSelectedSilent
//!                                        ├─ PlayingSelectedSetup ── …SetupNetworkConfig
//!                                        ├─ PlayingSelectedStoppingStreams
//!                                        ├─ AdaptIQ · AdaptIQCancelling
//!                                        └─ AccessoryPairing · AccessoryPairingCancelling
//! ```

use serde::{Deserialize, Serialize};

use crate::hsm::StateKey;

/// Every state the product controller can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StateId {
    Top = 0,
    Booting = 1,
    Booted,
    Setup,
    CriticalError,
    NetworkStandby,
    LowPowerStandby,
    LowPowerStandbyTransition,
    LowPowerResume,
    On,
    Idle,
    Playable,
    Playing,
    SwUpdating,
    PlayingDeselected,
    PlayingSelected,
    PlayingSelectedSilent,
    PlayingSelectedSetup,
    PlayingSelectedSetupNetworkConfig,
    PlayingSelectedStoppingStreams,
    PlayableTransition,
    PlayableTransitionIdle,
    PlayableTransitionNetworkStandby,
    PlayingTransition,
    PlayingTransitionSwitch,
    FirstBootGreetingTransition,
    FirstBootGreeting,
    // Product-specific states start here.
    AccessoryPairing = 100,
    AccessoryPairingCancelling,
    AdaptIQ,
    AdaptIQCancelling,
}

impl StateId {
    /// Total number of states.
    pub const COUNT: usize = 31;

    /// Every state, Top first.
    pub const ALL: [StateId; Self::COUNT] = [
        Self::Top,
        Self::Booting,
        Self::Booted,
        Self::Setup,
        Self::CriticalError,
        Self::NetworkStandby,
        Self::LowPowerStandby,
        Self::LowPowerStandbyTransition,
        Self::LowPowerResume,
        Self::On,
        Self::Idle,
        Self::Playable,
        Self::Playing,
        Self::SwUpdating,
        Self::PlayingDeselected,
        Self::PlayingSelected,
        Self::PlayingSelectedSilent,
        Self::PlayingSelectedSetup,
        Self::PlayingSelectedSetupNetworkConfig,
        Self::PlayingSelectedStoppingStreams,
        Self::PlayableTransition,
        Self::PlayableTransitionIdle,
        Self::PlayableTransitionNetworkStandby,
        Self::PlayingTransition,
        Self::PlayingTransitionSwitch,
        Self::FirstBootGreetingTransition,
        Self::FirstBootGreeting,
        Self::AccessoryPairing,
        Self::AccessoryPairingCancelling,
        Self::AdaptIQ,
        Self::AdaptIQCancelling,
    ];

    /// Look a state up by its raw id.
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| *s as u16 == raw)
    }

    /// Look a state up by its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Superstate in the product tree, `None` for Top.
    pub fn parent(self) -> Option<StateId> {
        use StateId::*;
        match self {
            Top => None,
            Booting | Booted | Setup | CriticalError | SwUpdating | LowPowerStandby
            | LowPowerStandbyTransition | LowPowerResume | PlayableTransition
            | PlayingTransition | FirstBootGreetingTransition | FirstBootGreeting | Playable
            | On => Some(Top),
            NetworkStandby | Idle => Some(Playable),
            PlayableTransitionIdle | PlayableTransitionNetworkStandby => Some(PlayableTransition),
            PlayingTransitionSwitch => Some(PlayingTransition),
            Playing => Some(On),
            PlayingDeselected | PlayingSelected => Some(Playing),
            PlayingSelectedSilent
            | PlayingSelectedSetup
            | PlayingSelectedStoppingStreams
            | AccessoryPairing
            | AccessoryPairingCancelling
            | AdaptIQ
            | AdaptIQCancelling => Some(PlayingSelected),
            PlayingSelectedSetupNetworkConfig => Some(PlayingSelectedSetup),
        }
    }

    /// States that exist only in this product, not in the common set.
    pub fn is_product_specific(self) -> bool {
        (self as u16) >= 100
    }
}

impl StateKey for StateId {
    fn raw(self) -> u16 {
        self as u16
    }

    fn name(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Booting => "Booting",
            Self::Booted => "Booted",
            Self::Setup => "Setup",
            Self::CriticalError => "CriticalError",
            Self::NetworkStandby => "NetworkStandby",
            Self::LowPowerStandby => "LowPowerStandby",
            Self::LowPowerStandbyTransition => "LowPowerStandbyTransition",
            Self::LowPowerResume => "LowPowerResume",
            Self::On => "On",
            Self::Idle => "Idle",
            Self::Playable => "Playable",
            Self::Playing => "Playing",
            Self::SwUpdating => "SwUpdating",
            Self::PlayingDeselected => "PlayingDeselected",
            Self::PlayingSelected => "PlayingSelected",
            Self::PlayingSelectedSilent => "PlayingSelectedSilent",
            Self::PlayingSelectedSetup => "PlayingSelectedSetup",
            Self::PlayingSelectedSetupNetworkConfig => "PlayingSelectedSetupNetworkConfig",
            Self::PlayingSelectedStoppingStreams => "PlayingSelectedStoppingStreams",
            Self::PlayableTransition => "PlayableTransition",
            Self::PlayableTransitionIdle => "PlayableTransitionIdle",
            Self::PlayableTransitionNetworkStandby => "PlayableTransitionNetworkStandby",
            Self::PlayingTransition => "PlayingTransition",
            Self::PlayingTransitionSwitch => "PlayingTransitionSwitch",
            Self::FirstBootGreetingTransition => "FirstBootGreetingTransition",
            Self::FirstBootGreeting => "FirstBootGreeting",
            Self::AccessoryPairing => "AccessoryPairing",
            Self::AccessoryPairingCancelling => "AccessoryPairingCancelling",
            Self::AdaptIQ => "AdaptIQ",
            Self::AdaptIQCancelling => "AdaptIQCancelling",
        }
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
