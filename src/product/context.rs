//! Shared mutable context threaded through every product state handler.
//!
//! `ProductContext` is the blackboard the handlers read from and write to:
//! the collaborator handle, configuration, module readiness, the cached
//! network and selection status, and the flags individual states leave for
//! each other.  The controller host updates the cached status before it
//! dispatches the matching event.

use std::time::Instant;

use log::debug;

use crate::config::{ControllerConfig, MAX_INTENT_CACHE_DEPTH};

use super::events::{Intent, PowerStatus, SelectionInfo};

// ---------------------------------------------------------------------------
// Module readiness
// ---------------------------------------------------------------------------

/// Modules whose readiness gates the end of boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Caps,
    Lpm,
    Network,
    Sts,
    Bluetooth,
    SwUpdate,
}

impl Module {
    pub const ALL: [Module; 6] = [
        Self::Caps,
        Self::Lpm,
        Self::Network,
        Self::Sts,
        Self::Bluetooth,
        Self::SwUpdate,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "caps" => Some(Self::Caps),
            "lpm" => Some(Self::Lpm),
            "network" | "net" => Some(Self::Network),
            "sts" => Some(Self::Sts),
            "bluetooth" | "bt" => Some(Self::Bluetooth),
            "swupdate" | "sw-update" => Some(Self::SwUpdate),
            _ => None,
        }
    }
}

/// One flag per [`Module`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleReadiness {
    pub caps: bool,
    pub lpm: bool,
    pub network: bool,
    pub sts: bool,
    pub bluetooth: bool,
    pub sw_update: bool,
}

impl ModuleReadiness {
    pub fn set(&mut self, module: Module, ready: bool) {
        match module {
            Module::Caps => self.caps = ready,
            Module::Lpm => self.lpm = ready,
            Module::Network => self.network = ready,
            Module::Sts => self.sts = ready,
            Module::Bluetooth => self.bluetooth = ready,
            Module::SwUpdate => self.sw_update = ready,
        }
    }

    pub fn get(&self, module: Module) -> bool {
        match module {
            Module::Caps => self.caps,
            Module::Lpm => self.lpm,
            Module::Network => self.network,
            Module::Sts => self.sts,
            Module::Bluetooth => self.bluetooth,
            Module::SwUpdate => self.sw_update,
        }
    }

    pub fn all(&self) -> bool {
        Module::ALL.iter().all(|m| self.get(*m))
    }

    /// Modules still outstanding.
    pub fn pending(&self) -> impl Iterator<Item = Module> + '_ {
        Module::ALL.into_iter().filter(|m| !self.get(*m))
    }
}

// ---------------------------------------------------------------------------
// Network status
// ---------------------------------------------------------------------------

/// Latest status reported by the network service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStatus {
    pub bt_sink_devices: u32,
    pub wifi_profiles: u32,
    pub primary_up: bool,
}

impl NetworkStatus {
    pub fn is_configured(&self) -> bool {
        self.bt_sink_devices > 0 || self.wifi_profiles > 0 || self.primary_up
    }

    pub fn is_connected(&self) -> bool {
        self.primary_up
    }
}

// ---------------------------------------------------------------------------
// ProductContext
// ---------------------------------------------------------------------------

/// The shared context passed to every product state handler.
pub struct ProductContext<H> {
    /// Collaborator handle.  All port calls go through here.
    pub hw: H,

    // -- Configuration --
    pub config: ControllerConfig,

    // -- Cached collaborator status --
    pub readiness: ModuleReadiness,
    pub network: NetworkStatus,
    /// Last now-selection, `None` until content has been selected.
    pub selection: Option<SelectionInfo>,
    /// Last power status the LPM reported.
    pub lpm_power: Option<PowerStatus>,
    /// Accessory list has been received from the LPM.
    pub accessories_known: bool,
    /// Autowake (wake on audio) is enabled.
    pub autowake: bool,

    // -- Flags set by states --
    pub source_select_allowed: bool,
    pub adaptiq_completed: bool,
    pub autowake_monitor: bool,
    pub normal_ops_monitor: bool,
    /// Blocks PlayableTransitionNetworkStandby from completing.
    pub halt: bool,
    pub greeting_pending: bool,
    pub volume: u8,
    pub boot_complete_at: Option<Instant>,

    /// Intents received in low-power standby, replayed on resume.
    intent_cache: heapless::Deque<Intent, MAX_INTENT_CACHE_DEPTH>,
}

impl<H> ProductContext<H> {
    pub fn new(hw: H, config: ControllerConfig) -> Self {
        Self {
            hw,
            readiness: ModuleReadiness::default(),
            network: NetworkStatus::default(),
            selection: None,
            lpm_power: None,
            accessories_known: false,
            autowake: false,
            source_select_allowed: true,
            adaptiq_completed: false,
            autowake_monitor: false,
            normal_ops_monitor: false,
            halt: false,
            greeting_pending: config.first_boot_greeting,
            volume: config.default_volume,
            boot_complete_at: None,
            intent_cache: heapless::Deque::new(),
            config,
        }
    }

    pub fn all_modules_ready(&self) -> bool {
        self.readiness.all()
    }

    /// Setup is needed when forced or when no network has been configured.
    pub fn needs_setup(&self) -> bool {
        self.config.force_setup || !self.is_network_configured()
    }

    pub fn is_network_configured(&self) -> bool {
        self.network.is_configured()
    }

    pub fn is_network_connected(&self) -> bool {
        self.network.is_connected()
    }

    /// Remember an intent for replay, dropping the oldest once the
    /// configured depth is reached.
    pub fn cache_intent(&mut self, intent: Intent) {
        let depth = self.config.intent_cache_depth.clamp(1, MAX_INTENT_CACHE_DEPTH);
        while self.intent_cache.len() >= depth {
            if let Some(dropped) = self.intent_cache.pop_front() {
                debug!("intent cache full, dropping {dropped:?}");
            }
        }
        // Cannot fail: the loop above leaves at least one free slot.
        let _ = self.intent_cache.push_back(intent);
    }

    /// Drain the cached intents, oldest first.
    pub fn take_cached_intents(&mut self) -> Vec<Intent> {
        let mut out = Vec::with_capacity(self.intent_cache.len());
        while let Some(intent) = self.intent_cache.pop_front() {
            out.push(intent);
        }
        out
    }

    pub fn cached_intent_count(&self) -> usize {
        self.intent_cache.len()
    }
}
