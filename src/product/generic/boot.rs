//! Boot, setup and exceptional states.
//!
//! ```text
//!  Booting ──[ModulesReady, !ready || needs setup]──▶ Setup ──[configured]──▶ NetworkStandby
//!     │    ──[ModulesReady, greeting pending]──▶ Booted ──▶ FirstBootGreetingTransition
//!     │                                                        │ [FullPower + accessories]
//!     │                                                        ▼
//!     └────[ModulesReady]──▶ NetworkStandby ◀──[ChimeDone]── FirstBootGreeting
//! ```

use std::time::Instant;

use log::{debug, info, warn};

use crate::app::ports::Collaborators;
use crate::hsm::Outcome;
use crate::product::context::ProductContext;
use crate::product::events::{Event, EventKind, PowerStatus, SystemState};
use crate::product::ids::StateId;
use crate::product::{DPRINT, ProductState, Tx, state};

type Ctx<H> = ProductContext<H>;

// ═══════════════════════════════════════════════════════════════════════════
//  TOP
// ═══════════════════════════════════════════════════════════════════════════

pub fn top<H: Collaborators>() -> ProductState<H> {
    state(StateId::Top)
        .handle(EventKind::ModulesReady, top_modules_ready::<H>)
        .handle(EventKind::Intent, top_intent::<H>)
        .handle(EventKind::NetworkState, top_network_state::<H>)
        .build()
}

fn top_modules_ready<H>(_: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    debug!("Top: modules ready = {}", ctx.all_modules_ready());
    Outcome::Handled
}

/// Intents nobody below wanted end here.
fn top_intent<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    debug!("Top: ignoring {:?}", event.intent());
    Outcome::Handled
}

fn top_network_state<H>(_: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    debug!(
        "Top: network configured={} connected={}",
        ctx.is_network_configured(),
        ctx.is_network_connected()
    );
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTING: waiting for every module to report ready
// ═══════════════════════════════════════════════════════════════════════════

pub fn booting<H: Collaborators>() -> ProductState<H> {
    state(StateId::Booting)
        .handle(EventKind::ModulesReady, booting_modules_ready::<H>)
        .handle(EventKind::LpmInterfaceState, booting_lpm_interface::<H>)
        .build()
}

fn booting_modules_ready<H>(_: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    if !ctx.all_modules_ready() || ctx.needs_setup() {
        info!(
            "Booting: setup required (modules ready={}, network configured={}, forced={})",
            ctx.all_modules_ready(),
            ctx.is_network_configured(),
            ctx.config.force_setup
        );
        tx.change_state(StateId::Setup);
    } else if ctx.greeting_pending {
        tx.change_state(StateId::Booted);
    } else {
        tx.change_state(StateId::NetworkStandby);
    }
    Outcome::Handled
}

fn booting_lpm_interface<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match event {
        Event::LpmInterfaceState(true) => {
            ctx.hw.set_system_state(SystemState::Standby);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTED / FIRST BOOT GREETING
// ═══════════════════════════════════════════════════════════════════════════

pub fn booted<H: Collaborators>() -> ProductState<H> {
    state(StateId::Booted)
        .on_start(booted_start::<H>)
        .on_exit(booted_exit::<H>)
        .build()
}

fn booted_start<H>(_: &mut Ctx<H>, tx: &mut Tx) {
    tx.change_state(StateId::FirstBootGreetingTransition);
}

fn booted_exit<H>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.boot_complete_at = Some(Instant::now());
}

pub fn first_boot_greeting_transition<H: Collaborators>() -> ProductState<H> {
    state(StateId::FirstBootGreetingTransition)
        .on_start(greeting_transition_start::<H>)
        .handle(EventKind::LpmPowerStatus, greeting_transition_power::<H>)
        .handle(EventKind::AccessoriesKnown, greeting_transition_accessories::<H>)
        .build()
}

fn greeting_transition_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_system_state(SystemState::On);
}

fn greeting_transition_power<H>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event.power_status() {
        Some(PowerStatus::FullPower) => {
            if ctx.accessories_known {
                tx.change_state(StateId::FirstBootGreeting);
            }
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

fn greeting_transition_accessories<H>(_: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    tx.change_state(StateId::FirstBootGreeting);
    Outcome::Handled
}

pub fn first_boot_greeting<H: Collaborators>() -> ProductState<H> {
    state(StateId::FirstBootGreeting)
        .on_start(greeting_start::<H>)
        .handle(EventKind::ChimeDone, greeting_chime_done::<H>)
        .build()
}

fn greeting_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.play_chime();
}

fn greeting_chime_done<H>(_: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    ctx.greeting_pending = false;
    tx.change_state(StateId::NetworkStandby);
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  SETUP: access point and BLE advertising until a network is configured
// ═══════════════════════════════════════════════════════════════════════════

pub fn setup<H: Collaborators>() -> ProductState<H> {
    state(StateId::Setup)
        .on_enter(setup_enter::<H>)
        .on_exit(setup_exit::<H>)
        .handle(EventKind::NetworkState, setup_network_state::<H>)
        .build()
}

fn setup_enter<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    info!("Setup: entering network setup");
    ctx.hw.enable_wifi_setup_mode();
    ctx.hw.set_network_access_point(true);
    ctx.hw.set_ble_advertising(true);
}

fn setup_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_network_access_point(false);
    ctx.hw.set_ble_advertising(false);
    ctx.hw.enable_wifi_auto_switching_mode();
}

fn setup_network_state<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    if let Event::NetworkState {
        configured: true, ..
    } = event
    {
        tx.change_state(StateId::NetworkStandby);
    }
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  SW UPDATING / CRITICAL ERROR
// ═══════════════════════════════════════════════════════════════════════════

pub fn sw_updating<H: Collaborators>() -> ProductState<H> {
    state(StateId::SwUpdating)
        .handle(EventKind::LpmState, sw_updating_module_state::<H>)
        .handle(EventKind::CapsState, sw_updating_module_state::<H>)
        .handle(EventKind::AudioPathState, sw_updating_module_state::<H>)
        .handle(EventKind::StsSourcesInit, sw_updating_module_state::<H>)
        .build()
}

fn sw_updating_module_state<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    warn!("SwUpdating: unexpected {:?} during software update", event);
    Outcome::Handled
}

pub fn critical_error<H: Collaborators>() -> ProductState<H> {
    state(StateId::CriticalError)
        .on_enter(critical_error_enter::<H>)
        .handle(EventKind::Intent, critical_error_intent::<H>)
        .build()
}

fn critical_error_enter<H>(_: &mut Ctx<H>, _: &mut Tx) {
    DPRINT.log_critical(format_args!("entered CriticalError, user input disabled"));
}

fn critical_error_intent<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    debug!("CriticalError: ignoring {:?}", event.intent());
    Outcome::Handled
}
