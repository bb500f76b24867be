//! Standby family: network standby, idle (autowake) and the power
//! transitions between them and low-power.
//!
//! ```text
//!  On ──[power off]──▶ PlayableTransition ─┬─▶ PlayableTransitionNetworkStandby ──▶ NetworkStandby
//!                                          └─▶ PlayableTransitionIdle ──────────▶ Idle
//!
//!  Playable ──[inactivity]──▶ LowPowerStandbyTransition ──▶ LowPowerStandby
//!                                                              │ [user intent]
//!                                                              ▼
//!                         On / NetworkStandby ◀──────── LowPowerResume
//! ```

use log::{debug, info};

use crate::app::ports::Collaborators;
use crate::hsm::Outcome;
use crate::product::context::ProductContext;
use crate::product::events::{Event, EventKind, Intent, IntentCategory, PowerStatus, SystemState};
use crate::product::ids::StateId;
use crate::product::{ProductState, Tx, state};

type Ctx<H> = ProductContext<H>;

/// Intents that wake the product from standby.
fn wakes_product(intent: Intent) -> bool {
    matches!(
        intent.category(),
        IntentCategory::PlayControl | IntentCategory::Aux | IntentCategory::Bluetooth
    ) || intent.is_power_on()
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYABLE (superstate of NetworkStandby and Idle)
// ═══════════════════════════════════════════════════════════════════════════

pub fn playable<H: Collaborators>() -> ProductState<H> {
    state(StateId::Playable)
        .handle(EventKind::VoiceListening, playable_voice_listening::<H>)
        .handle(EventKind::InactivityTimeout, playable_inactivity::<H>)
        .build()
}

fn playable_voice_listening<H>(_: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    tx.change_state(StateId::PlayingTransition);
    Outcome::Handled
}

fn playable_inactivity<H>(_: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    info!("Playable: inactivity timeout, dropping to low power");
    tx.change_state(StateId::LowPowerStandbyTransition);
    Outcome::Handled
}

/// Shared by NetworkStandby and Idle: content or a user action turns the
/// product on.
fn standby_wake<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event {
        Event::NowSelectionInfo(_) => {
            tx.change_state(StateId::On);
            Outcome::Handled
        }
        Event::Intent(intent) if wakes_product(*intent) => {
            if !intent.is_power_on() {
                ctx.hw.execute_intent(*intent);
            }
            tx.change_state(StateId::On);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  NETWORK STANDBY
// ═══════════════════════════════════════════════════════════════════════════

pub fn network_standby<H: Collaborators>() -> ProductState<H> {
    state(StateId::NetworkStandby)
        .on_enter(network_standby_enter::<H>)
        .handle(EventKind::NowSelectionInfo, standby_wake::<H>)
        .handle(EventKind::Intent, standby_wake::<H>)
        .handle(EventKind::AutowakeStatus, network_standby_autowake::<H>)
        .build()
}

fn network_standby_enter<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_system_state(SystemState::Standby);
}

fn network_standby_autowake<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event {
        Event::AutowakeStatus(true) => {
            tx.change_state(StateId::Idle);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: standby with the autowake monitor running
// ═══════════════════════════════════════════════════════════════════════════

pub fn idle<H: Collaborators>() -> ProductState<H> {
    state(StateId::Idle)
        .on_enter(idle_enter::<H>)
        .on_exit(idle_exit::<H>)
        .handle(EventKind::AutowakeStatus, idle_autowake::<H>)
        .handle(EventKind::NowSelectionInfo, standby_wake::<H>)
        .handle(EventKind::Intent, standby_wake::<H>)
        .build()
}

fn idle_enter<H>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.autowake_monitor = true;
}

fn idle_exit<H>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.autowake_monitor = false;
}

fn idle_autowake<H>(event: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    if let Event::AutowakeStatus(on) = event {
        ctx.autowake_monitor = *on;
    }
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYABLE TRANSITION: waiting for the LPM to finish powering down
// ═══════════════════════════════════════════════════════════════════════════

pub fn playable_transition<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayableTransition)
        .on_start(playable_transition_start::<H>)
        .build()
}

fn playable_transition_start<H: Collaborators>(ctx: &mut Ctx<H>, tx: &mut Tx) {
    if ctx.autowake {
        ctx.hw.set_system_state(SystemState::Idle);
        tx.change_state(StateId::PlayableTransitionIdle);
    } else {
        ctx.hw.set_system_state(SystemState::Standby);
        tx.change_state(StateId::PlayableTransitionNetworkStandby);
    }
}

pub fn playable_transition_network_standby<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayableTransitionNetworkStandby)
        .handle(EventKind::LpmPowerStatus, ptns_power_status::<H>)
        .build()
}

fn ptns_power_status<H>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    if event.power_status() == Some(PowerStatus::NetworkStandby) {
        if ctx.halt {
            info!("PlayableTransitionNetworkStandby: halted, staying");
        } else {
            tx.change_state(StateId::NetworkStandby);
        }
    }
    Outcome::Handled
}

pub fn playable_transition_idle<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayableTransitionIdle)
        .handle(EventKind::LpmPowerStatus, pti_power_status::<H>)
        .build()
}

fn pti_power_status<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    if event.power_status() == Some(PowerStatus::AutoWakeStandby) {
        tx.change_state(StateId::Idle);
    }
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOW POWER
// ═══════════════════════════════════════════════════════════════════════════

pub fn low_power_standby_transition<H: Collaborators>() -> ProductState<H> {
    state(StateId::LowPowerStandbyTransition)
        .on_start(lpst_start::<H>)
        .handle(EventKind::LpmPowerStatus, lpst_power_status::<H>)
        .build()
}

fn lpst_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_system_state(SystemState::LowPower);
}

fn lpst_power_status<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event.power_status() {
        Some(PowerStatus::LowPower) => {
            tx.change_state(StateId::LowPowerStandby);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

pub fn low_power_standby<H: Collaborators>() -> ProductState<H> {
    state(StateId::LowPowerStandby)
        .handle(EventKind::Intent, low_power_intent::<H>)
        .build()
}

fn low_power_intent<H>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    let Some(intent) = event.intent() else {
        return Outcome::NotHandled;
    };
    if wakes_product(intent) {
        ctx.cache_intent(intent);
        tx.change_state(StateId::LowPowerResume);
    } else {
        debug!("LowPowerStandby: ignoring {intent:?}");
    }
    Outcome::Handled
}

pub fn low_power_resume<H: Collaborators>() -> ProductState<H> {
    state(StateId::LowPowerResume)
        .on_start(lpr_start::<H>)
        .handle(EventKind::LpmPowerStatus, lpr_power_status::<H>)
        .build()
}

fn lpr_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_system_state(SystemState::Standby);
}

fn lpr_power_status<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    if event.power_status() != Some(PowerStatus::NetworkStandby) {
        return Outcome::NotHandled;
    }
    let cached = ctx.take_cached_intents();
    if cached.is_empty() {
        tx.change_state(StateId::NetworkStandby);
    } else {
        info!("LowPowerResume: replaying {} cached intent(s)", cached.len());
        for intent in cached.into_iter().filter(|i| i.category() != IntentCategory::Power) {
            ctx.hw.execute_intent(intent);
        }
        tx.change_state(StateId::On);
    }
    Outcome::Handled
}
