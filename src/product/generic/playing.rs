//! The On subtree and the transition into it.
//!
//! ```text
//!  On ─start─▶ PlayingSelected (selection known) | PlayingDeselected
//!
//!  PlayingSelected ─[selection]─▶ PlayingSelectedSetup ──▶ PlayingSelectedSetupNetworkConfig
//!                              ─▶ PlayingSelectedSilent
//!  PlayingSelectedStoppingStreams ──[stopped]──▶ PlayingDeselected
//! ```

use log::{debug, info};

use crate::app::ports::Collaborators;
use crate::hsm::Outcome;
use crate::product::context::ProductContext;
use crate::product::events::{Event, EventKind, Intent, IntentCategory, PowerStatus, Source, SystemState, account};
use crate::product::ids::StateId;
use crate::product::{ProductState, Tx, state};

type Ctx<H> = ProductContext<H>;

// ═══════════════════════════════════════════════════════════════════════════
//  ON
// ═══════════════════════════════════════════════════════════════════════════

pub fn on<H: Collaborators>() -> ProductState<H> {
    state(StateId::On)
        .on_start(on_start::<H>)
        .handle(EventKind::Intent, on_intent::<H>)
        .build()
}

fn on_start<H>(ctx: &mut Ctx<H>, tx: &mut Tx) {
    if ctx.selection.is_some() {
        tx.change_state(StateId::PlayingSelected);
    } else {
        tx.change_state(StateId::PlayingDeselected);
    }
}

fn on_intent<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    let Some(intent) = event.intent() else {
        return Outcome::NotHandled;
    };
    match intent.category() {
        IntentCategory::Power if intent.is_power_off() => {
            info!("On: {intent:?}, powering down");
            tx.change_state(StateId::PlayableTransition);
            Outcome::Handled
        }
        IntentCategory::PlayControl
        | IntentCategory::Bluetooth
        | IntentCategory::Voice
        | IntentCategory::Volume
        | IntentCategory::Mute
        | IntentCategory::Aux => {
            ctx.hw.execute_intent(intent);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYING
// ═══════════════════════════════════════════════════════════════════════════

pub fn playing<H: Collaborators>() -> ProductState<H> {
    state(StateId::Playing)
        .on_enter(playing_enter::<H>)
        .on_exit(playing_exit::<H>)
        .build()
}

fn playing_enter<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.normal_ops_monitor = true;
    let threshold = ctx.config.volume_threshold;
    if ctx.volume > threshold {
        info!("Playing: clamping volume {} -> {}", ctx.volume, threshold);
        ctx.volume = threshold;
        ctx.hw.set_volume(threshold);
    }
}

fn playing_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.normal_ops_monitor = false;
    ctx.hw.set_power_macro(false);
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYING DESELECTED: on, nothing selected
// ═══════════════════════════════════════════════════════════════════════════

pub fn playing_deselected<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingDeselected)
        .handle(EventKind::Intent, deselected_intent::<H>)
        .handle(EventKind::NowSelectionInfo, deselected_selection::<H>)
        .build()
}

fn deselected_intent<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    let Some(intent) = event.intent() else {
        return Outcome::NotHandled;
    };
    match intent {
        Intent::VolumeUp | Intent::VolumeDown | Intent::MuteToggle => {
            debug!("PlayingDeselected: ignoring {intent:?}, nothing selected");
            Outcome::Handled
        }
        Intent::PowerOn => {
            ctx.hw.execute_intent(Intent::Play);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

fn deselected_selection<H>(_: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    tx.change_state(StateId::PlayingSelected);
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYING SELECTED
// ═══════════════════════════════════════════════════════════════════════════

pub fn playing_selected<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingSelected)
        .on_start(playing_selected_start::<H>)
        .handle(EventKind::NowSelectionInfo, playing_selected_selection::<H>)
        .handle(EventKind::Intent, playing_selected_intent::<H>)
        .build()
}

/// Where the current selection belongs in the PlayingSelected subtree.
pub(crate) fn next_selected_state<H>(ctx: &Ctx<H>) -> StateId {
    match &ctx.selection {
        Some(sel) if sel.source == Source::Setup => {
            if sel.account == account::NETWORK {
                StateId::PlayingSelectedSetupNetworkConfig
            } else {
                StateId::PlayingSelectedSetup
            }
        }
        Some(sel) if sel.silent => StateId::PlayingSelectedSilent,
        _ => StateId::PlayingSelected,
    }
}

pub(crate) fn playing_selected_start<H>(ctx: &mut Ctx<H>, tx: &mut Tx) {
    let next = next_selected_state(ctx);
    if next != StateId::PlayingSelected {
        tx.change_state(next);
    }
}

fn playing_selected_selection<H>(_: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    tx.change_state(next_selected_state(ctx));
    Outcome::Handled
}

fn playing_selected_intent<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match event.intent() {
        Some(Intent::AudioModeToggle) => {
            ctx.hw.execute_intent(Intent::AudioModeToggle);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

pub fn playing_selected_silent<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingSelectedSilent).build()
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYING SELECTED SETUP
// ═══════════════════════════════════════════════════════════════════════════

pub fn playing_selected_setup<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingSelectedSetup)
        .on_enter(selected_setup_enter::<H>)
        .on_exit(selected_setup_exit::<H>)
        .handle(EventKind::Intent, selected_setup_intent::<H>)
        .build()
}

fn selected_setup_enter<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_ble_advertising(true);
    ctx.hw.set_remote_pairing(true);
}

fn selected_setup_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_ble_advertising(false);
    ctx.hw.set_remote_pairing(false);
}

fn selected_setup_intent<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match event.intent() {
        Some(Intent::MuteToggle) => Outcome::Handled,
        _ => Outcome::NotHandled,
    }
}

pub fn playing_selected_setup_network_config<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingSelectedSetupNetworkConfig)
        .on_enter(network_config_enter::<H>)
        .on_exit(network_config_exit::<H>)
        .build()
}

fn network_config_enter<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_amp(true, true);
}

fn network_config_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.set_amp(true, false);
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYING SELECTED STOPPING STREAMS
// ═══════════════════════════════════════════════════════════════════════════

pub fn playing_selected_stopping_streams<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingSelectedStoppingStreams)
        .on_start(stopping_streams_start::<H>)
        .handle(EventKind::StopPlaybackResponse, stopping_streams_done::<H>)
        .build()
}

fn stopping_streams_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.stop_playback();
}

fn stopping_streams_done<H>(_: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    ctx.selection = None;
    tx.change_state(StateId::PlayingDeselected);
    Outcome::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAYING TRANSITION: waiting for full power
// ═══════════════════════════════════════════════════════════════════════════

pub fn playing_transition<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingTransition)
        .on_start(playing_transition_start::<H>)
        .handle(EventKind::LpmPowerStatus, playing_transition_power::<H>)
        .build()
}

fn playing_transition_start<H: Collaborators>(ctx: &mut Ctx<H>, tx: &mut Tx) {
    ctx.hw.set_system_state(SystemState::On);
    tx.change_state(StateId::PlayingTransitionSwitch);
}

fn playing_transition_power<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event.power_status() {
        Some(PowerStatus::FullPower) => {
            tx.change_state(StateId::On);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

pub fn playing_transition_switch<H: Collaborators>() -> ProductState<H> {
    state(StateId::PlayingTransitionSwitch).build()
}
