//! Wireless accessory (bass module, rear speakers) pairing.

use log::info;

use crate::app::ports::Collaborators;
use crate::hsm::Outcome;
use crate::product::context::ProductContext;
use crate::product::events::{Event, EventKind, Intent, PairingAction, account};
use crate::product::ids::StateId;
use crate::product::{ProductState, Tx, state};

use super::allow_source;

type Ctx<H> = ProductContext<H>;

// ═══════════════════════════════════════════════════════════════════════════
//  ACCESSORY PAIRING
// ═══════════════════════════════════════════════════════════════════════════

pub fn accessory_pairing<H: Collaborators>() -> ProductState<H> {
    state(StateId::AccessoryPairing)
        .on_start(pairing_start::<H>)
        .on_exit(pairing_exit::<H>)
        .handle(EventKind::Intent, pairing_intent::<H>)
        .handle(EventKind::PairingStatus, pairing_status::<H>)
        .handle(EventKind::NowSelectionInfo, pairing_selection::<H>)
        .build()
}

fn pairing_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    info!("AccessoryPairing: starting");
    allow_source(ctx, false);
    ctx.hw.execute_intent(Intent::SpeakerPairing(PairingAction::Start));
}

fn pairing_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    allow_source(ctx, true);
    ctx.hw.stop_playback();
}

fn pairing_intent<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event.intent() {
        Some(intent @ Intent::SpeakerPairing(PairingAction::Stop)) => {
            ctx.hw.execute_intent(intent);
            Outcome::Handled
        }
        Some(Intent::SpeakerPairing(PairingAction::Start)) => Outcome::Handled,
        Some(intent) if intent.is_power_off() => {
            tx.change_state(StateId::AccessoryPairingCancelling);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

fn pairing_status<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    let Some(status) = event.pairing_status() else {
        return Outcome::NotHandled;
    };
    if status.active {
        return Outcome::Handled;
    }
    info!(
        "AccessoryPairing: done (sub={}, rear={}, lan={})",
        status.sub_valid, status.rear_valid, status.from_lan
    );
    if !status.from_lan {
        ctx.hw.play_accessory_tones(status.sub_valid, status.rear_valid);
    }
    tx.change_state(StateId::PlayingSelectedSilent);
    Outcome::Handled
}

fn pairing_selection<H>(_: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match &ctx.selection {
        Some(sel) if sel.is_setup(account::PAIRING) => Outcome::Handled,
        _ => Outcome::NotHandled,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACCESSORY PAIRING CANCELLING
// ═══════════════════════════════════════════════════════════════════════════

pub fn accessory_pairing_cancelling<H: Collaborators>() -> ProductState<H> {
    state(StateId::AccessoryPairingCancelling)
        .on_start(cancelling_start::<H>)
        .handle(EventKind::PairingStatus, cancelling_status::<H>)
        .handle(EventKind::Intent, cancelling_intent::<H>)
        .build()
}

fn cancelling_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.execute_intent(Intent::SpeakerPairing(PairingAction::Stop));
}

fn cancelling_status<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event.pairing_status() {
        Some(status) if !status.active => {
            tx.change_state(StateId::PlayingSelectedStoppingStreams);
            Outcome::Handled
        }
        Some(_) => Outcome::Handled,
        None => Outcome::NotHandled,
    }
}

fn cancelling_intent<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match event.intent() {
        Some(intent) if intent.is_power_off() || intent.is_power_on() => Outcome::Handled,
        _ => Outcome::NotHandled,
    }
}
