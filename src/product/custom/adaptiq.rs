//! AdaptIQ room calibration and its cancellation.
//!
//! ```text
//!  PlayingSelected ──[SETUP/ADAPTIQ]──▶ AdaptIQ ──[NotRunning]──▶ PlayingSelectedSilent
//!                                          │ [timeout | power off]
//!                                          ▼
//!                                   AdaptIQCancelling ──[DspBooted]──▶ PlayingSelectedStoppingStreams
//! ```
//!
//! While calibration runs the DSP executes the AdaptIQ image, voice is off
//! and the user may not change source.

use log::{debug, info, warn};

use crate::app::ports::Collaborators;
use crate::hsm::Outcome;
use crate::product::context::ProductContext;
use crate::product::events::{AdaptIqAction, AdaptIqStatus, DspImage, Event, EventKind, IntentCategory};
use crate::product::ids::StateId;
use crate::product::{ProductState, Tx, state};

use super::allow_source;

type Ctx<H> = ProductContext<H>;

// ═══════════════════════════════════════════════════════════════════════════
//  ADAPTIQ
// ═══════════════════════════════════════════════════════════════════════════

pub fn adaptiq<H: Collaborators>() -> ProductState<H> {
    state(StateId::AdaptIQ)
        .on_start(adaptiq_start::<H>)
        .on_exit(adaptiq_exit::<H>)
        .handle(EventKind::InactivityTimeout, adaptiq_timeout::<H>)
        .handle(EventKind::AdaptIqStatus, adaptiq_status::<H>)
        .handle(EventKind::AdaptIqControl, adaptiq_control::<H>)
        .handle(EventKind::Intent, adaptiq_intent::<H>)
        .build()
}

fn adaptiq_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    info!("AdaptIQ: starting calibration");
    ctx.adaptiq_completed = false;
    allow_source(ctx, false);
    ctx.hw.start_inactivity_timer(ctx.config.adaptiq_timeout_secs);
    ctx.hw.set_voice_enabled(false);
    ctx.hw.boot_dsp_image(DspImage::AdaptIq);
}

fn adaptiq_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.stop_inactivity_timer();
    if ctx.adaptiq_completed {
        allow_source(ctx, true);
        ctx.hw.stop_playback();
        ctx.hw.set_voice_enabled(true);
    }
}

fn adaptiq_timeout<H>(_: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    warn!("AdaptIQ: timed out, cancelling");
    tx.change_state(StateId::AdaptIQCancelling);
    Outcome::Handled
}

fn adaptiq_status<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match event {
        Event::AdaptIqStatus(AdaptIqStatus::NotRunning) => {
            info!("AdaptIQ: calibration finished");
            ctx.hw.boot_dsp_image(DspImage::User);
            allow_source(ctx, true);
            ctx.adaptiq_completed = true;
            tx.change_state(StateId::PlayingSelectedSilent);
        }
        Event::AdaptIqStatus(AdaptIqStatus::Running) => debug!("AdaptIQ: running"),
        _ => return Outcome::NotHandled,
    }
    Outcome::Handled
}

fn adaptiq_control<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match event {
        Event::AdaptIqControl(action) => {
            ctx.hw.adaptiq_control(*action);
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}

fn adaptiq_intent<H>(event: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    let Some(intent) = event.intent() else {
        return Outcome::NotHandled;
    };
    if intent.is_power_off() {
        tx.change_state(StateId::AdaptIQCancelling);
        return Outcome::Handled;
    }
    match intent.category() {
        IntentCategory::SpeakerPairing => Outcome::Handled,
        _ => Outcome::NotHandled,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ADAPTIQ CANCELLING
// ═══════════════════════════════════════════════════════════════════════════

pub fn adaptiq_cancelling<H: Collaborators>() -> ProductState<H> {
    state(StateId::AdaptIQCancelling)
        .on_start(cancelling_start::<H>)
        .on_exit(cancelling_exit::<H>)
        .handle(EventKind::AdaptIqStatus, cancelling_status::<H>)
        .handle(EventKind::DspBooted, cancelling_dsp_booted::<H>)
        .handle(EventKind::Intent, cancelling_intent::<H>)
        .build()
}

fn cancelling_start<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    ctx.hw.adaptiq_control(AdaptIqAction::Cancel);
}

fn cancelling_exit<H: Collaborators>(ctx: &mut Ctx<H>, _: &mut Tx) {
    allow_source(ctx, true);
    ctx.hw.stop_playback();
    ctx.hw.set_voice_enabled(true);
}

fn cancelling_status<H: Collaborators>(event: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    if let Event::AdaptIqStatus(AdaptIqStatus::NotRunning) = event {
        ctx.hw.boot_dsp_image(DspImage::User);
    }
    Outcome::Handled
}

fn cancelling_dsp_booted<H>(_: &Event, _: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    tx.change_state(StateId::PlayingSelectedStoppingStreams);
    Outcome::Handled
}

fn cancelling_intent<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    let Some(intent) = event.intent() else {
        return Outcome::NotHandled;
    };
    match intent.category() {
        IntentCategory::Volume | IntentCategory::Mute | IntentCategory::SpeakerPairing => {
            Outcome::Handled
        }
        _ => Outcome::NotHandled,
    }
}
