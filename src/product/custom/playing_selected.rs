//! PlayingSelected override: setup selections for AdaptIQ and accessory
//! pairing lead into the product-only states.

use crate::app::ports::Collaborators;
use crate::hsm::{Outcome, StateBuilder};
use crate::product::context::ProductContext;
use crate::product::events::{Event, EventKind, account};
use crate::product::generic::playing::playing_selected_start;
use crate::product::ids::StateId;
use crate::product::{ProductState, Tx};

type Ctx<H> = ProductContext<H>;

pub fn playing_selected_override<H: Collaborators>(base: ProductState<H>) -> ProductState<H> {
    StateBuilder::from_base(base)
        .on_start(start::<H>)
        .handle(EventKind::NowSelectionInfo, selection::<H>)
        .build()
}

fn product_choice<H>(ctx: &Ctx<H>) -> Option<StateId> {
    let sel = ctx.selection.as_ref()?;
    if sel.is_setup(account::ADAPTIQ) {
        Some(StateId::AdaptIQ)
    } else if sel.is_setup(account::PAIRING) {
        Some(StateId::AccessoryPairing)
    } else {
        None
    }
}

fn start<H>(ctx: &mut Ctx<H>, tx: &mut Tx) {
    match product_choice(ctx) {
        Some(next) => tx.change_state(next),
        None => playing_selected_start(ctx, tx),
    }
}

fn selection<H>(_: &Event, ctx: &mut Ctx<H>, tx: &mut Tx) -> Outcome {
    match product_choice(ctx) {
        Some(next) => {
            tx.change_state(next);
            Outcome::Handled
        }
        None => Outcome::NotHandled,
    }
}
