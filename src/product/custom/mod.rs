//! This product's layer: overrides of common states plus the states only
//! this product has.

pub mod accessory_pairing;
pub mod adaptiq;
pub mod boot;
pub mod playing_selected;

use crate::app::ports::Collaborators;
use crate::product::context::ProductContext;
use crate::product::ids::StateId;

use super::ProductState;

/// Stack the product overrides in front of the matching base definitions.
///
/// States without an override pass through untouched.
pub fn apply_overrides<H: Collaborators>(base: Vec<ProductState<H>>) -> Vec<ProductState<H>> {
    base.into_iter()
        .map(|def| match def.id() {
            StateId::Top => boot::top_override(def),
            StateId::Booting => boot::booting_override(def),
            StateId::PlayingSelected => playing_selected::playing_selected_override(def),
            _ => def,
        })
        .collect()
}

/// States that exist only in this product.
pub fn product_states<H: Collaborators>() -> Vec<ProductState<H>> {
    vec![
        adaptiq::adaptiq(),
        adaptiq::adaptiq_cancelling(),
        accessory_pairing::accessory_pairing(),
        accessory_pairing::accessory_pairing_cancelling(),
    ]
}

/// Record and forward whether the user may change source.
pub(crate) fn allow_source<H: Collaborators>(ctx: &mut ProductContext<H>, allowed: bool) {
    ctx.source_select_allowed = allowed;
    ctx.hw.set_source_select_allowed(allowed);
}
