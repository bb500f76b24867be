//! Builds the complete product state table.

use log::debug;

use crate::app::ports::Collaborators;
use crate::product::ids::StateId;

use super::{ProductHsm, ProductState, custom, generic};

/// The state the controller starts in.
pub const INITIAL_STATE: StateId = StateId::Booting;

/// Every product state: common states with the product overrides stacked
/// in front, followed by the product-only states.
pub fn build_state_table<H: Collaborators>() -> Vec<ProductState<H>> {
    let mut table = custom::apply_overrides(generic::base_states());
    table.extend(custom::product_states());
    table
}

/// Register the full table with `hsm`.
pub fn register_all<H: Collaborators>(hsm: &mut ProductHsm<H>) {
    for def in build_state_table::<H>() {
        debug!(
            "registering {} under {:?} ({} layer(s))",
            def.name(),
            def.parent(),
            def.layer_count()
        );
        hsm.add_state(def);
    }
}
