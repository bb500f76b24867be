//! The speaker product built on the generic [`hsm`](crate::hsm) engine.
//!
//! ```text
//!   generic::base_states()  ──┐
//!                              ├──▶ table::build_state_table() ──▶ Hsm
//!   custom::apply_overrides() ─┘
//! ```
//!
//! [`generic`] holds the behaviour common to every product.  [`custom`]
//! holds this product's overrides, stacked in front of the generic layer,
//! plus the states only this product has.

pub mod context;
pub mod custom;
pub mod events;
pub mod generic;
pub mod ids;
pub mod table;

use std::sync::LazyLock;

use crate::app::ports::Collaborators;
use crate::dprint::DPrint;
use crate::hsm::{Hsm, StateBuilder, StateDef, Transitions};
use context::ProductContext;
use events::Event;
use ids::StateId;

/// Named facility for messages that need CRITICAL, which `log` cannot express.
pub(crate) static DPRINT: LazyLock<DPrint> = LazyLock::new(|| DPrint::new("ProductController"));

/// The product machine over collaborator handle `H`.
pub type ProductHsm<H> = Hsm<StateId, Event, ProductContext<H>>;

/// One product state definition.
pub type ProductState<H> = StateDef<StateId, Event, ProductContext<H>>;

pub type ProductStateBuilder<H> = StateBuilder<StateId, Event, ProductContext<H>>;

/// Transition requests made by product handlers.
pub type Tx = Transitions<StateId>;

/// Start a builder for `id`, parented per [`StateId::parent`].
pub(crate) fn state<H: Collaborators>(id: StateId) -> ProductStateBuilder<H> {
    let builder = StateBuilder::new(id);
    match id.parent() {
        Some(parent) => builder.parent(parent),
        None => builder.root(),
    }
}
