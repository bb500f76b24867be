//! Behaviour shared by every product: one constructor per common state.
//!
//! Product code may replace any of these through
//! [`custom::apply_overrides`](super::custom::apply_overrides); the generic
//! handlers then stay reachable as the layer behind the override.

pub mod boot;
pub mod playing;
pub mod standby;

use crate::app::ports::Collaborators;

use super::ProductState;

/// Base definitions for every common state, Top first.
pub fn base_states<H: Collaborators>() -> Vec<ProductState<H>> {
    vec![
        boot::top(),
        boot::booting(),
        boot::booted(),
        boot::first_boot_greeting_transition(),
        boot::first_boot_greeting(),
        boot::setup(),
        boot::sw_updating(),
        boot::critical_error(),
        standby::playable(),
        standby::network_standby(),
        standby::idle(),
        standby::playable_transition(),
        standby::playable_transition_network_standby(),
        standby::playable_transition_idle(),
        standby::low_power_standby_transition(),
        standby::low_power_standby(),
        standby::low_power_resume(),
        playing::on(),
        playing::playing(),
        playing::playing_deselected(),
        playing::playing_selected(),
        playing::playing_selected_silent(),
        playing::playing_selected_setup(),
        playing::playing_selected_setup_network_config(),
        playing::playing_selected_stopping_streams(),
        playing::playing_transition(),
        playing::playing_transition_switch(),
    ]
}
