//! Top and Booting overrides: louder readiness reporting.

use log::info;

use crate::app::ports::Collaborators;
use crate::hsm::{Outcome, StateBuilder};
use crate::product::context::{Module, ProductContext};
use crate::product::events::{Event, EventKind};
use crate::product::{ProductState, Tx};

type Ctx<H> = ProductContext<H>;

pub fn top_override<H: Collaborators>(base: ProductState<H>) -> ProductState<H> {
    StateBuilder::from_base(base)
        .handle(EventKind::ModulesReady, top_modules_ready::<H>)
        .handle(EventKind::BluetoothModuleState, top_module_state::<H>)
        .handle(EventKind::VoiceState, top_module_state::<H>)
        .handle(EventKind::LpmInterfaceState, top_module_state::<H>)
        .build()
}

fn top_modules_ready<H>(_: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    info!("modules ready: {}", ctx.all_modules_ready());
    Outcome::NotHandled
}

fn top_module_state<H>(event: &Event, _: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    match event {
        Event::BluetoothModuleState(up) => info!("bluetooth module {}", up_down(*up)),
        Event::VoiceState(up) => info!("voice {}", up_down(*up)),
        Event::LpmInterfaceState(up) => info!("LPM interface {}", up_down(*up)),
        _ => return Outcome::NotHandled,
    }
    Outcome::Handled
}

fn up_down(up: bool) -> &'static str {
    if up { "up" } else { "down" }
}

pub fn booting_override<H: Collaborators>(base: ProductState<H>) -> ProductState<H> {
    StateBuilder::from_base(base)
        .handle(EventKind::ModulesReady, booting_modules_ready::<H>)
        .build()
}

fn booting_modules_ready<H>(_: &Event, ctx: &mut Ctx<H>, _: &mut Tx) -> Outcome {
    let pending: Vec<Module> = ctx.readiness.pending().collect();
    if !pending.is_empty() {
        info!("Booting: still waiting on {pending:?}");
    }
    Outcome::NotHandled
}
