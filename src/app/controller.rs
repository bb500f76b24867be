//! Product controller host: the hexagonal core.
//!
//! [`ProductController`] owns the state machine and its context.  Every
//! collaborator callback arrives through one of the `handle_*` methods (or
//! as a [`ControllerMsg`](super::mailbox::ControllerMsg) drained from the
//! mailbox), updates the cached status, and is then dispatched.
//!
//! ```text
//!  LPM / network / keys ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                           │    ProductController     │
//!  Collaborator ports  ◀──  │  Hsm · ProductContext    │
//!                           └──────────────────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::dprint::LoggerRegistry;
use crate::error::{DPrintError, Result};
use crate::hsm::Outcome;
use crate::product::context::{Module, NetworkStatus, ProductContext};
use crate::product::events::Event;
use crate::product::ids::StateId;
use crate::product::table::{INITIAL_STATE, register_all};
use crate::product::{DPRINT, ProductHsm};

use super::commands::ControllerCommand;
use super::events::ControllerEvent;
use super::mailbox::ControllerMsg;
use super::ports::{Collaborators, EventSink, KeyEvent};

// ───────────────────────────────────────────────────────────────
// ProductController
// ───────────────────────────────────────────────────────────────

pub struct ProductController<H> {
    hsm: ProductHsm<H>,
    ctx: ProductContext<H>,
    /// `ModulesReady` has been dispatched for the current readiness set.
    modules_ready_sent: bool,
}

impl<H: Collaborators> ProductController<H> {
    /// Build the state table and context.
    ///
    /// Does **not** start the machine; call [`start`](Self::start) next.
    pub fn new(hw: H, config: ControllerConfig) -> Self {
        let mut hsm = ProductHsm::new();
        register_all(&mut hsm);
        Self {
            hsm,
            ctx: ProductContext::new(hw, config),
            modules_ready_sent: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the initial state and ask the LPM for its IPC link.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.hsm.init(INITIAL_STATE, &mut self.ctx);
        let state = self.state();
        sink.emit(&ControllerEvent::Started(state));
        info!("{} controller started in {state}", self.ctx.config.product_name);
        self.ctx.hw.connect();
    }

    // ── Inbound events ────────────────────────────────────────

    /// Cache whatever status `event` carries, then offer it to the machine.
    pub fn dispatch(&mut self, event: Event, sink: &mut impl EventSink) -> Outcome {
        match &event {
            Event::NowSelectionInfo(sel) => self.ctx.selection = Some(sel.clone()),
            Event::LpmPowerStatus(status) => self.ctx.lpm_power = Some(*status),
            Event::AutowakeStatus(on) => self.ctx.autowake = *on,
            Event::AccessoriesKnown => self.ctx.accessories_known = true,
            _ => {}
        }
        let prev = self.hsm.current_state();
        let outcome = self.hsm.dispatch(&event, &mut self.ctx);
        self.report_change(prev, sink);
        outcome
    }

    /// Record a module's readiness.  `ModulesReady` is dispatched once when
    /// the last module comes up, and again only after one has gone down.
    pub fn set_module_ready(&mut self, module: Module, ready: bool, sink: &mut impl EventSink) {
        debug!("module {module:?} ready={ready}");
        self.ctx.readiness.set(module, ready);
        if !self.ctx.all_modules_ready() {
            self.modules_ready_sent = false;
            return;
        }
        if !self.modules_ready_sent {
            self.modules_ready_sent = true;
            sink.emit(&ControllerEvent::ModulesReady);
            self.dispatch(Event::ModulesReady, sink);
        }
    }

    pub fn handle_network_status(&mut self, status: NetworkStatus, sink: &mut impl EventSink) {
        self.ctx.network = status;
        let event = Event::NetworkState {
            configured: self.ctx.is_network_configured(),
            connected: self.ctx.is_network_connected(),
        };
        self.dispatch(event, sink);
    }

    /// Outcome of the LPM IPC connect.  A failed connect is unrecoverable
    /// short of a reboot.
    pub fn handle_lpm_connected(&mut self, connected: bool, sink: &mut impl EventSink) {
        if connected {
            info!("LPM connected");
            self.dispatch(Event::LpmInterfaceState(true), sink);
            self.set_module_ready(Module::Lpm, true, sink);
        } else {
            DPRINT.log_critical(format_args!("LPM connection failed, rebooting"));
            self.ctx.hw.reboot();
        }
    }

    /// Translate a raw key through the key map and dispatch the intent.
    /// Returns false when the key maps to nothing.
    pub fn handle_key_event(&mut self, key: KeyEvent, sink: &mut impl EventSink) -> bool {
        match self.ctx.hw.translate_key(&key) {
            Some(intent) => {
                debug!("key {key:?} -> {intent:?}");
                self.dispatch(Event::Intent(intent), sink);
                true
            }
            None => {
                debug!("key {key:?} has no intent");
                false
            }
        }
    }

    pub fn handle_front_door_error(&self, code: i32, subcode: i32, message: &str) {
        error!("FrontDoor error ({code}-{subcode}) {message}");
    }

    // ── Commands ──────────────────────────────────────────────

    /// Process an administrative command.  Logging commands act on
    /// `registry`.
    pub fn handle_command(
        &mut self,
        cmd: ControllerCommand,
        registry: &LoggerRegistry,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            ControllerCommand::ForceState(target) => {
                warn!("forcing state {target}");
                let prev = self.hsm.current_state();
                self.hsm.change_state(target, &mut self.ctx);
                self.report_change(prev, sink);
            }
            ControllerCommand::SetLogLevel { facility, level } => {
                // An unregistered exact name still keeps the setting for
                // when it registers.
                if !registry.apply_setting(&facility, level) && !facility.ends_with('*') {
                    return Err(DPrintError::UnknownFacility(facility).into());
                }
            }
            ControllerCommand::LoggingStatus => {
                sink.emit(&ControllerEvent::LoggingStatus(
                    registry.current_logging_status(),
                ));
            }
            ControllerCommand::QueryState => {
                let path = self.hsm.path_from_top(self.state());
                sink.emit(&ControllerEvent::CurrentState(path));
            }
            ControllerCommand::SetHalt(halt) => {
                info!("halt {}", if halt { "set" } else { "cleared" });
                self.ctx.halt = halt;
            }
        }
        Ok(())
    }

    /// Route one mailbox message.  Returns false for
    /// [`ControllerMsg::Shutdown`].
    pub fn handle_message(
        &mut self,
        msg: ControllerMsg,
        registry: &LoggerRegistry,
        sink: &mut impl EventSink,
    ) -> bool {
        match msg {
            ControllerMsg::Event(event) => {
                self.dispatch(event, sink);
            }
            ControllerMsg::ModuleReady { module, ready } => {
                self.set_module_ready(module, ready, sink);
            }
            ControllerMsg::NetworkStatus(status) => self.handle_network_status(status, sink),
            ControllerMsg::LpmConnected(connected) => self.handle_lpm_connected(connected, sink),
            ControllerMsg::Key(key) => {
                self.handle_key_event(key, sink);
            }
            ControllerMsg::FrontDoorError {
                code,
                subcode,
                message,
            } => self.handle_front_door_error(code, subcode, &message),
            ControllerMsg::Command(cmd) => {
                if let Err(e) = self.handle_command(cmd, registry, sink) {
                    warn!("command failed: {e}");
                }
            }
            ControllerMsg::Shutdown => return false,
        }
        true
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current leaf.  [`StateId::Top`] before [`start`](Self::start).
    pub fn state(&self) -> StateId {
        self.hsm.current_state().unwrap_or(StateId::Top)
    }

    pub fn is_in(&self, id: StateId) -> bool {
        self.hsm.is_in(id)
    }

    pub fn is_started(&self) -> bool {
        self.hsm.is_initialized()
    }

    pub fn transition_count(&self) -> u64 {
        self.hsm.transition_count()
    }

    pub fn context(&self) -> &ProductContext<H> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ProductContext<H> {
        &mut self.ctx
    }

    pub fn hw(&self) -> &H {
        &self.ctx.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.ctx.hw
    }

    pub fn hsm(&self) -> &ProductHsm<H> {
        &self.hsm
    }

    // ── Internal ──────────────────────────────────────────────

    fn report_change(&self, prev: Option<StateId>, sink: &mut impl EventSink) {
        let now = self.hsm.current_state();
        if let (Some(from), Some(to)) = (prev, now) {
            if from != to {
                sink.emit(&ControllerEvent::StateChanged { from, to });
            }
        }
    }
}
