//! Hierarchical state machine engine.
//!
//! States form a tree under a single Top.  Exactly one leaf is current.
//!
//! ```text
//!              Top
//!            /     \
//!          A         B          change_state(B1) while leaf = A2:
//!         / \         \           exit  A2, A        (child -> parent)
//!       A1   A2        B1         enter B, B1        (parent -> child)
//!                                 start B, B1        (parent -> child)
//! ```
//!
//! Two dispatch entry points exist.  [`Hsm::handle`] calls the current
//! leaf's most derived handler and nothing else.  [`Hsm::dispatch`] walks
//! every handler layer of the leaf, then of its superstate, and so on up to
//! Top, stopping at the first layer that reports [`Outcome::Handled`].
//!
//! Handlers and actions request transitions through [`Transitions`]; the
//! engine applies them after the running handler or transition returns,
//! in request order.

pub mod state;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use log::{debug, error, info};
use thiserror::Error;

pub use state::{
    ActionFn, HandlerFn, HandlerTable, Outcome, StateBuilder, StateDef, TRANSITION_QUEUE_DEPTH,
    Transitions,
};

// ---------------------------------------------------------------------------
// Key and event traits
// ---------------------------------------------------------------------------

/// Identity of a state.  Raw value 0 is reserved for Top.
pub trait StateKey: Copy + Eq + Hash + fmt::Debug {
    fn raw(self) -> u16;
    fn name(self) -> &'static str;
}

/// An event the machine can dispatch.  Every event belongs to one kind;
/// handler tables have one slot per kind.
pub trait HsmEvent: fmt::Debug {
    const KIND_COUNT: usize;
    fn kind_index(&self) -> usize;
}

/// Upper bound on transitions applied back to back from one request.
/// Hitting it means two states keep handing control to each other.
pub const MAX_CHAINED_TRANSITIONS: usize = 32;

// ---------------------------------------------------------------------------
// Structural errors
// ---------------------------------------------------------------------------

/// Problems found by [`Hsm::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HsmError<S: fmt::Debug> {
    #[error("no root state registered")]
    NoTop,
    #[error("more than one root state: {first:?} and {second:?}")]
    MultipleTops { first: S, second: S },
    #[error("state {state:?} names unregistered superstate {parent:?}")]
    UnknownParent { state: S, parent: S },
    #[error("superstate chain of {state:?} does not terminate at the root")]
    Cycle { state: S },
}

#[track_caller]
fn fatal(msg: &str) -> ! {
    error!("HSM fatal: {msg}");
    panic!("HSM fatal: {msg}");
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Phase {
    Enter,
    Start,
    Exit,
}

/// The hierarchical state machine.
///
/// Owns the state table and the current leaf.  The context `C` is owned by
/// the caller and threaded through every action and handler.
pub struct Hsm<S, E, C> {
    states: HashMap<S, StateDef<S, E, C>>,
    current: Option<S>,
    transition_count: u64,
}

impl<S: StateKey, E: HsmEvent, C> Hsm<S, E, C> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            current: None,
            transition_count: 0,
        }
    }

    // ── Registration ──────────────────────────────────────────

    /// Register a state.  Registering an id twice is fatal, as is adding
    /// states once the machine has been initialised.
    pub fn add_state(&mut self, def: StateDef<S, E, C>) {
        if self.current.is_some() {
            fatal(&format!("add_state({:?}) after init", def.id));
        }
        if let Some(existing) = self.states.get(&def.id) {
            fatal(&format!(
                "duplicate state id {:?} ({} already registered as {})",
                def.id,
                def.id.raw(),
                existing.name
            ));
        }
        debug!("HSM registered state {} ({})", def.name, def.id.raw());
        self.states.insert(def.id, def);
    }

    pub fn contains(&self, id: S) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: S) -> Option<&StateDef<S, E, C>> {
        self.states.get(&id)
    }

    /// Check the tree: one root, every superstate registered, every chain
    /// finite and ending at the root.  Returns the root on success.
    pub fn validate(&self) -> Result<S, HsmError<S>> {
        let mut top: Option<S> = None;
        for def in self.states.values() {
            match def.parent {
                None => match top {
                    None => top = Some(def.id),
                    Some(first) => {
                        return Err(HsmError::MultipleTops {
                            first,
                            second: def.id,
                        });
                    }
                },
                Some(parent) if !self.states.contains_key(&parent) => {
                    return Err(HsmError::UnknownParent {
                        state: def.id,
                        parent,
                    });
                }
                Some(_) => {}
            }
        }
        let top = top.ok_or(HsmError::NoTop)?;

        for &id in self.states.keys() {
            let mut cursor = id;
            let mut steps = 0;
            while cursor != top {
                steps += 1;
                match self.states.get(&cursor).and_then(|d| d.parent) {
                    Some(parent) if steps <= self.states.len() => cursor = parent,
                    _ => return Err(HsmError::Cycle { state: id }),
                }
            }
        }
        Ok(top)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Make `initial` the current leaf and run enter, then start, on every
    /// state along the Top → `initial` path.
    pub fn init(&mut self, initial: S, ctx: &mut C) {
        if let Some(current) = self.current {
            fatal(&format!(
                "init({initial:?}) called twice (current {current:?})"
            ));
        }
        if !self.contains(initial) {
            fatal(&format!("init with unregistered state {initial:?}"));
        }
        if let Err(e) = self.validate() {
            fatal(&format!("invalid state table: {e}"));
        }

        info!("HSM starting in state: {}", self.name_of(initial));
        let path = self.path_from_top(initial);
        self.current = Some(initial);

        let mut tx = Transitions::new();
        for &id in &path {
            self.run(id, Phase::Enter, ctx, &mut tx);
        }
        for &id in &path {
            self.run(id, Phase::Start, ctx, &mut tx);
        }
        self.drain(ctx, &mut tx);
    }

    /// Transition to `target`.  Unregistered targets and calls before
    /// [`init`](Self::init) are fatal.
    pub fn change_state(&mut self, target: S, ctx: &mut C) {
        let mut tx = Transitions::new();
        tx.change_state(target);
        self.drain(ctx, &mut tx);
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Call the current leaf's handler for `event` and return its result
    /// unmodified.  No other state is consulted.  A leaf with no handler
    /// for the event kind yields `false`.
    pub fn handle(&mut self, event: &E, ctx: &mut C) -> bool {
        let leaf = self.leaf("handle");
        let kind = event.kind_index();
        let mut tx = Transitions::new();
        let outcome = match self.states.get(&leaf).and_then(|d| d.handler(kind)) {
            Some(handler) => handler(event, ctx, &mut tx),
            None => Outcome::NotHandled,
        };
        self.drain(ctx, &mut tx);
        outcome.is_handled()
    }

    /// Offer `event` to every handler layer from the leaf up to Top,
    /// stopping at the first [`Outcome::Handled`].
    pub fn dispatch(&mut self, event: &E, ctx: &mut C) -> Outcome {
        let leaf = self.leaf("dispatch");
        let kind = event.kind_index();
        let mut tx = Transitions::new();
        let mut outcome = Outcome::NotHandled;

        let mut cursor = Some(leaf);
        'walk: while let Some(id) = cursor {
            let Some(def) = self.states.get(&id) else {
                break;
            };
            for layer in &def.layers {
                if let Some(handler) = layer.get(kind) {
                    if handler(event, ctx, &mut tx).is_handled() {
                        debug!("HSM {:?} handled by {}", event, def.name);
                        outcome = Outcome::Handled;
                        break 'walk;
                    }
                }
            }
            cursor = def.parent;
        }

        if !outcome.is_handled() {
            debug!(
                "HSM {:?} not handled in {}",
                event,
                self.name_of(leaf)
            );
        }
        self.drain(ctx, &mut tx);
        outcome
    }

    // ── Queries ───────────────────────────────────────────────

    /// The current leaf, or `None` before [`init`](Self::init).
    pub fn current_state(&self) -> Option<S> {
        self.current
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// True when `id` is the current leaf or one of its superstates.
    pub fn is_in(&self, id: S) -> bool {
        self.current
            .is_some_and(|leaf| self.path_from_top(leaf).contains(&id))
    }

    /// Number of completed transitions since init.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    pub fn name_of(&self, id: S) -> &'static str {
        self.states.get(&id).map_or_else(|| id.name(), |d| d.name)
    }

    /// Path from the root down to `id`, root first.
    pub fn path_from_top(&self, id: S) -> Vec<S> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if path.len() > self.states.len() {
                fatal(&format!("superstate cycle through {id:?}"));
            }
            path.push(current);
            cursor = self.states.get(&current).and_then(|d| d.parent);
        }
        path.reverse();
        path
    }

    /// Deepest state present on both root paths.
    pub fn common_ancestor(&self, a: S, b: S) -> Option<S> {
        let pa = self.path_from_top(a);
        let pb = self.path_from_top(b);
        pa.iter()
            .zip(pb.iter())
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| *x)
    }

    // ── Internal ──────────────────────────────────────────────

    fn leaf(&self, op: &str) -> S {
        match self.current {
            Some(leaf) => leaf,
            None => fatal(&format!("{op} called before init")),
        }
    }

    fn run(&self, id: S, phase: Phase, ctx: &mut C, tx: &mut Transitions<S>) {
        let Some(def) = self.states.get(&id) else {
            return;
        };
        let action = match phase {
            Phase::Enter => def.on_enter,
            Phase::Start => def.on_start,
            Phase::Exit => def.on_exit,
        };
        if let Some(action) = action {
            debug!("HSM {:?} {}", phase, def.name);
            action(ctx, tx);
        }
    }

    /// Apply queued requests until none remain.
    fn drain(&mut self, ctx: &mut C, tx: &mut Transitions<S>) {
        let mut chained = 0;
        while let Some(target) = tx.pop() {
            chained += 1;
            if chained > MAX_CHAINED_TRANSITIONS {
                fatal(&format!(
                    "more than {MAX_CHAINED_TRANSITIONS} chained transitions (last target {target:?})"
                ));
            }
            self.transition(target, ctx, tx);
        }
    }

    fn transition(&mut self, target: S, ctx: &mut C, tx: &mut Transitions<S>) {
        let current = self.leaf("change_state");
        if !self.contains(target) {
            fatal(&format!("change_state to unregistered state {target:?}"));
        }

        let from = self.path_from_top(current);
        let to = self.path_from_top(target);
        let shared = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        info!(
            "HSM transition: {} -> {}",
            self.name_of(current),
            self.name_of(target)
        );

        for &id in from[shared..].iter().rev() {
            self.run(id, Phase::Exit, ctx, tx);
        }

        self.current = Some(target);
        self.transition_count += 1;

        for &id in &to[shared..] {
            self.run(id, Phase::Enter, ctx, tx);
        }
        for &id in &to[shared..] {
            self.run(id, Phase::Start, ctx, tx);
        }
    }
}

impl<S: StateKey, E: HsmEvent, C> Default for Hsm<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}
