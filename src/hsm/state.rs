//! State descriptors, handler layers and the builder that merges them.
//!
//! A state is plain data: its id, its superstate, three optional action
//! fn pointers and a stack of handler tables.  Each table has one optional
//! slot per event kind.  Building a product state from a generic one does
//! not subclass anything; the product overrides become a new table stacked
//! in front of the generic table:
//!
//! ```text
//!   StateDef(PlayingSelected)
//!   ┌──────────────────────────────────────────────────────┐
//!   │ on_enter / on_start / on_exit   (override replaces)   │
//!   │ layer 0  product overrides   [kind] -> Option<fn>     │
//!   │ layer 1  generic base        [kind] -> Option<fn>     │
//!   └──────────────────────────────────────────────────────┘
//! ```

use log::error;

use super::{HsmEvent, StateKey};

// ---------------------------------------------------------------------------
// Handler result
// ---------------------------------------------------------------------------

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The event is consumed; the dispatcher stops here.
    Handled,
    /// The handler declined; the dispatcher moves to the next layer.
    NotHandled,
}

impl Outcome {
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

impl From<bool> for Outcome {
    fn from(handled: bool) -> Self {
        if handled { Self::Handled } else { Self::NotHandled }
    }
}

impl From<Outcome> for bool {
    fn from(outcome: Outcome) -> Self {
        outcome.is_handled()
    }
}

// ---------------------------------------------------------------------------
// Transition requests
// ---------------------------------------------------------------------------

/// Maximum number of transitions a single handler or transition may queue.
pub const TRANSITION_QUEUE_DEPTH: usize = 8;

/// Transition requests collected while an action or handler runs.
///
/// Handlers never mutate the machine directly.  They record the target
/// here and the engine applies the requests in order once the running
/// transition or handler has returned.
pub struct Transitions<S> {
    queue: heapless::Deque<S, TRANSITION_QUEUE_DEPTH>,
}

impl<S: StateKey> Transitions<S> {
    pub fn new() -> Self {
        Self {
            queue: heapless::Deque::new(),
        }
    }

    /// Request a transition to `target`.
    pub fn change_state(&mut self, target: S) {
        if self.queue.push_back(target).is_err() {
            error!(
                "HSM transition queue overflow while requesting {}",
                target.name()
            );
            panic!(
                "HSM transition queue overflow ({} pending) while requesting {:?}",
                TRANSITION_QUEUE_DEPTH, target
            );
        }
    }

    /// Number of requests not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn pop(&mut self) -> Option<S> {
        self.queue.pop_front()
    }
}

impl<S: StateKey> Default for Transitions<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter`, `on_start` and `on_exit`.
pub type ActionFn<S, C> = fn(&mut C, &mut Transitions<S>);

/// Signature for an event handler.
pub type HandlerFn<S, E, C> = fn(&E, &mut C, &mut Transitions<S>) -> Outcome;

// ---------------------------------------------------------------------------
// Handler table (one layer)
// ---------------------------------------------------------------------------

/// One layer of event handlers, indexed by event kind.
pub struct HandlerTable<S, E, C> {
    slots: Vec<Option<HandlerFn<S, E, C>>>,
}

impl<S, E: HsmEvent, C> HandlerTable<S, E, C> {
    pub fn new() -> Self {
        Self {
            slots: vec![None; E::KIND_COUNT],
        }
    }

    pub fn set(&mut self, kind: usize, handler: HandlerFn<S, E, C>) {
        assert!(
            kind < E::KIND_COUNT,
            "event kind {kind} out of range (KIND_COUNT = {})",
            E::KIND_COUNT
        );
        self.slots[kind] = Some(handler);
    }

    pub fn get(&self, kind: usize) -> Option<HandlerFn<S, E, C>> {
        self.slots.get(kind).copied().flatten()
    }

    /// Number of kinds this layer has a handler for.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S, E: HsmEvent, C> Default for HandlerTable<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E, C> Clone for HandlerTable<S, E, C> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// State descriptor
// ---------------------------------------------------------------------------

/// Descriptor for one node of the state tree.
pub struct StateDef<S, E, C> {
    pub(crate) id: S,
    pub(crate) name: &'static str,
    pub(crate) parent: Option<S>,
    pub(crate) on_enter: Option<ActionFn<S, C>>,
    pub(crate) on_start: Option<ActionFn<S, C>>,
    pub(crate) on_exit: Option<ActionFn<S, C>>,
    /// Most derived layer first.
    pub(crate) layers: Vec<HandlerTable<S, E, C>>,
}

impl<S: StateKey, E: HsmEvent, C> StateDef<S, E, C> {
    pub fn id(&self) -> S {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Superstate, `None` only for Top.
    pub fn parent(&self) -> Option<S> {
        self.parent
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> impl Iterator<Item = &HandlerTable<S, E, C>> {
        self.layers.iter()
    }

    /// The most derived handler for `kind`, if any layer defines one.
    pub fn handler(&self, kind: usize) -> Option<HandlerFn<S, E, C>> {
        self.layers.iter().find_map(|layer| layer.get(kind))
    }

    pub fn on_enter(&self) -> Option<ActionFn<S, C>> {
        self.on_enter
    }

    pub fn on_start(&self) -> Option<ActionFn<S, C>> {
        self.on_start
    }

    pub fn on_exit(&self) -> Option<ActionFn<S, C>> {
        self.on_exit
    }
}

impl<S: Clone, E, C> Clone for StateDef<S, E, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name,
            parent: self.parent.clone(),
            on_enter: self.on_enter,
            on_start: self.on_start,
            on_exit: self.on_exit,
            layers: self.layers.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Composes a [`StateDef`], optionally on top of a base definition.
///
/// Actions set on the builder replace the base actions.  Handlers set on
/// the builder go into a fresh layer that sits in front of every base layer.
pub struct StateBuilder<S, E, C> {
    base: StateDef<S, E, C>,
    own: HandlerTable<S, E, C>,
}

impl<S: StateKey, E: HsmEvent, C> StateBuilder<S, E, C> {
    /// Start an empty definition for `id`, parented to nothing.
    pub fn new(id: S) -> Self {
        Self {
            base: StateDef {
                id,
                name: id.name(),
                parent: None,
                on_enter: None,
                on_start: None,
                on_exit: None,
                layers: Vec::new(),
            },
            own: HandlerTable::new(),
        }
    }

    /// Start from `base`, keeping its id, name, parent, actions and layers.
    pub fn from_base(base: StateDef<S, E, C>) -> Self {
        Self {
            base,
            own: HandlerTable::new(),
        }
    }

    pub fn parent(mut self, parent: S) -> Self {
        self.base.parent = Some(parent);
        self
    }

    /// Mark this state as the root of the tree.
    pub fn root(mut self) -> Self {
        self.base.parent = None;
        self
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.base.name = name;
        self
    }

    pub fn on_enter(mut self, action: ActionFn<S, C>) -> Self {
        self.base.on_enter = Some(action);
        self
    }

    pub fn on_start(mut self, action: ActionFn<S, C>) -> Self {
        self.base.on_start = Some(action);
        self
    }

    pub fn on_exit(mut self, action: ActionFn<S, C>) -> Self {
        self.base.on_exit = Some(action);
        self
    }

    pub fn handle(mut self, kind: impl Into<usize>, handler: HandlerFn<S, E, C>) -> Self {
        self.own.set(kind.into(), handler);
        self
    }

    pub fn build(self) -> StateDef<S, E, C> {
        let mut def = self.base;
        if !self.own.is_empty() {
            def.layers.insert(0, self.own);
        }
        def
    }
}
