//! Bounded inbound queue onto the controller task.
//!
//! Collaborator callbacks run on whatever thread the collaborator owns.
//! They [`post`](Mailbox::post) a [`ControllerMsg`]; the controller task
//! drains the queue with [`pump`](Mailbox::pump) (sync) or
//! [`run`](Mailbox::run) (async), so the state machine is only ever touched
//! from one task.
//!
//! ```text
//!  LPM thread ─┐
//!  net thread ─┼──▶ Channel<CriticalSectionRawMutex, ControllerMsg, N> ──▶ controller task
//!  key thread ─┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::dprint::LoggerRegistry;
use crate::error::MailboxError;
use crate::product::context::{Module, NetworkStatus};
use crate::product::events::Event;

use super::commands::ControllerCommand;
use super::controller::ProductController;
use super::ports::{Collaborators, EventSink, KeyEvent};

/// Default queue depth.
pub const MAILBOX_DEPTH: usize = 16;

/// Everything that can be posted to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerMsg {
    Event(Event),
    ModuleReady { module: Module, ready: bool },
    NetworkStatus(NetworkStatus),
    /// Outcome of [`LpmPort::connect`](super::ports::LpmPort::connect).
    LpmConnected(bool),
    Key(KeyEvent),
    FrontDoorError {
        code: i32,
        subcode: i32,
        message: String,
    },
    Command(ControllerCommand),
    /// Stop [`Mailbox::run`].
    Shutdown,
}

pub struct Mailbox<const N: usize = MAILBOX_DEPTH> {
    channel: Channel<CriticalSectionRawMutex, ControllerMsg, N>,
}

impl<const N: usize> Mailbox<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue `msg` without blocking.
    pub fn post(&self, msg: ControllerMsg) -> Result<(), MailboxError> {
        self.channel.try_send(msg).map_err(|_| {
            warn!("controller mailbox full, dropping message");
            MailboxError::Full
        })
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Handle every queued message.  Returns how many were handled; stops
    /// early after a [`ControllerMsg::Shutdown`].
    pub fn pump<H: Collaborators>(
        &self,
        controller: &mut ProductController<H>,
        registry: &LoggerRegistry,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.channel.try_receive() {
            handled += 1;
            if !controller.handle_message(msg, registry, sink) {
                break;
            }
        }
        handled
    }

    /// Wait for messages and handle them until [`ControllerMsg::Shutdown`].
    pub async fn run<H: Collaborators>(
        &self,
        controller: &mut ProductController<H>,
        registry: &LoggerRegistry,
        sink: &mut impl EventSink,
    ) {
        loop {
            let msg = self.channel.receive().await;
            if !controller.handle_message(msg, registry, sink) {
                return;
            }
        }
    }
}

impl<const N: usize> Default for Mailbox<N> {
    fn default() -> Self {
        Self::new()
    }
}
