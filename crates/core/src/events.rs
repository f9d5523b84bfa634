//! Event System
//!
//! Provides a pub/sub event bus so a renderer can learn which lines
//! changed without polling the whole document.

use parking_lot::RwLock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Events emitted while the document is edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The flattened text of a line was recomputed
    LineRefreshed { line: usize },
    /// A new line was inserted at this index; later lines shifted down
    LineInserted { line: usize },
    /// The cursor moved; `offset` counts the characters to its left
    CursorMoved { line: usize, offset: usize },
    /// An edit was rejected and the document left unchanged
    EditRejected { message: String },
    /// The editing session is ending
    Shutdown,
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Receive the next event (blocking)
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every event that is already queued
    pub fn drain(&self) -> impl Iterator<Item = Event> + '_ {
        self.receiver.try_iter()
    }
}

/// Fan-out of editor events to every live subscription
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// A bus with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Open a new subscription; it sees every event emitted from now on
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Send `event` to every subscription and return how many received it.
    ///
    /// Subscriptions whose receiver was dropped are forgotten.
    pub fn emit(&self, event: Event) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());

        let delivered = subscribers.len();
        debug!(?event, delivered, "Event emitted");
        delivered
    }

    /// Number of subscriptions still attached
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
