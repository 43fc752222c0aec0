//! Realtime publish/subscribe abstraction (mechanics only).
//!
//! A bus fans every published message out to every live subscription.
//! Delivery is in publish order per subscription, with no deduplication and
//! no persistence: a subscriber only sees what was published while it was
//! subscribed.

use std::sync::mpsc::{Receiver, RecvError, TryRecvError};

/// A subscription to a bus.
///
/// Each subscription gets its own copy of every message published after it
/// was created. Meant for a single consumer thread.
///
/// ```ignore
/// let subscription = bus.subscribe();
/// while let Ok(message) = subscription.recv() {
///     forward(message);
/// }
/// // the bus was dropped
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    ///
    /// Fails once the bus itself is gone.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Transport-agnostic pub/sub bus.
///
/// `publish` may fail (poisoned lock, broken transport); the error goes back
/// to the caller, which decides whether the write that triggered it still
/// counts as successful.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}
