//! Live-connection registry abstraction (mechanics only).
//!
//! Connections are keyed by user identity. Broadcasting to a user fans a
//! message out to every connection that user currently holds.
//!
//! ## Delivery
//!
//! - **At-most-once** per connection: no acknowledgement, no retry
//! - **No backlog**: messages for users without a connection are discarded
//! - **Non-blocking**: `broadcast` only enqueues; transports drain the
//!   per-connection queue on their own task

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use uuid::Uuid;

use erpguard_core::UserId;

use crate::Notification;

/// Identifies one registered connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub user_id: UserId,
    pub connection_id: Uuid,
}

impl ChannelHandle {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            connection_id: Uuid::now_v7(),
        }
    }
}

/// Receiving end of a registered connection.
#[derive(Debug)]
pub struct Connection {
    handle: ChannelHandle,
    receiver: UnboundedReceiver<Notification>,
}

impl Connection {
    pub fn new(handle: ChannelHandle, receiver: UnboundedReceiver<Notification>) -> Self {
        Self { handle, receiver }
    }

    pub fn handle(&self) -> ChannelHandle {
        self.handle
    }

    /// Wait for the next message. `None` once the connection is deregistered.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }

    /// Take a message if one is queued.
    pub fn try_recv(&mut self) -> Result<Notification, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Registry of live connections keyed by user identity.
///
/// Implementations must be safe to share across request workers.
pub trait ChannelLayer: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    fn register(&self, user_id: UserId) -> Result<Connection, Self::Error>;

    /// Remove a connection. Unknown handles are ignored.
    fn deregister(&self, handle: &ChannelHandle);

    /// Enqueue `message` on every connection of `user_id`; returns how many
    /// connections accepted it.
    fn broadcast(&self, user_id: UserId, message: Notification) -> Result<usize, Self::Error>;

    fn connection_count(&self, user_id: UserId) -> usize;
}

impl<L> ChannelLayer for Arc<L>
where
    L: ChannelLayer + ?Sized,
{
    type Error = L::Error;

    fn register(&self, user_id: UserId) -> Result<Connection, Self::Error> {
        (**self).register(user_id)
    }

    fn deregister(&self, handle: &ChannelHandle) {
        (**self).deregister(handle)
    }

    fn broadcast(&self, user_id: UserId, message: Notification) -> Result<usize, Self::Error> {
        (**self).broadcast(user_id, message)
    }

    fn connection_count(&self, user_id: UserId) -> usize {
        (**self).connection_count(user_id)
    }
}
