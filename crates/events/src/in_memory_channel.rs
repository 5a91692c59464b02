//! In-process channel layer.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

use erpguard_core::UserId;

use crate::channel::{ChannelHandle, ChannelLayer, Connection};
use crate::Notification;

#[derive(Debug, Error)]
pub enum InMemoryChannelError {
    /// Internal lock poisoning.
    #[error("channel registry lock poisoned")]
    Poisoned,
}

/// Process-local connection registry.
///
/// - No IO
/// - Best-effort fan-out over unbounded per-connection queues
/// - Connections whose receiver was dropped are pruned on the next broadcast
#[derive(Debug, Default)]
pub struct InMemoryChannelLayer {
    connections: Mutex<HashMap<UserId, Vec<(Uuid, UnboundedSender<Notification>)>>>,
}

impl InMemoryChannelLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelLayer for InMemoryChannelLayer {
    type Error = InMemoryChannelError;

    fn register(&self, user_id: UserId) -> Result<Connection, Self::Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ChannelHandle::new(user_id);

        let mut conns = self
            .connections
            .lock()
            .map_err(|_| InMemoryChannelError::Poisoned)?;
        conns
            .entry(user_id)
            .or_default()
            .push((handle.connection_id, tx));

        Ok(Connection::new(handle, rx))
    }

    fn deregister(&self, handle: &ChannelHandle) {
        let Ok(mut conns) = self.connections.lock() else {
            return;
        };

        if let Some(list) = conns.get_mut(&handle.user_id) {
            list.retain(|(id, _)| *id != handle.connection_id);
            if list.is_empty() {
                conns.remove(&handle.user_id);
            }
        }
    }

    fn broadcast(&self, user_id: UserId, message: Notification) -> Result<usize, Self::Error> {
        let mut conns = self
            .connections
            .lock()
            .map_err(|_| InMemoryChannelError::Poisoned)?;

        let Some(list) = conns.get_mut(&user_id) else {
            return Ok(0);
        };

        // Drop any dead connections while publishing.
        list.retain(|(_, tx)| tx.send(message.clone()).is_ok());
        let delivered = list.len();
        if list.is_empty() {
            conns.remove(&user_id);
        }

        Ok(delivered)
    }

    fn connection_count(&self, user_id: UserId) -> usize {
        self.connections
            .lock()
            .map(|conns| conns.get(&user_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(user_id: UserId) -> Notification {
        Notification::permission_update(user_id, vec!["VIEW_USERS".to_string()])
    }

    #[test]
    fn broadcast_reaches_every_connection_of_the_user() {
        let layer = InMemoryChannelLayer::new();
        let user = UserId::new();
        let mut tab_a = layer.register(user).unwrap();
        let mut tab_b = layer.register(user).unwrap();

        assert_eq!(layer.broadcast(user, update(user)).unwrap(), 2);
        assert_eq!(tab_a.try_recv().unwrap(), update(user));
        assert_eq!(tab_b.try_recv().unwrap(), update(user));
    }

    #[test]
    fn broadcast_is_isolated_per_user() {
        let layer = InMemoryChannelLayer::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let mut bob_conn = layer.register(bob).unwrap();

        assert_eq!(layer.broadcast(alice, update(alice)).unwrap(), 0);
        assert!(bob_conn.try_recv().is_err());
    }

    #[test]
    fn deregistered_connections_stop_receiving() {
        let layer = InMemoryChannelLayer::new();
        let user = UserId::new();
        let conn = layer.register(user).unwrap();

        layer.deregister(&conn.handle());
        assert_eq!(layer.connection_count(user), 0);
        assert_eq!(layer.broadcast(user, update(user)).unwrap(), 0);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let layer = InMemoryChannelLayer::new();
        let user = UserId::new();
        drop(layer.register(user).unwrap());
        let _live = layer.register(user).unwrap();

        assert_eq!(layer.broadcast(user, update(user)).unwrap(), 1);
        assert_eq!(layer.connection_count(user), 1);
    }
}
