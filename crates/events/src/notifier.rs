use thiserror::Error;

use erpguard_core::UserId;

use crate::channel::{ChannelHandle, ChannelLayer, Connection};
use crate::Notification;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("unauthenticated connection rejected")]
    Unauthenticated,

    #[error("channel layer unavailable: {0}")]
    Unavailable(String),
}

/// Pushes permission-set changes to a user's live connections.
///
/// Notification is fire-and-forget: it never fails the operation that
/// triggered it, and users without a live connection are simply skipped.
#[derive(Debug, Clone)]
pub struct ChangeNotifier<L> {
    layer: L,
}

impl<L: ChannelLayer> ChangeNotifier<L> {
    pub fn new(layer: L) -> Self {
        Self { layer }
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    /// Register a live connection. Anonymous callers are rejected before
    /// anything is tracked.
    pub fn connect(&self, user_id: Option<UserId>) -> Result<Connection, ConnectError> {
        let user_id = user_id.ok_or(ConnectError::Unauthenticated)?;
        let conn = self
            .layer
            .register(user_id)
            .map_err(|e| ConnectError::Unavailable(e.to_string()))?;
        tracing::debug!(%user_id, connection_id = %conn.handle().connection_id, "live connection registered");
        Ok(conn)
    }

    pub fn disconnect(&self, handle: &ChannelHandle) {
        self.layer.deregister(handle);
        tracing::debug!(user_id = %handle.user_id, connection_id = %handle.connection_id, "live connection deregistered");
    }

    pub fn notify_permission_change(&self, user_id: UserId, permissions: Vec<String>) {
        let message = Notification::permission_update(user_id, permissions);
        match self.layer.broadcast(user_id, message) {
            Ok(0) => tracing::debug!(%user_id, "no live connection for permission update"),
            Ok(delivered) => tracing::debug!(%user_id, delivered, "permission update pushed"),
            Err(e) => tracing::warn!(%user_id, error = %e, "permission update not delivered"),
        }
    }
}
