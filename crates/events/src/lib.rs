//! Real-time permission-change notification.
//!
//! - `channel`: live-connection registry abstraction (register/deregister/broadcast)
//! - `in_memory_channel`: process-local implementation
//! - `notifier`: the change notifier used by role-assignment operations
//! - `message`: wire payloads pushed to clients

pub mod channel;
pub mod in_memory_channel;
pub mod message;
pub mod notifier;

pub use channel::{ChannelHandle, ChannelLayer, Connection};
pub use in_memory_channel::{InMemoryChannelError, InMemoryChannelLayer};
pub use message::Notification;
pub use notifier::{ChangeNotifier, ConnectError};
