//! Infrastructure layer: entity store, credential hashing, engine services
//! and bootstrap seeding.

pub mod credentials;
pub mod seed;
pub mod services;
pub mod store;


pub use credentials::Argon2Credentials;
pub use services::{AccessEngine, Clock, ServiceError, ServiceResult, SystemClock};
pub use store::{EntityStore, InMemoryEntityStore, StoreError};
