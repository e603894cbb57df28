//! `bistro-core` — foundation building blocks for the console core.
//!
//! This crate contains **pure** primitives shared by the stores: the error
//! model, sequential ids, and the injected clock and key-value storage.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod storage;
pub mod value_object;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, MenuItemId, UserId};
pub use storage::{InMemoryKeyValueStore, KeyValueStore};
pub use value_object::ValueObject;
