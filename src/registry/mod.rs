//! Canonical entity state: records, partial updates and the registry itself

pub mod entity;
pub mod store;

pub use entity::{Entity, EntityUpdate};
pub use store::{Registry, RegistryChange, RegistryReceiver, RegistrySnapshot, UpsertOutcome};
