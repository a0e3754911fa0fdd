//! Physics module for collision detection and response
//!
//! Provides broad-phase collision handling over a spatial hash, overlap
//! lifecycle tracking, layer/mask filtering and space queries.

pub mod collider;
pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod query;
pub mod registers;

#[cfg(test)]
mod tests;

pub use collider::{BodyHandle, Collider, ColliderHandle, ColliderShape, CollisionBody};
pub use collision::{Collision, CollisionInformation};
pub use collision_layers::{should_collide, CollisionLayer, CollisionMask, LayerOutOfRange};
pub use collision_system::{CollisionError, CollisionHandler, CollisionResponder};
pub use query::QueryInfo;
pub use registers::{ObjectRegister, OverlapRegister, RegisterChanges};
