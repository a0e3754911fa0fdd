//! # Shape Engine
//!
//! 2D shape geometry and broad-phase collision handling.
//!
//! ## Features
//!
//! - **Geometry Kernel**: overlap and contact points for every pair of
//!   point, circle, segment, triangle, rectangle, polygon and polyline
//! - **Spatial Hash**: uniform grid broad phase with candidate deduplication
//! - **Collision Handler**: deferred add/remove, first-contact tracking,
//!   overlap-ended notifications and swept projection
//! - **Space Queries**: intersection queries and cheap overlap casts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shape_engine::prelude::*;
//!
//! struct Bounce;
//!
//! impl CollisionResponder for Bounce {
//!     fn resolve_collision(&mut self, _handler: &mut CollisionHandler, info: &CollisionInformation) {
//!         if info.surface.valid {
//!             log::info!("hit surface with normal {:?}", info.surface.normal);
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), CollisionError> {
//!     let mut handler = CollisionHandler::from_config(&CollisionConfig::default())?;
//!     let ball = handler.add_body(
//!         CollisionBody::new(Transform2D::from_position(Vec2::new(100.0, 100.0)))
//!             .with_velocity(Vec2::new(200.0, 0.0))
//!             .with_responder(Box::new(Bounce)),
//!     );
//!     handler.attach_collider(ball, Collider::new(ColliderShape::Circle { radius: 8.0 }).with_intersections(true))?;
//!
//!     for _ in 0..60 {
//!         handler.update(1.0 / 60.0);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod debug;
pub mod foundation;
pub mod geometry;
pub mod physics;
pub mod spatial;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError},
        debug::{DebugDrawSystem, DebugShape},
        foundation::math::{Transform2D, Vec2, Vec2Ext, Vec4},
        geometry::{
            Circle, CollisionPoint, CollisionPoints, CollisionSurface, Intersection, Polygon, Polyline, Rect, Segment, Shape,
            Triangle,
        },
        physics::{
            BodyHandle, Collider, ColliderHandle, ColliderShape, Collision, CollisionBody, CollisionError, CollisionHandler,
            CollisionInformation, CollisionLayer, CollisionMask, CollisionResponder, QueryInfo,
        },
        spatial::SpatialHash,
    };
}
