//! Debug visualization
//!
//! Renderer-agnostic command buffer for the debug hooks of the spatial hash
//! and the collision handler.

pub mod draw;

pub use draw::{DebugDrawSystem, DebugShape};
