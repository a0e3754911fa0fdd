//! Spatial partitioning for the broad phase
//!
//! A uniform grid is enough for the bounded, mostly evenly populated scenes
//! the collision handler manages.

pub mod spatial_hash;

pub use spatial_hash::SpatialHash;
