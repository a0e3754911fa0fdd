//! Collision layers and masks
//!
//! Every collider carries exactly one [`CollisionLayer`] and a
//! [`CollisionMask`] listing the layers it reacts to. The handler only
//! checks the mask of the collider it is processing, so the relation is one
//! way: a sensor can see a wall without the wall seeing the sensor.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Single layer tag (bit index `0..32`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CollisionLayer(u8);

/// Layer index outside `0..32`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("collision layer index {0} is out of range (0..32)")]
pub struct LayerOutOfRange(pub u8);

impl TryFrom<u8> for CollisionLayer {
    type Error = LayerOutOfRange;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index < 32 {
            Ok(Self(index))
        } else {
            Err(LayerOutOfRange(index))
        }
    }
}

impl From<CollisionLayer> for u8 {
    fn from(layer: CollisionLayer) -> Self {
        layer.0
    }
}

impl CollisionLayer {
    /// Player character layer
    pub const PLAYER: Self = Self(0);

    /// Enemy character layer
    pub const ENEMY: Self = Self(1);

    /// Projectiles (bullets, missiles, etc.)
    pub const PROJECTILE: Self = Self(2);

    /// Static environment geometry
    pub const ENVIRONMENT: Self = Self(3);

    /// Trigger volumes (no physical response)
    pub const TRIGGER: Self = Self(4);

    /// Debris and small physics objects
    pub const DEBRIS: Self = Self(5);

    /// Pickups and collectibles
    pub const PICKUP: Self = Self(6);

    /// User-defined layer; indices above 31 wrap around
    pub const fn custom(index: u8) -> Self {
        Self(index % 32)
    }

    /// Bit index of this layer
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Mask containing only this layer
    pub const fn mask(self) -> CollisionMask {
        CollisionMask::from_bits_retain(1 << self.0)
    }
}

bitflags! {
    /// Set of layers a collider reacts to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionMask: u32 {
        /// Player character layer
        const PLAYER = 1 << 0;
        /// Enemy character layer
        const ENEMY = 1 << 1;
        /// Projectiles
        const PROJECTILE = 1 << 2;
        /// Static environment geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger volumes
        const TRIGGER = 1 << 4;
        /// Debris
        const DEBRIS = 1 << 5;
        /// Pickups
        const PICKUP = 1 << 6;

        // custom layers
        const _ = !0;
    }
}

impl CollisionMask {
    /// Does the mask contain `layer`
    pub const fn has(self, layer: CollisionLayer) -> bool {
        self.bits() & layer.mask().bits() != 0
    }

    /// Mask from a list of layers
    pub fn from_layers(layers: &[CollisionLayer]) -> Self {
        layers.iter().fold(Self::empty(), |acc, layer| acc | layer.mask())
    }

    /// Mask with `layer` added
    #[must_use]
    pub const fn with(self, layer: CollisionLayer) -> Self {
        self.union(layer.mask())
    }

    /// Mask with `layer` removed
    #[must_use]
    pub const fn without(self, layer: CollisionLayer) -> Self {
        self.difference(layer.mask())
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::all()
    }
}

impl From<CollisionLayer> for CollisionMask {
    fn from(layer: CollisionLayer) -> Self {
        layer.mask()
    }
}

/// Two-way test: each side's layer must be in the other side's mask
pub fn should_collide(layer_a: CollisionLayer, mask_a: CollisionMask, layer_b: CollisionLayer, mask_b: CollisionMask) -> bool {
    mask_b.has(layer_a) && mask_a.has(layer_b)
}
