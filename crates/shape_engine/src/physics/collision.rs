//! Collision records handed to responders
//!
//! A [`Collision`] describes one overlapping pair as seen from one collider;
//! a [`CollisionInformation`] bundles every collision one collider had in a
//! frame together with a single averaged contact surface.

use std::collections::BTreeSet;

use crate::foundation::math::Vec2;
use crate::geometry::{CollisionPoints, CollisionSurface, Intersection};
use crate::physics::collider::{BodyHandle, ColliderHandle};

/// One overlapping pair, from the point of view of `collider`
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// Collider that owns this record
    pub collider: ColliderHandle,

    /// Collider it overlaps
    pub other: ColliderHandle,

    /// True when the pair did not overlap in the previous update
    pub first_contact: bool,

    /// Velocity of `collider`'s body
    pub self_velocity: Vec2,

    /// Velocity of `other`'s body (zero for standalone colliders)
    pub other_velocity: Vec2,

    /// Contacts on `other`, invalid when intersections were not requested
    pub intersection: Intersection,
}

impl Collision {
    /// Overlap without contact data
    pub fn new(collider: ColliderHandle, other: ColliderHandle, first_contact: bool, self_velocity: Vec2, other_velocity: Vec2) -> Self {
        Self {
            collider,
            other,
            first_contact,
            self_velocity,
            other_velocity,
            intersection: Intersection::default(),
        }
    }

    /// Overlap with contacts; back-facing contacts relative to
    /// `self_velocity` are left out of the surface
    pub fn with_points(
        collider: ColliderHandle,
        other: ColliderHandle,
        first_contact: bool,
        self_velocity: Vec2,
        other_velocity: Vec2,
        points: CollisionPoints,
    ) -> Self {
        Self {
            intersection: Intersection::new(points, self_velocity),
            ..Self::new(collider, other, first_contact, self_velocity, other_velocity)
        }
    }
}

/// Every collision of one collider during one update
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionInformation {
    /// Collider the collisions belong to
    pub collider: ColliderHandle,

    /// Body owning `collider`
    pub body: Option<BodyHandle>,

    /// Collisions in candidate order
    pub collisions: Vec<Collision>,

    /// Average of the first-contact surfaces; invalid when none contributed
    /// or intersections were not computed
    pub surface: CollisionSurface,
}

impl CollisionInformation {
    /// Bundle `collisions` and average their first-contact surfaces
    pub fn new(collider: ColliderHandle, body: Option<BodyHandle>, collisions: Vec<Collision>, computes_intersections: bool) -> Self {
        let surface = if computes_intersections {
            CollisionSurface::average(
                collisions
                    .iter()
                    .filter(|c| c.first_contact && c.intersection.valid && c.intersection.surface.valid)
                    .map(|c| (&c.intersection.surface.point, &c.intersection.surface.normal)),
            )
        } else {
            CollisionSurface::invalid()
        };
        Self {
            collider,
            body,
            collisions,
            surface,
        }
    }

    /// Collisions matching `predicate`
    pub fn filter_collisions<P>(&self, predicate: P) -> Vec<&Collision>
    where
        P: Fn(&Collision) -> bool,
    {
        self.collisions.iter().filter(|c| predicate(*c)).collect()
    }

    /// Distinct other colliders matching `predicate`
    pub fn filter_colliders<P>(&self, predicate: P) -> BTreeSet<ColliderHandle>
    where
        P: Fn(ColliderHandle) -> bool,
    {
        self.collisions.iter().map(|c| c.other).filter(|other| predicate(*other)).collect()
    }

    /// Every distinct other collider
    pub fn all_colliders(&self) -> BTreeSet<ColliderHandle> {
        self.collisions.iter().map(|c| c.other).collect()
    }

    /// Collisions that started this update
    pub fn first_contact_collisions(&self) -> Vec<&Collision> {
        self.filter_collisions(|c| c.first_contact)
    }

    /// Other colliders touched for the first time this update
    pub fn first_contact_colliders(&self) -> BTreeSet<ColliderHandle> {
        self.collisions.iter().filter(|c| c.first_contact).map(|c| c.other).collect()
    }

    /// Is `other` among the overlapped colliders
    pub fn contains_collider(&self, other: ColliderHandle) -> bool {
        self.collisions.iter().any(|c| c.other == other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CollisionPoint;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn handles(count: usize) -> Vec<ColliderHandle> {
        let mut arena: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    fn hit(collider: ColliderHandle, other: ColliderHandle, first: bool, point: Vec2, normal: Vec2) -> Collision {
        let points = CollisionPoints(vec![CollisionPoint::new(point, normal)]);
        Collision::with_points(collider, other, first, Vec2::new(1.0, 0.0), Vec2::zeros(), points)
    }

    #[test]
    fn test_surface_averages_first_contacts_only() {
        let h = handles(4);
        let collisions = vec![
            hit(h[0], h[1], true, Vec2::new(0.0, 0.0), Vec2::new(-1.0, 0.0)),
            hit(h[0], h[2], true, Vec2::new(2.0, 2.0), Vec2::new(0.0, -1.0)),
            hit(h[0], h[3], false, Vec2::new(100.0, 100.0), Vec2::new(-1.0, 0.0)),
        ];
        let info = CollisionInformation::new(h[0], None, collisions, true);
        assert!(info.surface.valid);
        assert_relative_eq!(info.surface.point, Vec2::new(1.0, 1.0), epsilon = 1e-6);
        let expected = Vec2::new(-1.0, -1.0).normalize();
        assert_relative_eq!(info.surface.normal, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_back_facing_contacts_are_dropped_from_surface() {
        let h = handles(2);
        // moving along +x, a normal along +x faces away from the motion
        let collision = hit(h[0], h[1], true, Vec2::new(3.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(collision.intersection.valid);
        assert!(!collision.intersection.surface.valid);

        let info = CollisionInformation::new(h[0], None, vec![collision], true);
        assert!(!info.surface.valid);
    }

    #[test]
    fn test_surface_invalid_without_intersections() {
        let h = handles(2);
        let info = CollisionInformation::new(h[0], None, vec![Collision::new(h[0], h[1], true, Vec2::zeros(), Vec2::zeros())], false);
        assert!(!info.surface.valid);
        assert!(!info.collisions[0].intersection.valid);
    }

    #[test]
    fn test_collider_helpers() {
        let h = handles(4);
        let collisions = vec![
            Collision::new(h[0], h[1], true, Vec2::zeros(), Vec2::zeros()),
            Collision::new(h[0], h[2], false, Vec2::zeros(), Vec2::zeros()),
            Collision::new(h[0], h[2], false, Vec2::zeros(), Vec2::zeros()),
        ];
        let info = CollisionInformation::new(h[0], None, collisions, false);

        assert_eq!(info.all_colliders().len(), 2);
        assert_eq!(info.first_contact_collisions().len(), 1);
        assert_eq!(info.first_contact_colliders().into_iter().collect::<Vec<_>>(), vec![h[1]]);
        assert_eq!(info.filter_colliders(|c| c == h[2]).len(), 1);
        assert_eq!(info.filter_collisions(|c| !c.first_contact).len(), 2);
        assert!(info.contains_collider(h[2]));
        assert!(!info.contains_collider(h[3]));
    }
}
