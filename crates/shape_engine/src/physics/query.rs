//! Space queries against the collision handler
//!
//! Queries read the spatial hash and world shapes built by the last
//! [`CollisionHandler::update`]. `query_*` calls compute contact points and
//! keep candidates that actually cross the query shape; `cast_*` calls only
//! run the boolean overlap test.

use std::collections::BTreeMap;

use crate::foundation::math::Vec2;
use crate::geometry::{CollisionPoint, CollisionPoints, Shape};
use crate::physics::collider::{BodyHandle, Collider, ColliderHandle};
use crate::physics::collision_layers::CollisionMask;
use crate::physics::collision_system::CollisionHandler;

/// One collider found by a space query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInfo {
    /// Collider that was hit
    pub collider: ColliderHandle,

    /// Contacts on the hit collider's boundary
    pub points: CollisionPoints,

    /// Contact closest to the query origin
    pub closest: CollisionPoint,
}

impl QueryInfo {
    fn new(collider: ColliderHandle, origin: Vec2, points: CollisionPoints) -> Option<Self> {
        let closest = points.closest(origin)?;
        Some(Self { collider, points, closest })
    }

    /// Squared distance from `origin` to the closest contact
    pub fn distance_squared(&self, origin: Vec2) -> f32 {
        (self.closest.point - origin).magnitude_squared()
    }
}

fn sort_closest(infos: &mut [QueryInfo], origin: Vec2) {
    infos.sort_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)));
}

impl CollisionHandler {
    /// Colliders on `mask` whose boundary crosses `shape`
    ///
    /// With `sorted`, results are ordered by the squared distance of their
    /// closest contact to `origin`.
    pub fn query_space(&mut self, shape: &Shape, origin: Vec2, mask: CollisionMask, sorted: bool) -> Vec<QueryInfo> {
        self.query_shape(shape, origin, mask, None, sorted)
    }

    /// Colliders on the collider's mask whose boundary crosses it
    pub fn query_space_collider(&mut self, collider: ColliderHandle, origin: Vec2, sorted: bool) -> Vec<QueryInfo> {
        let Some((shape, mask)) = self.query_source(collider) else {
            return Vec::new();
        };
        self.query_shape(&shape, origin, mask, Some(collider), sorted)
    }

    /// Per-collider query results for every collider of an enabled body
    ///
    /// Colliders without hits are left out.
    pub fn query_space_body(&mut self, body: BodyHandle, origin: Vec2, sorted: bool) -> BTreeMap<ColliderHandle, Vec<QueryInfo>> {
        let mut result = BTreeMap::new();
        for collider in self.body_query_colliders(body) {
            let infos = self.query_space_collider(collider, origin, sorted);
            if !infos.is_empty() {
                result.insert(collider, infos);
            }
        }
        result
    }

    /// Append the colliders on `mask` overlapping `shape` to `result`
    pub fn cast_space(&mut self, shape: &Shape, mask: CollisionMask, result: &mut Vec<ColliderHandle>) {
        self.visit_candidates(&shape.bounding_box(), mask, None, |candidate, _, other| {
            if shape.overlap(other) {
                result.push(candidate);
            }
        });
    }

    /// Append the colliders overlapping `collider` to `result`
    ///
    /// With `sorted`, the whole of `result` is ordered by distance from the
    /// collider's position.
    pub fn cast_space_collider(&mut self, collider: ColliderHandle, result: &mut Vec<ColliderHandle>, sorted: bool) {
        let Some((shape, mask)) = self.query_source(collider) else {
            return;
        };
        self.cast_shape(&shape, mask, Some(collider), result);
        if sorted {
            if let Some(origin) = self.colliders.get(collider).map(|c| c.cur_transform().position) {
                self.sort_cast_result(result, origin);
            }
        }
    }

    /// Append the colliders overlapping any collider of `body` to `result`
    ///
    /// A collider touching several of the body's colliders is appended once
    /// per touch. With `sorted`, `result` is ordered by distance from the
    /// body's position.
    pub fn cast_space_body(&mut self, body: BodyHandle, result: &mut Vec<ColliderHandle>, sorted: bool) {
        for collider in self.body_query_colliders(body) {
            if let Some((shape, mask)) = self.query_source(collider) {
                self.cast_shape(&shape, mask, Some(collider), result);
            }
        }
        if sorted {
            if let Some(origin) = self.bodies.get(body).map(|b| b.transform.position) {
                self.sort_cast_result(result, origin);
            }
        }
    }

    /// Number of colliders on `mask` overlapping `shape`
    pub fn cast_space_count(&mut self, shape: &Shape, mask: CollisionMask) -> usize {
        let mut count = 0;
        self.visit_candidates(&shape.bounding_box(), mask, None, |_, _, other| {
            if shape.overlap(other) {
                count += 1;
            }
        });
        count
    }

    /// Number of colliders overlapping `collider`
    pub fn cast_space_collider_count(&mut self, collider: ColliderHandle) -> usize {
        let mut result = Vec::new();
        if let Some((shape, mask)) = self.query_source(collider) {
            self.cast_shape(&shape, mask, Some(collider), &mut result);
        }
        result.len()
    }

    /// Overlap count summed over every collider of `body`
    pub fn cast_space_body_count(&mut self, body: BodyHandle) -> usize {
        self.body_query_colliders(body)
            .into_iter()
            .map(|collider| self.cast_space_collider_count(collider))
            .sum()
    }

    /// Order colliders by squared distance of their position from `origin`
    ///
    /// Stale handles go last.
    pub fn sort_cast_result(&self, result: &mut [ColliderHandle], origin: Vec2) {
        let distance = |handle: &ColliderHandle| {
            self.colliders
                .get(*handle)
                .map_or(f32::INFINITY, |c| (c.cur_transform().position - origin).magnitude_squared())
        };
        result.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
    }

    fn query_shape(&mut self, shape: &Shape, origin: Vec2, mask: CollisionMask, exclude: Option<ColliderHandle>, sorted: bool) -> Vec<QueryInfo> {
        let mut infos = Vec::new();
        self.visit_candidates(&shape.bounding_box(), mask, exclude, |candidate, _, other| {
            if let Some(info) = QueryInfo::new(candidate, origin, shape.intersect(other)) {
                infos.push(info);
            }
        });
        if sorted && infos.len() > 1 {
            sort_closest(&mut infos, origin);
        }
        infos
    }

    fn cast_shape(&mut self, shape: &Shape, mask: CollisionMask, exclude: Option<ColliderHandle>, result: &mut Vec<ColliderHandle>) {
        self.visit_candidates(&shape.bounding_box(), mask, exclude, |candidate, _, other| {
            if shape.overlap(other) {
                result.push(candidate);
            }
        });
    }

    /// Hashed world shape (or a fresh one for colliders not hashed yet) and mask
    fn query_source(&self, collider: ColliderHandle) -> Option<(Shape, CollisionMask)> {
        let source = self.colliders.get(collider)?;
        let shape = self.world_shapes.get(collider).cloned().unwrap_or_else(|| source.world_shape());
        Some((shape, source.mask))
    }

    fn body_query_colliders(&self, body: BodyHandle) -> Vec<ColliderHandle> {
        let Some(owner) = self.bodies.get(body).filter(|b| b.enabled) else {
            return Vec::new();
        };
        owner
            .colliders()
            .iter()
            .copied()
            .filter(|c| self.colliders.get(*c).is_some_and(|collider: &Collider| collider.enabled))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::Transform2D;
    use crate::geometry::{Rect, Segment};
    use crate::physics::collider::{ColliderShape, CollisionBody};
    use crate::physics::collision_layers::CollisionLayer;

    fn handler() -> CollisionHandler {
        CollisionHandler::new(Rect::new(0.0, 0.0, 100.0, 100.0), 5, 5, 64).unwrap()
    }

    // additions become live at the end of the first update and are hashed by the second
    fn settle(handler: &mut CollisionHandler) {
        handler.update(0.016);
        handler.update(0.016);
    }

    fn wall(handler: &mut CollisionHandler, x: f32, layer: CollisionLayer) -> ColliderHandle {
        let collider = Collider::new(ColliderShape::rect(Vec2::new(4.0, 40.0)))
            .with_layer(layer)
            .with_transform(Transform2D::from_position(Vec2::new(x, 50.0)));
        handler.add_collider(collider)
    }

    #[test]
    fn test_query_space_sorted_by_distance() {
        let mut handler = handler();
        let far = wall(&mut handler, 80.0, CollisionLayer::ENVIRONMENT);
        let near = wall(&mut handler, 20.0, CollisionLayer::ENVIRONMENT);
        let mid = wall(&mut handler, 50.0, CollisionLayer::ENVIRONMENT);
        settle(&mut handler);

        let ray = Shape::Segment(Segment::new(Vec2::new(5.0, 50.0), Vec2::new(95.0, 50.0)));
        let infos = handler.query_space(&ray, Vec2::new(5.0, 50.0), CollisionMask::all(), true);
        let order: Vec<_> = infos.iter().map(|i| i.collider).collect();
        assert_eq!(order, vec![near, mid, far]);

        let origin = Vec2::new(5.0, 50.0);
        assert!(infos.windows(2).all(|w| w[0].distance_squared(origin) <= w[1].distance_squared(origin)));
        assert_relative_eq!(infos[0].closest.point, Vec2::new(18.0, 50.0), epsilon = 1e-4);
    }

    #[test]
    fn test_query_space_respects_mask() {
        let mut handler = handler();
        wall(&mut handler, 20.0, CollisionLayer::ENVIRONMENT);
        let enemy = wall(&mut handler, 50.0, CollisionLayer::ENEMY);
        settle(&mut handler);

        let ray = Shape::Segment(Segment::new(Vec2::new(5.0, 50.0), Vec2::new(95.0, 50.0)));
        let infos = handler.query_space(&ray, Vec2::zeros(), CollisionMask::ENEMY, false);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].collider, enemy);
    }

    #[test]
    fn test_query_skips_contained_candidates() {
        let mut handler = handler();
        let inner = handler.add_collider(
            Collider::new(ColliderShape::Circle { radius: 1.0 }).with_transform(Transform2D::from_position(Vec2::new(50.0, 50.0))),
        );
        settle(&mut handler);

        let big = Shape::Rect(Rect::new(40.0, 40.0, 20.0, 20.0));
        assert!(handler.query_space(&big, Vec2::zeros(), CollisionMask::all(), true).is_empty());

        let mut result = Vec::new();
        handler.cast_space(&big, CollisionMask::all(), &mut result);
        assert_eq!(result, vec![inner]);
        assert_eq!(handler.cast_space_count(&big, CollisionMask::all()), 1);
    }

    #[test]
    fn test_cast_space_outside_bounds_is_empty() {
        let mut handler = handler();
        wall(&mut handler, 20.0, CollisionLayer::ENVIRONMENT);
        settle(&mut handler);

        let outside = Shape::Rect(Rect::new(500.0, 500.0, 10.0, 10.0));
        let mut result = Vec::new();
        handler.cast_space(&outside, CollisionMask::all(), &mut result);
        assert!(result.is_empty());
        assert!(handler.query_space(&outside, Vec2::zeros(), CollisionMask::all(), true).is_empty());
    }

    #[test]
    fn test_body_queries_and_sorted_cast() {
        let mut handler = handler();
        let near = wall(&mut handler, 30.0, CollisionLayer::ENVIRONMENT);
        let far = wall(&mut handler, 40.0, CollisionLayer::ENVIRONMENT);
        let body = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(35.0, 50.0))));
        let probe = handler.attach_collider(body, Collider::new(ColliderShape::rect(Vec2::new(16.0, 4.0)))).unwrap();
        settle(&mut handler);

        let mut result = Vec::new();
        handler.cast_space_body(body, &mut result, true);
        assert_eq!(result.len(), 2);
        assert!(!result.contains(&probe));
        assert_eq!(handler.cast_space_body_count(body), 2);

        let mut sorted = vec![far, near];
        handler.sort_cast_result(&mut sorted, Vec2::new(0.0, 50.0));
        assert_eq!(sorted, vec![near, far]);

        let mut from_collider = Vec::new();
        handler.cast_space_collider(probe, &mut from_collider, true);
        assert_eq!(from_collider.len(), 2);
        assert_eq!(handler.cast_space_collider_count(probe), 2);

        let per_collider = handler.query_space_body(body, Vec2::new(35.0, 50.0), true);
        assert_eq!(per_collider.len(), 1);
        assert_eq!(per_collider.get(&probe).map(Vec::len), Some(2));
    }

    #[test]
    fn test_stale_handles_yield_empty_results() {
        let mut handler = handler();
        let collider = wall(&mut handler, 20.0, CollisionLayer::ENVIRONMENT);
        settle(&mut handler);
        handler.remove_collider(collider).unwrap();
        handler.update(0.016);

        assert!(handler.query_space_collider(collider, Vec2::zeros(), true).is_empty());
        assert_eq!(handler.cast_space_collider_count(collider), 0);
    }
}
