//! Contact computation between primitive pairs
//!
//! Composite shapes reach these routines as edge lists, so only the
//! circle/segment combinations carry real math. Normals always describe the
//! surface of the second argument.

use crate::foundation::math::Vec2Ext;
use crate::geometry::contact::{CollisionPoint, CollisionPoints};
use crate::geometry::predicates::{intersect_circle_circle, intersect_segment_circle, intersect_segment_segment_info};
use crate::geometry::shapes::{Circle, Segment, Segments};

/// Crossing of two segments, normal from `b`
pub fn segment_segment(a: &Segment, b: &Segment) -> CollisionPoints {
    match intersect_segment_segment_info(a.start, a.end, b.start, b.end) {
        Some((point, _)) => vec![CollisionPoint::new(point, b.normal)].into(),
        None => CollisionPoints::new(),
    }
}

/// Segment hitting a circle, normals point out of the circle
pub fn segment_circle(s: &Segment, c: &Circle) -> CollisionPoints {
    intersect_segment_circle(s.start, s.end, c.center, c.radius)
        .into_iter()
        .map(|p| CollisionPoint::new(p, (p - c.center).normalize_or_zero()))
        .collect()
}

/// Circle hitting a segment, normals are the segment normal
pub fn circle_segment(c: &Circle, s: &Segment) -> CollisionPoints {
    intersect_segment_circle(s.start, s.end, c.center, c.radius)
        .into_iter()
        .map(|p| CollisionPoint::new(p, s.normal))
        .collect()
}

/// Two circle boundaries, normals point out of `b`
pub fn circle_circle(a: &Circle, b: &Circle) -> CollisionPoints {
    intersect_circle_circle(a.center, a.radius, b.center, b.radius)
        .into_iter()
        .map(|p| CollisionPoint::new(p, (p - b.center).normalize_or_zero()))
        .collect()
}

/// Segment against every edge
pub fn segment_edges(s: &Segment, edges: &Segments) -> CollisionPoints {
    edges.iter().flat_map(|edge| segment_segment(s, edge)).collect()
}

/// Every edge against a segment
pub fn edges_segment(edges: &Segments, s: &Segment) -> CollisionPoints {
    edges.iter().flat_map(|edge| segment_segment(edge, s)).collect()
}

/// Circle against every edge
pub fn circle_edges(c: &Circle, edges: &Segments) -> CollisionPoints {
    edges.iter().flat_map(|edge| circle_segment(c, edge)).collect()
}

/// Every edge against a circle
pub fn edges_circle(edges: &Segments, c: &Circle) -> CollisionPoints {
    edges.iter().flat_map(|edge| segment_circle(edge, c)).collect()
}

/// Every edge of `a` against every edge of `b`
pub fn edges_edges(a: &Segments, b: &Segments) -> CollisionPoints {
    a.iter().flat_map(|edge| segment_edges(edge, b)).collect()
}
