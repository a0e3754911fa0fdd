//! Shape value types
//!
//! All shapes are plain values in world space. Derived data (bounding boxes,
//! boundary edges) is computed on demand and never cached.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants, Vec2, Vec2Ext};
use crate::geometry::contact::CollisionPoint;
use crate::geometry::predicates::{
    closest_point_on_segment, is_point_in_circle, is_point_in_poly, is_point_in_rect, is_point_in_triangle,
    is_point_on_segment, polygon_area_signed,
};

/// Edge count used when a circle is turned into a polygon and no other
/// resolution is given
pub const DEFAULT_CIRCLE_EDGE_COUNT: usize = 16;

/// Circle given by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center point
    pub center: Vec2,
    /// Radius; zero or negative radii behave like a point
    pub radius: f32,
}

impl Circle {
    /// Create a new circle
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Zero-radius circle standing in for a point
    pub fn point(center: Vec2) -> Self {
        Self { center, radius: 0.0 }
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> Rect {
        let r = self.radius.max(0.0);
        Rect::new(self.center.x - r, self.center.y - r, r * 2.0, r * 2.0)
    }

    /// Inclusive containment test
    pub fn contains_point(&self, point: Vec2) -> bool {
        is_point_in_circle(point, self.center, self.radius)
    }

    /// Closest point on the circle boundary with the outward normal
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        let mut dir = (point - self.center).normalize_or_zero();
        if dir == Vec2::zeros() {
            dir = Vec2::new(1.0, 0.0);
        }
        CollisionPoint::new(self.center + dir * self.radius, dir)
    }

    /// Point at `angle` radians, `f` times the radius away from the center
    pub fn point_at(&self, angle: f32, f: f32) -> Vec2 {
        self.center + Vec2::new(self.radius * f, 0.0).rotated(angle)
    }

    /// `point_count` evenly spaced boundary points, counter-clockwise
    #[allow(clippy::cast_precision_loss)]
    pub fn vertices(&self, point_count: usize) -> Vec<Vec2> {
        if point_count == 0 {
            return Vec::new();
        }
        let step = constants::TAU / point_count as f32;
        (0..point_count).map(|i| self.point_at(step * i as f32, 1.0)).collect()
    }

    /// Approximate boundary as `point_count` edges
    pub fn edges(&self, point_count: usize, inside_normals: bool) -> Segments {
        boundary_edges(&self.vertices(point_count), true, inside_normals, false)
    }

    /// Approximate the circle with a regular polygon
    pub fn to_polygon(&self, point_count: usize) -> Polygon {
        Polygon::new(self.vertices(point_count))
    }

    /// Circle with the radius multiplied by `scale`
    pub fn scale_radius(&self, scale: f32) -> Self {
        Self::new(self.center, self.radius * scale)
    }

    /// Circle with `amount` added to the radius
    pub fn change_radius(&self, amount: f32) -> Self {
        Self::new(self.center, self.radius + amount)
    }

    /// Circle moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.center + offset, self.radius)
    }
}

/// Line segment with a surface normal
///
/// With `automatic_normals` set, contacts against this segment get their
/// normals flipped to face the other shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point
    pub start: Vec2,
    /// End point
    pub end: Vec2,
    /// Unit normal
    pub normal: Vec2,
    /// Flip normals toward whatever hits the segment
    pub automatic_normals: bool,
}

impl Segment {
    /// Segment with an automatic normal (initially the clockwise perpendicular)
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self {
            start,
            end,
            normal: (end - start).perpendicular_right().normalize_or_zero(),
            automatic_normals: true,
        }
    }

    /// Segment with a fixed normal
    pub fn with_normal(start: Vec2, end: Vec2, normal: Vec2) -> Self {
        Self {
            start,
            end,
            normal,
            automatic_normals: false,
        }
    }

    /// `end - start`
    pub fn displacement(&self) -> Vec2 {
        self.end - self.start
    }

    /// Unit direction from start to end
    pub fn direction(&self) -> Vec2 {
        self.displacement().normalize_or_zero()
    }

    /// Length
    pub fn length(&self) -> f32 {
        self.displacement().magnitude()
    }

    /// Squared length
    pub fn length_squared(&self) -> f32 {
        self.displacement().magnitude_squared()
    }

    /// Midpoint
    pub fn center(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// True for a zero-length segment
    #[allow(clippy::float_cmp)]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// Same segment with the normal reversed
    pub fn flip_normal(&self) -> Self {
        Self {
            normal: -self.normal,
            ..*self
        }
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> Rect {
        Rect::from_min_max(self.start, self.end)
    }

    /// Is `point` on the segment
    pub fn contains_point(&self, point: Vec2) -> bool {
        is_point_on_segment(point, self.start, self.end)
    }

    /// Closest point on the segment
    ///
    /// Segments with automatic normals report the normal facing `point`.
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        let closest = closest_point_on_segment(self.start, self.end, point);
        let mut normal = self.normal;
        if self.automatic_normals && (point - closest).is_facing_opposite_direction(&normal) {
            normal = -normal;
        }
        CollisionPoint::new(closest, normal)
    }

    /// Segment moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..*self
        }
    }
}

/// Boundary edge list of a composite shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segments(pub Vec<Segment>);

impl Segments {
    /// Empty edge list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Closest point across all edges; `None` for an empty list
    pub fn closest_point(&self, point: Vec2) -> Option<CollisionPoint> {
        self.0
            .iter()
            .map(|edge| edge.closest_point(point))
            .min_by(|a, b| {
                let la = (a.point - point).magnitude_squared();
                let lb = (b.point - point).magnitude_squared();
                la.total_cmp(&lb)
            })
    }

    /// Does any edge contain `point`
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.0.iter().any(|edge| edge.contains_point(point))
    }
}

impl std::ops::Deref for Segments {
    type Target = Vec<Segment>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Segment> for Segments {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Segments {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Triangle given by three corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// First corner
    pub a: Vec2,
    /// Second corner
    pub b: Vec2,
    /// Third corner
    pub c: Vec2,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self { a, b, c }
    }

    /// Corners in order
    pub fn points(&self) -> [Vec2; 3] {
        [self.a, self.b, self.c]
    }

    /// Boundary edges, normals outward unless `inside_normals`
    pub fn edges(&self, inside_normals: bool) -> Segments {
        boundary_edges(&self.points(), true, inside_normals, false)
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> Rect {
        Rect::bounding(&self.points())
    }

    /// Average of the corners
    pub fn centroid(&self) -> Vec2 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Strict containment test
    pub fn contains_point(&self, point: Vec2) -> bool {
        is_point_in_triangle(self.a, self.b, self.c, point)
    }

    /// Closest boundary point with the outward edge normal
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        self.edges(false)
            .closest_point(point)
            .unwrap_or_else(|| CollisionPoint::new(self.a, Vec2::zeros()))
    }

    /// Triangle moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.a + offset, self.b + offset, self.c + offset)
    }

    /// The triangle as a three-point polygon
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.points().to_vec())
    }
}

/// Axis-aligned rectangle given by its minimum corner and size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x
    pub x: f32,
    /// Minimum y
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two arbitrary corners
    pub fn from_min_max(a: Vec2, b: Vec2) -> Self {
        let min = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Vec2::new(a.x.max(b.x), a.y.max(b.y));
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x - size.x * 0.5, center.y - size.y * 0.5, size.x, size.y)
    }

    /// Smallest rectangle containing every point; zero rect for no points
    pub fn bounding(points: &[Vec2]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points.iter().skip(1).fold((*first, *first), |(min, max), p| {
            (
                Vec2::new(min.x.min(p.x), min.y.min(p.y)),
                Vec2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Self::from_min_max(min, max)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Maximum corner
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    /// Size as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Corners, starting at the minimum corner and walking along y first
    pub fn corners(&self) -> [Vec2; 4] {
        let min = self.min();
        let max = self.max();
        [min, Vec2::new(min.x, max.y), max, Vec2::new(max.x, min.y)]
    }

    /// Boundary edges, normals outward unless `inside_normals`
    pub fn edges(&self, inside_normals: bool) -> Segments {
        boundary_edges(&self.corners(), true, inside_normals, false)
    }

    /// Inclusive containment test
    pub fn contains_point(&self, point: Vec2) -> bool {
        is_point_in_rect(point, self.min(), self.size())
    }

    /// Clamp `point` into the rectangle
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        let min = self.min();
        let max = self.max();
        Vec2::new(point.x.clamp(min.x, max.x.max(min.x)), point.y.clamp(min.y, max.y.max(min.y)))
    }

    /// Closest boundary point with the outward edge normal
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        self.edges(false)
            .closest_point(point)
            .unwrap_or_else(|| CollisionPoint::new(self.min(), Vec2::zeros()))
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let min = Vec2::new(self.x.min(other.x), self.y.min(other.y));
        let a = self.max();
        let b = other.max();
        Rect::from_min_max(min, Vec2::new(a.x.max(b.x), a.y.max(b.y)))
    }

    /// Rectangle moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// The rectangle as a four-point polygon
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners().to_vec())
    }
}

/// Closed polygon; the last vertex connects back to the first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices in order
    pub points: Vec<Vec2>,
}

impl Polygon {
    /// Create a new polygon
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Boundary edges, normals outward unless `inside_normals`
    ///
    /// Polygons with fewer than three vertices have no edges.
    pub fn edges(&self, inside_normals: bool) -> Segments {
        if self.points.len() < 3 {
            return Segments::new();
        }
        boundary_edges(&self.points, true, inside_normals, false)
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> Rect {
        Rect::bounding(&self.points)
    }

    /// Area-weighted centroid, vertex average for zero-area polygons
    pub fn centroid(&self) -> Vec2 {
        let area = polygon_area_signed(&self.points);
        if area == 0.0 {
            return vertex_average(&self.points);
        }
        let mut c = Vec2::zeros();
        for (i, p) in self.points.iter().enumerate() {
            let q = self.points[(i + 1) % self.points.len()];
            let cross = p.x * q.y - q.x * p.y;
            c += (p + q) * cross;
        }
        c / (6.0 * area)
    }

    /// Even-odd containment test
    pub fn contains_point(&self, point: Vec2) -> bool {
        is_point_in_poly(point, &self.points)
    }

    /// Closest boundary point with the outward edge normal
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        self.edges(false).closest_point(point).unwrap_or_else(|| {
            let p = self.points.first().copied().unwrap_or_else(Vec2::zeros);
            CollisionPoint::new(p, Vec2::zeros())
        })
    }

    /// Polygon moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.points.iter().map(|p| p + offset).collect())
    }
}

/// Open chain of vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Vertices in order
    pub points: Vec<Vec2>,
    /// Flip normals toward whatever hits the polyline
    pub automatic_normals: bool,
}

impl Polyline {
    /// Polyline with automatic normals
    pub fn new(points: Vec<Vec2>) -> Self {
        Self {
            points,
            automatic_normals: true,
        }
    }

    /// Polyline whose edges keep their clockwise-perpendicular normals
    pub fn with_fixed_normals(points: Vec<Vec2>) -> Self {
        Self {
            points,
            automatic_normals: false,
        }
    }

    /// Edges between consecutive vertices
    pub fn edges(&self, inside_normals: bool) -> Segments {
        boundary_edges(&self.points, false, inside_normals, self.automatic_normals)
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> Rect {
        Rect::bounding(&self.points)
    }

    /// Vertex average
    pub fn centroid(&self) -> Vec2 {
        vertex_average(&self.points)
    }

    /// Is `point` on any edge
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.edges(false).contains_point(point)
    }

    /// Closest point on the chain
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        self.edges(false).closest_point(point).unwrap_or_else(|| {
            let p = self.points.first().copied().unwrap_or_else(Vec2::zeros);
            CollisionPoint::new(p, Vec2::zeros())
        })
    }

    /// Polyline moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            points: self.points.iter().map(|p| p + offset).collect(),
            automatic_normals: self.automatic_normals,
        }
    }
}

fn vertex_average(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::zeros();
    }
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f32;
    points.iter().fold(Vec2::zeros(), |acc, p| acc + p) / count
}

/// Build edges between consecutive points
///
/// Closed loops pick the outward side from the winding. Open chains use the
/// clockwise perpendicular of each edge. Repeated points add no edge.
fn boundary_edges(points: &[Vec2], closed: bool, inside_normals: bool, automatic_normals: bool) -> Segments {
    if points.len() < 2 {
        return Segments::new();
    }
    let counter_clockwise = !closed || polygon_area_signed(points) >= 0.0;
    let flip = counter_clockwise == inside_normals;
    let edge_count = if closed { points.len() } else { points.len() - 1 };

    (0..edge_count)
        .map(|i| {
            let start = points[i];
            let end = points[(i + 1) % points.len()];
            let right = (end - start).perpendicular_right().normalize_or_zero();
            let normal = if flip { -right } else { right };
            Segment {
                start,
                end,
                normal,
                automatic_normals,
            }
        })
        .filter(|edge| !edge.is_degenerate())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn outward(edges: &Segments, inside: Vec2) -> bool {
        edges.iter().all(|e| (e.center() - inside).dot(&e.normal) > 0.0)
    }

    #[test]
    fn test_rect_edges_point_outward_and_inward() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(outward(&rect.edges(false), rect.center()));
        assert!(!outward(&rect.edges(true), rect.center()));
        assert_eq!(rect.edges(false).len(), 4);
    }

    #[test]
    fn test_polygon_edges_outward_for_both_windings() {
        let ccw = Polygon::new(vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(0.0, 10.0)]);
        let cw = Polygon::new(ccw.points.iter().rev().copied().collect());
        assert!(outward(&ccw.edges(false), v(5.0, 5.0)));
        assert!(outward(&cw.edges(false), v(5.0, 5.0)));
        assert!(Polygon::new(vec![v(0.0, 0.0), v(1.0, 0.0)]).edges(false).is_empty());
    }

    #[test]
    fn test_circle_edges_and_vertices() {
        let circle = Circle::new(v(5.0, 5.0), 2.0);
        let edges = circle.edges(16, false);
        assert_eq!(edges.len(), 16);
        assert!(outward(&edges, circle.center));
        assert_relative_eq!(circle.vertices(4)[1], v(5.0, 7.0), epsilon = 1e-5);
        assert_relative_eq!(circle.point_at(0.0, 0.5), v(6.0, 5.0), epsilon = 1e-6);
        assert_eq!(circle.scale_radius(2.0).radius, 4.0);
        assert_eq!(circle.change_radius(-1.0).radius, 1.0);
    }

    #[test]
    fn test_segment_basics() {
        let seg = Segment::new(v(0.0, 0.0), v(10.0, 0.0));
        assert!(seg.automatic_normals);
        assert_relative_eq!(seg.normal, v(0.0, -1.0));
        assert_relative_eq!(seg.length(), 10.0);
        assert_relative_eq!(seg.center(), v(5.0, 0.0));
        assert_relative_eq!(seg.flip_normal().normal, v(0.0, 1.0));

        let closest = seg.closest_point(v(3.0, 4.0));
        assert_relative_eq!(closest.point, v(3.0, 0.0));
        assert_relative_eq!(closest.normal, v(0.0, 1.0));

        let fixed = Segment::with_normal(v(0.0, 0.0), v(10.0, 0.0), v(0.0, -1.0));
        assert_relative_eq!(fixed.closest_point(v(3.0, 4.0)).normal, v(0.0, -1.0));
    }

    #[test]
    fn test_rect_helpers() {
        let rect = Rect::from_min_max(v(10.0, 10.0), v(0.0, 0.0));
        assert_eq!(rect, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_relative_eq!(rect.clamp_point(v(20.0, -5.0)), v(10.0, 0.0));
        let closest = rect.closest_point(v(5.0, 12.0));
        assert_relative_eq!(closest.point, v(5.0, 10.0));
        assert_relative_eq!(closest.normal, v(0.0, 1.0));
        assert_eq!(rect.union(&Rect::new(5.0, 5.0, 10.0, 1.0)), Rect::new(0.0, 0.0, 15.0, 10.0));
    }

    #[test]
    fn test_polygon_centroid() {
        let poly = Polygon::new(vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 2.0), v(0.0, 2.0)]);
        assert_relative_eq!(poly.centroid(), v(2.0, 1.0), epsilon = 1e-6);
        let line = Polygon::new(vec![v(0.0, 0.0), v(2.0, 0.0), v(4.0, 0.0)]);
        assert_relative_eq!(line.centroid(), v(2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_polyline_edges_and_closest() {
        let pl = Polyline::new(vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0)]);
        assert_eq!(pl.edges(false).len(), 2);
        assert!(pl.contains_point(v(10.0, 5.0)));
        let closest = pl.closest_point(v(12.0, 5.0));
        assert_relative_eq!(closest.point, v(10.0, 5.0));
        assert_relative_eq!(closest.normal, v(1.0, 0.0));
    }
}
