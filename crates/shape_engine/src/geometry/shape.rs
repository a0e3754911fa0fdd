//! The closed set of shapes and the pairwise dispatch over it

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec2, Vec2Ext};
use crate::geometry::contact::{CollisionPoint, CollisionPoints, Intersection};
use crate::geometry::intersect;
use crate::geometry::overlap;
use crate::geometry::predicates::is_point_on_point;
use crate::geometry::shapes::{Circle, Polygon, Polyline, Rect, Segment, Segments, Triangle, DEFAULT_CIRCLE_EDGE_COUNT};

/// Any shape the kernel understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Single point; behaves like a zero-radius circle
    Point(Vec2),
    /// Circle
    Circle(Circle),
    /// Line segment
    Segment(Segment),
    /// Triangle
    Triangle(Triangle),
    /// Axis-aligned rectangle
    Rect(Rect),
    /// Closed polygon
    Polygon(Polygon),
    /// Open polyline
    Polyline(Polyline),
}

/// What a shape looks like to the intersection routines
enum Boundary {
    Circle(Circle),
    Segment(Segment),
    Edges(Segments),
}

impl Shape {
    /// True for shapes that can never overlap or intersect anything:
    /// zero-length segments, polygons below three and polylines below two
    /// vertices
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Segment(s) => s.is_degenerate(),
            Shape::Polygon(p) => p.points.len() < 3,
            Shape::Polyline(pl) => pl.points.len() < 2,
            _ => false,
        }
    }

    /// Boolean overlap test; symmetric in its arguments
    pub fn overlap(&self, other: &Shape) -> bool {
        use Shape::{Circle as C, Point as Pt, Polygon as P, Polyline as L, Rect as R, Segment as S, Triangle as T};

        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }

        match (self, other) {
            (Pt(p), _) => C(Circle::point(*p)).overlap(other),
            (_, Pt(p)) => self.overlap(&C(Circle::point(*p))),

            (C(a), C(b)) => overlap::circle_circle(a, b),
            (C(c), S(s)) | (S(s), C(c)) => overlap::circle_segment(c, s),
            (C(c), T(t)) | (T(t), C(c)) => overlap::poly_circle(&t.points(), c),
            (C(c), R(r)) | (R(r), C(c)) => overlap::circle_rect(c, r),
            (C(c), P(p)) | (P(p), C(c)) => overlap::poly_circle(&p.points, c),
            (C(c), L(l)) | (L(l), C(c)) => l.edges(false).iter().any(|e| overlap::circle_segment(c, e)),

            (S(a), S(b)) => overlap::segment_segment(a, b),
            (S(s), T(t)) | (T(t), S(s)) => overlap::poly_segment(&t.points(), s),
            (S(s), R(r)) | (R(r), S(s)) => overlap::segment_rect(s, r),
            (S(s), P(p)) | (P(p), S(s)) => overlap::poly_segment(&p.points, s),
            (S(s), L(l)) | (L(l), S(s)) => l.edges(false).iter().any(|e| overlap::segment_segment(e, s)),

            (T(a), T(b)) => overlap::poly_poly(&a.points(), &b.points()),
            (T(t), R(r)) | (R(r), T(t)) => overlap::poly_rect(&t.points(), r),
            (T(t), P(p)) | (P(p), T(t)) => overlap::poly_poly(&t.points(), &p.points),
            (T(t), L(l)) | (L(l), T(t)) => l.edges(false).iter().any(|e| overlap::poly_segment(&t.points(), e)),

            (R(a), R(b)) => overlap::rect_rect(a, b),
            (R(r), P(p)) | (P(p), R(r)) => overlap::poly_rect(&p.points, r),
            (R(r), L(l)) | (L(l), R(r)) => l.edges(false).iter().any(|e| overlap::segment_rect(e, r)),

            (P(a), P(b)) => overlap::poly_poly(&a.points, &b.points),
            (P(p), L(l)) | (L(l), P(p)) => l.edges(false).iter().any(|e| overlap::poly_segment(&p.points, e)),

            (L(a), L(b)) => {
                let b_edges = b.edges(false);
                a.edges(false)
                    .iter()
                    .any(|ea| b_edges.iter().any(|eb| overlap::segment_segment(ea, eb)))
            }
        }
    }

    /// Contact points where the boundaries of `self` and `other` meet
    ///
    /// Normals describe the surface of `other`. When `other` is a segment or
    /// polyline with automatic normals, each normal is turned to face the
    /// centroid of `self`. Full containment yields no points even though the
    /// shapes overlap.
    pub fn intersect(&self, other: &Shape) -> CollisionPoints {
        if self.is_degenerate() || other.is_degenerate() {
            return CollisionPoints::new();
        }

        let mut points = match (self.boundary(), other.boundary()) {
            (Boundary::Circle(a), Boundary::Circle(b)) => intersect::circle_circle(&a, &b),
            (Boundary::Circle(a), Boundary::Segment(b)) => intersect::circle_segment(&a, &b),
            (Boundary::Circle(a), Boundary::Edges(b)) => intersect::circle_edges(&a, &b),
            (Boundary::Segment(a), Boundary::Circle(b)) => intersect::segment_circle(&a, &b),
            (Boundary::Segment(a), Boundary::Segment(b)) => intersect::segment_segment(&a, &b),
            (Boundary::Segment(a), Boundary::Edges(b)) => intersect::segment_edges(&a, &b),
            (Boundary::Edges(a), Boundary::Circle(b)) => intersect::edges_circle(&a, &b),
            (Boundary::Edges(a), Boundary::Segment(b)) => intersect::edges_segment(&a, &b),
            (Boundary::Edges(a), Boundary::Edges(b)) => intersect::edges_edges(&a, &b),
        };

        if points.is_valid() && other.has_automatic_normals() {
            points.flip_normals(self.centroid());
        }
        points
    }

    /// Intersect and fold the contacts into an [`Intersection`] for a body
    /// moving with `velocity`
    pub fn intersection(&self, other: &Shape, velocity: Vec2) -> Intersection {
        Intersection::new(self.intersect(other), velocity)
    }

    fn boundary(&self) -> Boundary {
        match self {
            Shape::Point(p) => Boundary::Circle(Circle::point(*p)),
            Shape::Circle(c) => Boundary::Circle(*c),
            Shape::Segment(s) => Boundary::Segment(*s),
            Shape::Triangle(t) => Boundary::Edges(t.edges(false)),
            Shape::Rect(r) => Boundary::Edges(r.edges(false)),
            Shape::Polygon(p) => Boundary::Edges(p.edges(false)),
            Shape::Polyline(pl) => Boundary::Edges(pl.edges(false)),
        }
    }

    fn has_automatic_normals(&self) -> bool {
        match self {
            Shape::Segment(s) => s.automatic_normals,
            Shape::Polyline(pl) => pl.automatic_normals,
            _ => false,
        }
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> Rect {
        match self {
            Shape::Point(p) => Rect::new(p.x, p.y, 0.0, 0.0),
            Shape::Circle(c) => c.bounding_box(),
            Shape::Segment(s) => s.bounding_box(),
            Shape::Triangle(t) => t.bounding_box(),
            Shape::Rect(r) => *r,
            Shape::Polygon(p) => p.bounding_box(),
            Shape::Polyline(pl) => pl.bounding_box(),
        }
    }

    /// Geometric center
    pub fn centroid(&self) -> Vec2 {
        match self {
            Shape::Point(p) => *p,
            Shape::Circle(c) => c.center,
            Shape::Segment(s) => s.center(),
            Shape::Triangle(t) => t.centroid(),
            Shape::Rect(r) => r.center(),
            Shape::Polygon(p) => p.centroid(),
            Shape::Polyline(pl) => pl.centroid(),
        }
    }

    /// Smallest circle around the centroid that holds every vertex
    pub fn bounding_circle(&self) -> Circle {
        let center = self.centroid();
        let radius = match self {
            Shape::Point(_) => 0.0,
            Shape::Circle(c) => c.radius,
            _ => self
                .vertices(DEFAULT_CIRCLE_EDGE_COUNT)
                .iter()
                .map(|p| (p - center).magnitude_squared())
                .fold(0.0_f32, f32::max)
                .sqrt(),
        };
        Circle::new(center, radius)
    }

    /// Containment test; segments and polylines contain the points on them
    pub fn contains_point(&self, point: Vec2) -> bool {
        match self {
            Shape::Point(p) => is_point_on_point(*p, point),
            Shape::Circle(c) => c.contains_point(point),
            Shape::Segment(s) => s.contains_point(point),
            Shape::Triangle(t) => t.contains_point(point),
            Shape::Rect(r) => r.contains_point(point),
            Shape::Polygon(p) => p.contains_point(point),
            Shape::Polyline(pl) => pl.contains_point(point),
        }
    }

    /// Closest boundary point to `point` with the boundary normal there
    pub fn closest_point(&self, point: Vec2) -> CollisionPoint {
        match self {
            Shape::Point(p) => CollisionPoint::new(*p, (point - p).normalize_or_zero()),
            Shape::Circle(c) => c.closest_point(point),
            Shape::Segment(s) => s.closest_point(point),
            Shape::Triangle(t) => t.closest_point(point),
            Shape::Rect(r) => r.closest_point(point),
            Shape::Polygon(p) => p.closest_point(point),
            Shape::Polyline(pl) => pl.closest_point(point),
        }
    }

    /// Boundary edges; circles use [`DEFAULT_CIRCLE_EDGE_COUNT`] edges
    pub fn edges(&self, inside_normals: bool) -> Segments {
        match self {
            Shape::Point(_) => Segments::new(),
            Shape::Circle(c) => c.edges(DEFAULT_CIRCLE_EDGE_COUNT, inside_normals),
            Shape::Segment(s) => {
                let seg = if inside_normals { s.flip_normal() } else { *s };
                Segments(vec![seg])
            }
            Shape::Triangle(t) => t.edges(inside_normals),
            Shape::Rect(r) => r.edges(inside_normals),
            Shape::Polygon(p) => p.edges(inside_normals),
            Shape::Polyline(pl) => pl.edges(inside_normals),
        }
    }

    /// Outline vertices; circles are sampled with `circle_edge_count` points
    pub fn vertices(&self, circle_edge_count: usize) -> Vec<Vec2> {
        match self {
            Shape::Point(p) => vec![*p],
            Shape::Circle(c) => c.vertices(circle_edge_count),
            Shape::Segment(s) => vec![s.start, s.end],
            Shape::Triangle(t) => t.points().to_vec(),
            Shape::Rect(r) => r.corners().to_vec(),
            Shape::Polygon(p) => p.points.clone(),
            Shape::Polyline(pl) => pl.points.clone(),
        }
    }

    /// Shape moved by `offset`
    pub fn translate(&self, offset: Vec2) -> Shape {
        match self {
            Shape::Point(p) => Shape::Point(p + offset),
            Shape::Circle(c) => Shape::Circle(c.translate(offset)),
            Shape::Segment(s) => Shape::Segment(s.translate(offset)),
            Shape::Triangle(t) => Shape::Triangle(t.translate(offset)),
            Shape::Rect(r) => Shape::Rect(r.translate(offset)),
            Shape::Polygon(p) => Shape::Polygon(p.translate(offset)),
            Shape::Polyline(pl) => Shape::Polyline(pl.translate(offset)),
        }
    }

    /// Area swept when moving by `displacement`
    ///
    /// See [`Shape::project_with_resolution`]; circles are sampled with
    /// [`DEFAULT_CIRCLE_EDGE_COUNT`] points.
    pub fn project(&self, displacement: Vec2) -> Option<Shape> {
        self.project_with_resolution(displacement, DEFAULT_CIRCLE_EDGE_COUNT)
    }

    /// Convex hull of the shape at rest and moved by `displacement`
    ///
    /// Returns `None` for a zero displacement or an empty outline. A hull
    /// that collapses onto a line comes back as a segment.
    pub fn project_with_resolution(&self, displacement: Vec2, circle_edge_count: usize) -> Option<Shape> {
        if displacement.magnitude_squared() == 0.0 {
            return None;
        }
        let outline = self.vertices(circle_edge_count);
        let swept: Vec<Vec2> = outline.iter().copied().chain(outline.iter().map(|p| p + displacement)).collect();
        let hull = convex_hull(&swept);
        match hull.len() {
            0 | 1 => None,
            2 => Some(Shape::Segment(Segment::new(hull[0], hull[1]))),
            _ => Some(Shape::Polygon(Polygon::new(hull))),
        }
    }
}

impl Segments {
    /// Does any edge overlap `shape`
    pub fn overlap(&self, shape: &Shape) -> bool {
        self.iter().any(|edge| Shape::Segment(*edge).overlap(shape))
    }

    /// Contacts of every edge against `shape`
    pub fn intersect(&self, shape: &Shape) -> CollisionPoints {
        self.iter().flat_map(|edge| Shape::Segment(*edge).intersect(shape)).collect()
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Segment> for Shape {
    fn from(s: Segment) -> Self {
        Shape::Segment(s)
    }
}

impl From<Triangle> for Shape {
    fn from(t: Triangle) -> Self {
        Shape::Triangle(t)
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Shape::Rect(r)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Shape::Polygon(p)
    }
}

impl From<Polyline> for Shape {
    fn from(pl: Polyline) -> Self {
        Shape::Polyline(pl)
    }
}

/// Convex hull (monotone chain), counter-clockwise without collinear points
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted: Vec<Vec2> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup_by(|a, b| is_point_on_point(*a, *b));
    if sorted.len() < 3 {
        return sorted;
    }

    let turn = |o: Vec2, a: Vec2, b: Vec2| (a - o).cross_2d(&(b - o));
    let mut hull: Vec<Vec2> = Vec::with_capacity(sorted.len() * 2);

    for p in &sorted {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], *p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], *p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// Catch a shape that moved through `other` between two frames
///
/// When the shape's bounding circle travelled more than twice its radius
/// since `prev_pos`, the path of its center is cast against `other`. On a
/// hit the returned position sits one radius short of the contact surface,
/// otherwise the current center is returned.
pub fn check_ccd(shape: &Shape, prev_pos: Vec2, other: &Shape) -> Vec2 {
    let circle = match shape {
        Shape::Circle(c) => *c,
        _ => shape.bounding_circle(),
    };
    let center_ray = Segment::new(prev_pos, circle.center);
    let r2 = circle.radius * 2.0;
    if center_ray.length_squared() <= r2 * r2 {
        return circle.center;
    }

    let points = Shape::Segment(center_ray).intersect(other);
    let intersection = Intersection::from_points(points);
    if intersection.valid && intersection.surface.valid {
        return intersection.surface.point - center_ray.direction() * circle.radius;
    }
    circle.center
}
