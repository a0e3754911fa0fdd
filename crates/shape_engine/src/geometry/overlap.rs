//! Boolean overlap tests between primitive pairs
//!
//! Each routine is written once for one argument order; [`Shape::overlap`]
//! routes the mirrored order here with the arguments swapped, so every pair
//! answers the same in both directions.
//!
//! [`Shape::overlap`]: crate::geometry::Shape::overlap

use crate::foundation::math::{Vec2, Vec2Ext};
use crate::geometry::predicates::{
    is_point_in_poly, is_point_on_point, overlap_rect_line, overlapping_range, project_segment,
    segment_on_one_side,
};
use crate::geometry::shapes::{Circle, Rect, Segment};

/// Separating-axis test along both segment lines; zero-length segments never overlap
pub fn segment_segment(a: &Segment, b: &Segment) -> bool {
    if a.is_degenerate() || b.is_degenerate() {
        return false;
    }
    let axis_a = a.displacement();
    if segment_on_one_side(a.start, axis_a, b.start, b.end) {
        return false;
    }
    let axis_b = b.displacement();
    if segment_on_one_side(b.start, axis_b, a.start, a.end) {
        return false;
    }
    if axis_a.is_parallel(&axis_b) {
        let (a_min, a_max) = project_segment(a.start, a.end, axis_a);
        let (b_min, b_max) = project_segment(b.start, b.end, axis_a);
        return overlapping_range(a_min, a_max, b_min, b_max);
    }
    true
}

/// Circle against segment; a circle without positive radius is a point
pub fn circle_segment(c: &Circle, s: &Segment) -> bool {
    if c.radius <= 0.0 {
        return s.contains_point(c.center);
    }
    if c.contains_point(s.start) || c.contains_point(s.end) {
        return true;
    }

    let d = s.displacement();
    let p = (c.center - s.start).project_onto(&d);
    let nearest = s.start + p;
    c.contains_point(nearest) && p.magnitude_squared() <= d.magnitude_squared() && p.dot(&d) >= 0.0
}

/// Circle against circle; circles without positive radius are points
pub fn circle_circle(a: &Circle, b: &Circle) -> bool {
    match (a.radius > 0.0, b.radius > 0.0) {
        (false, true) => b.contains_point(a.center),
        (true, false) => a.contains_point(b.center),
        (false, false) => is_point_on_point(a.center, b.center),
        (true, true) => {
            let r_sum = a.radius + b.radius;
            (a.center - b.center).magnitude_squared() < r_sum * r_sum
        }
    }
}

/// Circle against rectangle via the clamped center
pub fn circle_rect(c: &Circle, r: &Rect) -> bool {
    if c.radius <= 0.0 {
        return r.contains_point(c.center);
    }
    c.contains_point(r.clamp_point(c.center))
}

/// Segment against rectangle
pub fn segment_rect(s: &Segment, r: &Rect) -> bool {
    if !overlap_rect_line(r, s.start, s.displacement()) {
        return false;
    }
    let min = r.min();
    let max = r.max();
    overlapping_range(min.x, max.x, s.start.x, s.end.x) && overlapping_range(min.y, max.y, s.start.y, s.end.y)
}

/// Rectangle against rectangle (inclusive edges)
pub fn rect_rect(a: &Rect, b: &Rect) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    overlapping_range(a_min.x, a_max.x, b_min.x, b_max.x) && overlapping_range(a_min.y, a_max.y, b_min.y, b_max.y)
}

fn poly_edges(poly: &[Vec2]) -> impl Iterator<Item = Segment> + '_ {
    (0..poly.len())
        .map(move |i| Segment::new(poly[i], poly[(i + 1) % poly.len()]))
        .filter(|edge| !edge.is_degenerate())
}

/// Closed polygon against segment
pub fn poly_segment(poly: &[Vec2], s: &Segment) -> bool {
    if poly.len() < 3 {
        return false;
    }
    if is_point_in_poly(s.start, poly) || is_point_in_poly(s.end, poly) {
        return true;
    }
    poly_edges(poly).any(|edge| segment_segment(&edge, s))
}

/// Closed polygon against circle
pub fn poly_circle(poly: &[Vec2], c: &Circle) -> bool {
    if poly.len() < 3 {
        return false;
    }
    if is_point_in_poly(c.center, poly) {
        return true;
    }
    poly_edges(poly).any(|edge| circle_segment(c, &edge))
}

/// Closed polygon against rectangle
pub fn poly_rect(poly: &[Vec2], r: &Rect) -> bool {
    if poly.len() < 3 {
        return false;
    }
    if r.corners().iter().any(|corner| is_point_in_poly(*corner, poly)) {
        return true;
    }
    poly_edges(poly).any(|edge| segment_rect(&edge, r))
}

/// Closed polygon against closed polygon
///
/// Besides vertex containment both ways, edges are checked for crossings so
/// that two polygons forming a cross (no vertex inside the other) overlap.
pub fn poly_poly(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    if a.iter().any(|p| is_point_in_poly(*p, b)) || b.iter().any(|p| is_point_in_poly(*p, a)) {
        return true;
    }
    poly_edges(a).any(|ea| poly_edges(b).any(|eb| segment_segment(&ea, &eb)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn square(x: f32, y: f32, size: f32) -> Vec<Vec2> {
        vec![v(x, y), v(x + size, y), v(x + size, y + size), v(x, y + size)]
    }

    #[test]
    fn test_segment_segment() {
        let a = Segment::new(v(0.0, 0.0), v(10.0, 0.0));
        assert!(segment_segment(&a, &Segment::new(v(5.0, -5.0), v(5.0, 5.0))));
        assert!(!segment_segment(&a, &Segment::new(v(0.0, 5.0), v(10.0, 5.0))));
        assert!(segment_segment(&a, &Segment::new(v(8.0, 0.0), v(20.0, 0.0))));
        assert!(!segment_segment(&a, &Segment::new(v(11.0, 0.0), v(20.0, 0.0))));
    }

    #[test]
    fn test_circle_segment_and_point_circle() {
        let c = Circle::new(v(0.0, 0.0), 5.0);
        assert!(circle_segment(&c, &Segment::new(v(-10.0, 3.0), v(10.0, 3.0))));
        assert!(!circle_segment(&c, &Segment::new(v(-10.0, 6.0), v(10.0, 6.0))));
        assert!(circle_segment(&c, &Segment::new(v(1.0, 1.0), v(2.0, 2.0))));
        assert!(circle_segment(&Circle::point(v(5.0, 0.0)), &Segment::new(v(0.0, 0.0), v(10.0, 0.0))));
    }

    #[test]
    fn test_circle_circle_strict_touching() {
        let a = Circle::new(v(0.0, 0.0), 5.0);
        assert!(circle_circle(&a, &Circle::new(v(3.0, 0.0), 1.0)));
        assert!(!circle_circle(&a, &Circle::new(v(10.0, 0.0), 5.0)));
        assert!(circle_circle(&a, &Circle::new(v(9.9, 0.0), 5.0)));
        assert!(circle_circle(&a, &Circle::point(v(5.0, 0.0))));
        assert!(circle_circle(&Circle::point(v(1.0, 1.0)), &Circle::point(v(1.0, 1.0))));
    }

    #[test]
    fn test_rect_pairs() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_rect(&Circle::new(v(12.0, 5.0), 3.0), &r));
        assert!(!circle_rect(&Circle::new(v(14.0, 14.0), 3.0), &r));
        assert!(segment_rect(&Segment::new(v(-5.0, 5.0), v(15.0, 5.0)), &r));
        assert!(!segment_rect(&Segment::new(v(-5.0, 15.0), v(15.0, 15.0)), &r));
        assert!(!segment_rect(&Segment::new(v(11.0, -5.0), v(20.0, 5.0)), &r));
        assert!(rect_rect(&r, &Rect::new(10.0, 10.0, 1.0, 1.0)));
        assert!(!rect_rect(&r, &Rect::new(10.5, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_poly_pairs() {
        let poly = square(0.0, 0.0, 10.0);
        assert!(poly_segment(&poly, &Segment::new(v(2.0, 2.0), v(3.0, 3.0))));
        assert!(poly_segment(&poly, &Segment::new(v(-5.0, 5.0), v(15.0, 5.0))));
        assert!(!poly_segment(&poly, &Segment::new(v(-5.0, 15.0), v(15.0, 15.0))));
        assert!(poly_circle(&poly, &Circle::new(v(12.0, 5.0), 3.0)));
        assert!(poly_rect(&poly, &Rect::new(-5.0, 4.0, 20.0, 2.0)));
        assert!(!poly_rect(&poly, &Rect::new(20.0, 20.0, 2.0, 2.0)));
        assert!(!poly_segment(&poly[..2], &Segment::new(v(0.0, 0.0), v(10.0, 0.0))));
    }

    #[test]
    fn test_zero_length_edges_do_not_overlap() {
        let far = Segment::new(v(0.0, 0.0), v(10.0, 0.0));
        assert!(!segment_segment(&Segment::new(v(20.0, 0.0), v(20.0, 0.0)), &far));
        assert!(!segment_segment(&far, &Segment::new(v(5.0, 0.0), v(5.0, 0.0))));

        let doubled = vec![v(20.0, 0.0), v(20.0, 0.0), v(30.0, 5.0), v(20.0, 5.0)];
        assert!(!poly_segment(&doubled, &far));
        assert!(poly_segment(&doubled, &Segment::new(v(25.0, -1.0), v(25.0, 10.0))));
    }

    #[test]
    fn test_poly_poly_cross_without_contained_vertices() {
        let wide = vec![v(-10.0, -1.0), v(10.0, -1.0), v(10.0, 1.0), v(-10.0, 1.0)];
        let tall = vec![v(-1.0, -10.0), v(1.0, -10.0), v(1.0, 10.0), v(-1.0, 10.0)];
        assert!(poly_poly(&wide, &tall));
        assert!(poly_poly(&tall, &wide));
        assert!(!poly_poly(&square(0.0, 0.0, 1.0), &square(5.0, 5.0, 1.0)));
    }
}
