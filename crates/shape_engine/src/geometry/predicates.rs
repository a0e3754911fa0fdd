//! Low-level geometric predicates and closed-form helpers
//!
//! Everything here works on raw points and directions. The shape types and
//! the overlap/intersect kernels are built on top of these functions.

use crate::foundation::math::{constants, Vec2, Vec2Ext};
use crate::geometry::shapes::Rect;

/// Twice the signed area of triangle `abc`
///
/// The sign tells on which side of `ab` the point `c` lies.
pub fn triangle_area_signed(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (a.x - c.x) * (b.y - c.y) - (a.y - c.y) * (b.x - c.x)
}

/// Signed polygon area (shoelace); positive for counter-clockwise winding
pub fn polygon_area_signed(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

/// True when both segment endpoints lie strictly on one side of the axis line
pub fn segment_on_one_side(axis_pos: Vec2, axis_dir: Vec2, start: Vec2, end: Vec2) -> bool {
    let n = axis_dir.perpendicular_left();
    let d1 = n.dot(&(start - axis_pos));
    let d2 = n.dot(&(end - axis_pos));
    d1 * d2 > 0.0
}

/// Project a segment onto a direction, returning the sorted scalar range
pub fn project_segment(start: Vec2, end: Vec2, onto: Vec2) -> (f32, f32) {
    let unit = onto.normalize_or_zero();
    let a = unit.dot(&start);
    let b = unit.dot(&end);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Inclusive range overlap; each range may be given in any order
pub fn overlapping_range(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    let (a_min, a_max) = if a_min <= a_max { (a_min, a_max) } else { (a_max, a_min) };
    let (b_min, b_max) = if b_min <= b_max { (b_min, b_max) } else { (b_max, b_min) };
    b_min <= a_max && a_min <= b_max
}

/// Closest point to `point` on the segment `start..end`
pub fn closest_point_on_segment(start: Vec2, end: Vec2, point: Vec2) -> Vec2 {
    let d = end - start;
    let len_sq = d.magnitude_squared();
    if len_sq == 0.0 {
        return start;
    }
    let t = ((point - start).dot(&d) / len_sq).clamp(0.0, 1.0);
    start + d * t
}

/// Segment/segment crossing via signed triangle areas
///
/// Returns the crossing point and its parameter along `a`. Parallel,
/// collinear and degenerate segments never report a crossing.
pub fn intersect_segment_segment_info(a_start: Vec2, a_end: Vec2, b_start: Vec2, b_end: Vec2) -> Option<(Vec2, f32)> {
    let a1 = triangle_area_signed(a_start, a_end, b_end);
    let a2 = triangle_area_signed(a_start, a_end, b_start);
    if a1 * a2 >= 0.0 {
        return None;
    }

    let a3 = triangle_area_signed(b_start, b_end, a_start);
    // a1 - a2 = a3 - a4
    let a4 = a3 + a2 - a1;
    if a3 * a4 >= 0.0 {
        return None;
    }

    let t = a3 / (a3 - a4);
    Some((a_start + (a_end - a_start) * t, t))
}

/// Ray/segment crossing
///
/// Returns the crossing point and its parameter along the segment. A ray
/// running along a collinear segment reports its own origin when the origin
/// lies on the segment.
pub fn intersect_ray_segment_info(ray_pos: Vec2, ray_dir: Vec2, start: Vec2, end: Vec2) -> Option<(Vec2, f32)> {
    let vel = end - start;
    let w = ray_pos - start;
    let p = ray_dir.x * vel.y - ray_dir.y * vel.x;

    if p == 0.0 {
        let c = w.x * ray_dir.y - w.y * ray_dir.x;
        if c != 0.0 {
            return None;
        }
        let t = if vel.x == 0.0 { w.y / vel.y } else { w.x / vel.x };
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        return Some((ray_pos, t));
    }

    let t = (ray_dir.x * w.y - ray_dir.y * w.x) / p;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let tr = (vel.x * w.y - vel.y * w.x) / p;
    if tr < 0.0 {
        return None;
    }
    Some((start + vel * t, t))
}

/// Where a line through `start` along `dir` meets a circle
///
/// With `clamp_to_segment` the parameters are restricted to `[0, 1]`, which
/// turns `dir` into the segment displacement. Exactly tangent lines produce
/// a single point.
#[allow(clippy::float_cmp)]
fn line_circle_points(start: Vec2, dir: Vec2, center: Vec2, radius: f32, clamp_to_segment: bool) -> Vec<Vec2> {
    if dir.x == 0.0 && dir.y == 0.0 {
        return Vec::new();
    }

    let dl = dir.magnitude_squared();
    let t = (center - start).dot(&dir) / dl;
    let nearest = start + dir * t;
    let dist = (nearest - center).magnitude();
    let in_range = |t: f32| !clamp_to_segment || (0.0..=1.0).contains(&t);

    if dist == radius {
        return if in_range(t) { vec![nearest] } else { Vec::new() };
    }
    if dist > radius {
        return Vec::new();
    }

    let dt = (radius * radius - dist * dist).sqrt() / dl.sqrt();
    let mut points = Vec::with_capacity(2);
    let t1 = t - dt;
    if in_range(t1) {
        points.push(start + dir * t1);
    }
    let t2 = t + dt;
    if in_range(t2) {
        points.push(start + dir * t2);
    }
    points
}

/// Points where an infinite line meets a circle (0, 1 or 2)
pub fn intersect_line_circle(line_pos: Vec2, line_dir: Vec2, center: Vec2, radius: f32) -> Vec<Vec2> {
    line_circle_points(line_pos, line_dir, center, radius, false)
}

/// Points where a segment meets a circle boundary (0, 1 or 2)
pub fn intersect_segment_circle(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Vec<Vec2> {
    line_circle_points(start, end - start, center, radius, true)
}

/// Points where two circle boundaries meet, computed in double precision
///
/// No points when the circles are apart, when one strictly contains the
/// other, or when they coincide. One point when externally tangent.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub fn intersect_circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Vec<Vec2> {
    let (cx0, cy0, cx1, cy1) = (f64::from(c0.x), f64::from(c0.y), f64::from(c1.x), f64::from(c1.y));
    let (r0, r1) = (f64::from(r0), f64::from(r1));
    let dx = cx0 - cx1;
    let dy = cy0 - cy1;
    let dist = (dx * dx + dy * dy).sqrt();

    if dist > r0 + r1 || dist < (r0 - r1).abs() {
        return Vec::new();
    }
    if dist == 0.0 && r0 == r1 {
        return Vec::new();
    }

    let a = (r0 * r0 - r1 * r1 + dist * dist) / (2.0 * dist);
    let h = (r0 * r0 - a * a).max(0.0).sqrt();
    let cx2 = cx0 + a * (cx1 - cx0) / dist;
    let cy2 = cy0 + a * (cy1 - cy0) / dist;

    let first = Vec2::new(
        (cx2 + h * (cy1 - cy0) / dist) as f32,
        (cy2 - h * (cx1 - cx0) / dist) as f32,
    );
    if dist == r0 + r1 {
        return vec![first];
    }
    let second = Vec2::new(
        (cx2 - h * (cy1 - cy0) / dist) as f32,
        (cy2 + h * (cx1 - cx0) / dist) as f32,
    );
    vec![first, second]
}

/// Does the infinite line pass through the circle
pub fn overlap_circle_line(center: Vec2, radius: f32, line_pos: Vec2, line_dir: Vec2) -> bool {
    let nearest = line_pos + (center - line_pos).project_onto(&line_dir);
    is_point_in_circle(nearest, center, radius)
}

/// Does the ray starting at `ray_pos` touch the circle
pub fn overlap_circle_ray(center: Vec2, radius: f32, ray_pos: Vec2, ray_dir: Vec2) -> bool {
    let w = center - ray_pos;
    let p = w.x * ray_dir.y - w.y * ray_dir.x;
    if p < -radius || p > radius {
        return false;
    }
    let t = w.x * ray_dir.x + w.y * ray_dir.y;
    if t < 0.0 && w.magnitude_squared() > radius * radius {
        return false;
    }
    true
}

/// Do two infinite lines share a point
pub fn overlap_line_line(a_pos: Vec2, a_dir: Vec2, b_pos: Vec2, b_dir: Vec2) -> bool {
    if a_dir.is_parallel(&b_dir) {
        return (a_pos - b_pos).is_parallel(&a_dir);
    }
    true
}

/// Does the segment touch the infinite line
pub fn overlap_segment_line(start: Vec2, end: Vec2, line_pos: Vec2, line_dir: Vec2) -> bool {
    !segment_on_one_side(line_pos, line_dir, start, end)
}

/// Does the infinite line cross the rectangle
pub fn overlap_rect_line(rect: &Rect, line_pos: Vec2, line_dir: Vec2) -> bool {
    let n = line_dir.perpendicular_left();
    let min = rect.min();
    let max = rect.max();
    let c1 = min - line_pos;
    let c2 = max - line_pos;
    let c3 = Vec2::new(max.x, min.y) - line_pos;
    let c4 = Vec2::new(min.x, max.y) - line_pos;

    let dp1 = n.dot(&c1);
    let dp2 = n.dot(&c2);
    let dp3 = n.dot(&c3);
    let dp4 = n.dot(&c4);

    dp1 * dp2 <= 0.0 || dp2 * dp3 <= 0.0 || dp3 * dp4 <= 0.0
}

/// Exact point equality
#[allow(clippy::float_cmp)]
pub fn is_point_on_point(a: Vec2, b: Vec2) -> bool {
    a.x == b.x && a.y == b.y
}

/// Is `point` on the segment (within [`constants::EPSILON`] of the line)
pub fn is_point_on_segment(point: Vec2, start: Vec2, end: Vec2) -> bool {
    let d = end - start;
    let len_sq = d.magnitude_squared();
    if len_sq == 0.0 {
        return is_point_on_point(point, start);
    }
    let lp = point - start;
    if d.cross_2d(&lp).abs() > constants::EPSILON * len_sq.sqrt() {
        return false;
    }
    let along = lp.dot(&d);
    (0.0..=len_sq).contains(&along)
}

/// Is `point` on the ray starting at `start` heading along `dir`
pub fn is_point_on_ray(point: Vec2, start: Vec2, dir: Vec2) -> bool {
    let displacement = point - start;
    let p = dir.y * displacement.x - dir.x * displacement.y;
    if p != 0.0 {
        return false;
    }
    displacement.dot(&dir) >= 0.0
}

/// Inclusive point-in-circle test
pub fn is_point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    (center - point).magnitude_squared() <= radius * radius
}

/// Strict point-in-triangle test, independent of winding
pub fn is_point_in_triangle(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    let c1 = (b - a).cross_2d(&(p - a));
    let c2 = (c - b).cross_2d(&(p - b));
    let c3 = (a - c).cross_2d(&(p - c));
    (c1 < 0.0 && c2 < 0.0 && c3 < 0.0) || (c1 > 0.0 && c2 > 0.0 && c3 > 0.0)
}

/// Inclusive point-in-rectangle test
pub fn is_point_in_rect(point: Vec2, min: Vec2, size: Vec2) -> bool {
    let max = min + size;
    min.x <= point.x && max.x >= point.x && min.y <= point.y && max.y >= point.y
}

/// Even-odd point-in-polygon test
///
/// An edge counts as crossed when exactly one endpoint lies strictly below
/// the point's y, which keeps vertex-aligned rays from counting twice.
pub fn is_point_in_poly(point: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut odd_nodes = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let vi = poly[i];
        let vj = poly[j];
        if ((vi.y < point.y && vj.y >= point.y) || (vj.y < point.y && vi.y >= point.y))
            && vi.x + (point.y - vi.y) / (vj.y - vi.y) * (vj.x - vi.x) < point.x
        {
            odd_nodes = !odd_nodes;
        }
        j = i;
    }
    odd_nodes
}

/// Are all vertices of `other` inside `poly`
pub fn is_poly_in_poly(poly: &[Vec2], other: &[Vec2]) -> bool {
    other.iter().all(|p| is_point_in_poly(*p, poly))
}

/// Is the whole circle inside `poly`
pub fn is_circle_in_poly(center: Vec2, radius: f32, poly: &[Vec2]) -> bool {
    if poly.len() < 3 || !is_point_in_poly(center, poly) {
        return false;
    }
    (0..poly.len()).all(|i| {
        let start = poly[i];
        let end = poly[(i + 1) % poly.len()];
        intersect_segment_circle(start, end, center, radius).is_empty()
    })
}
