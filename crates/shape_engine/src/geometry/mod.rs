//! Geometry kernel
//!
//! Overlap and intersection between every pair of shape kinds (point,
//! circle, segment, triangle, rectangle, polygon, polyline):
//!
//! - [`Shape::overlap`] answers whether two shapes touch at all.
//! - [`Shape::intersect`] returns the boundary contacts with normals that
//!   belong to the second shape.
//!
//! Triangles, rectangles, polygons and polylines are reduced to their
//! boundary edges, so the closed-form math lives in the circle and segment
//! routines of [`intersect`] and [`overlap`]. Degenerate input (zero-length
//! segments, polygons without area) yields empty results, never errors.

pub mod contact;
pub mod intersect;
pub mod overlap;
pub mod predicates;
pub mod shape;
pub mod shapes;

pub use contact::{CollisionPoint, CollisionPoints, CollisionSurface, Intersection};
pub use shape::{check_ccd, convex_hull, Shape};
pub use shapes::{Circle, Polygon, Polyline, Rect, Segment, Segments, Triangle, DEFAULT_CIRCLE_EDGE_COUNT};
