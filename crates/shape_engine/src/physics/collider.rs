//! Colliders and the bodies that own them
//!
//! A [`Collider`] keeps its shape in model space and turns it into a world
//! [`Shape`] on demand from its current transform. Bodies and colliders live
//! in slotmap arenas inside the handler and are referred to by
//! [`BodyHandle`] and [`ColliderHandle`].

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::foundation::math::{Transform2D, Vec2};
use crate::geometry::{Circle, Polygon, Polyline, Rect, Segment, Shape, Triangle};
use crate::physics::collision_layers::{CollisionLayer, CollisionMask};
use crate::physics::collision_system::CollisionResponder;

new_key_type! {
    /// Handle of a [`CollisionBody`] registered with a handler
    pub struct BodyHandle;

    /// Handle of a [`Collider`] registered with a handler
    pub struct ColliderHandle;
}

/// Collider shape in model space
///
/// Coordinates are relative to the collider's transform; the transform
/// scales, rotates and then translates them into the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// The transform position itself
    Point,
    /// Circle around the transform position
    Circle {
        /// Radius before scaling
        radius: f32,
    },
    /// Segment between two local points
    Segment {
        /// Local start
        start: Vec2,
        /// Local end
        end: Vec2,
    },
    /// Triangle from three local points
    Triangle {
        /// First corner
        a: Vec2,
        /// Second corner
        b: Vec2,
        /// Third corner
        c: Vec2,
    },
    /// Rectangle of `size` anchored at `alignment`
    ///
    /// `alignment` is the point of the rectangle, in `0..=1` units of its
    /// size, that sits on the transform position: `(0.5, 0.5)` centers it.
    /// A rotated rectangle becomes a polygon in world space.
    Rect {
        /// Width and height before scaling
        size: Vec2,
        /// Anchor inside the rectangle
        alignment: Vec2,
    },
    /// Closed polygon from local points
    Polygon {
        /// Local vertices
        points: Vec<Vec2>,
    },
    /// Open polyline from local points
    Polyline {
        /// Local vertices
        points: Vec<Vec2>,
    },
}

impl ColliderShape {
    /// Centered rectangle
    pub fn rect(size: Vec2) -> Self {
        Self::Rect {
            size,
            alignment: Vec2::new(0.5, 0.5),
        }
    }

    /// World shape under `transform`
    #[allow(clippy::float_cmp)]
    pub fn to_world(&self, transform: &Transform2D) -> Shape {
        match self {
            ColliderShape::Point => Shape::Point(transform.position),
            ColliderShape::Circle { radius } => Shape::Circle(Circle::new(transform.position, radius * transform.scale.abs())),
            ColliderShape::Segment { start, end } => {
                Shape::Segment(Segment::new(transform.transform_point(*start), transform.transform_point(*end)))
            }
            ColliderShape::Triangle { a, b, c } => Shape::Triangle(Triangle::new(
                transform.transform_point(*a),
                transform.transform_point(*b),
                transform.transform_point(*c),
            )),
            ColliderShape::Rect { size, alignment } => {
                let top_left = -size.component_mul(alignment);
                let local = Rect::new(top_left.x, top_left.y, size.x, size.y);
                if transform.rotation == 0.0 {
                    let min = transform.transform_point(local.min());
                    let max = transform.transform_point(local.max());
                    Shape::Rect(Rect::from_min_max(min, max))
                } else {
                    Shape::Polygon(Polygon::new(transform_points(transform, &local.corners())))
                }
            }
            ColliderShape::Polygon { points } => Shape::Polygon(Polygon::new(transform_points(transform, points))),
            ColliderShape::Polyline { points } => Shape::Polyline(Polyline::new(transform_points(transform, points))),
        }
    }
}

fn transform_points(transform: &Transform2D, points: &[Vec2]) -> Vec<Vec2> {
    points.iter().map(|p| transform.transform_point(*p)).collect()
}

/// One collision shape with its filtering flags and transforms
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    /// Model-space shape
    pub shape: ColliderShape,

    /// Placement relative to the parent body
    pub offset: Transform2D,

    /// Disabled colliders are neither hashed nor processed
    pub enabled: bool,

    /// Layer other colliders filter on
    pub layer: CollisionLayer,

    /// Layers this collider reacts to
    pub mask: CollisionMask,

    /// Compute contact points for this collider's collisions
    pub compute_intersections: bool,

    /// Use the shape swept along the body velocity for the broad and narrow
    /// phase instead of the resting shape
    pub project_shape: bool,

    cur_transform: Transform2D,
    prev_transform: Transform2D,
    parent: Option<BodyHandle>,
}

impl Collider {
    /// Enabled collider on every layer's radar, without intersections
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset: Transform2D::identity(),
            enabled: true,
            layer: CollisionLayer::default(),
            mask: CollisionMask::default(),
            compute_intersections: false,
            project_shape: false,
            cur_transform: Transform2D::identity(),
            prev_transform: Transform2D::identity(),
            parent: None,
        }
    }

    /// Set the layer
    #[must_use]
    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Set the mask
    #[must_use]
    pub fn with_mask(mut self, mask: CollisionMask) -> Self {
        self.mask = mask;
        self
    }

    /// Set the offset from the parent body
    #[must_use]
    pub fn with_offset(mut self, offset: Transform2D) -> Self {
        self.offset = offset;
        self
    }

    /// Request contact points
    #[must_use]
    pub fn with_intersections(mut self, compute: bool) -> Self {
        self.compute_intersections = compute;
        self
    }

    /// Request swept projection
    #[must_use]
    pub fn with_projection(mut self, project: bool) -> Self {
        self.project_shape = project;
        self
    }

    /// Place a standalone collider; previous transform follows along
    #[must_use]
    pub fn with_transform(mut self, transform: Transform2D) -> Self {
        self.cur_transform = transform;
        self.prev_transform = transform;
        self
    }

    /// World transform this frame
    pub fn cur_transform(&self) -> Transform2D {
        self.cur_transform
    }

    /// World transform at the end of the previous update
    pub fn prev_transform(&self) -> Transform2D {
        self.prev_transform
    }

    /// Owning body, `None` for standalone colliders
    pub fn parent(&self) -> Option<BodyHandle> {
        self.parent
    }

    /// Shape in world space
    pub fn world_shape(&self) -> Shape {
        self.shape.to_world(&self.cur_transform)
    }

    /// World bounding box
    pub fn bounding_box(&self) -> Rect {
        self.world_shape().bounding_box()
    }

    /// World shape swept by `displacement`
    pub fn projected_shape(&self, displacement: Vec2, circle_edge_count: usize) -> Option<Shape> {
        self.world_shape().project_with_resolution(displacement, circle_edge_count)
    }

    pub(crate) fn set_transform(&mut self, transform: Transform2D) {
        self.cur_transform = transform;
    }

    pub(crate) fn follow_parent(&mut self, parent: &Transform2D) {
        self.cur_transform = parent.combine(&self.offset);
    }

    pub(crate) fn commit_transform(&mut self) {
        self.prev_transform = self.cur_transform;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<BodyHandle>) {
        self.parent = parent;
    }
}

/// Movable owner of colliders and receiver of collision callbacks
pub struct CollisionBody {
    /// World transform; colliders follow it through their offsets
    pub transform: Transform2D,

    /// Velocity used for swept projection and velocity-aware contacts
    pub velocity: Vec2,

    /// Disabled bodies generate no collisions of their own
    pub enabled: bool,

    colliders: Vec<ColliderHandle>,
    responder: Option<Box<dyn CollisionResponder>>,
}

impl CollisionBody {
    /// Enabled body at rest without colliders
    pub fn new(transform: Transform2D) -> Self {
        Self {
            transform,
            velocity: Vec2::zeros(),
            enabled: true,
            colliders: Vec::new(),
            responder: None,
        }
    }

    /// Set the starting velocity
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Attach the object that receives this body's collision callbacks
    #[must_use]
    pub fn with_responder(mut self, responder: Box<dyn CollisionResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Attached colliders in attachment order
    pub fn colliders(&self) -> &[ColliderHandle] {
        &self.colliders
    }

    /// Does the body own any collider
    pub fn has_colliders(&self) -> bool {
        !self.colliders.is_empty()
    }

    pub(crate) fn push_collider(&mut self, collider: ColliderHandle) {
        self.colliders.push(collider);
    }

    pub(crate) fn remove_collider(&mut self, collider: ColliderHandle) {
        self.colliders.retain(|c| *c != collider);
    }

    pub(crate) fn take_responder(&mut self) -> Option<Box<dyn CollisionResponder>> {
        self.responder.take()
    }

    pub(crate) fn restore_responder(&mut self, responder: Box<dyn CollisionResponder>) {
        if self.responder.is_none() {
            self.responder = Some(responder);
        }
    }
}

impl fmt::Debug for CollisionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionBody")
            .field("transform", &self.transform)
            .field("velocity", &self.velocity)
            .field("enabled", &self.enabled)
            .field("colliders", &self.colliders)
            .field("has_responder", &self.responder.is_some())
            .finish()
    }
}
