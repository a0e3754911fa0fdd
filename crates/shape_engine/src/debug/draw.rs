//! Debug drawing primitives and system
//!
//! The library never renders anything itself. Systems push 2D primitives into
//! a [`DebugDrawSystem`] and the application drains them into whatever
//! renderer it uses.

use crate::foundation::math::{Vec2, Vec4};
use crate::geometry::{Rect, Shape};

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// Start point
        start: Vec2,
        /// End point
        end: Vec2,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime in seconds
        duration: f32,
    },

    /// Axis-aligned rectangle
    Rect {
        /// Rectangle in world space
        rect: Rect,
        /// RGBA color
        color: Vec4,
        /// Filled or outlined
        filled: bool,
        /// Remaining lifetime in seconds
        duration: f32,
    },

    /// Circle at center with radius
    Circle {
        /// Center
        center: Vec2,
        /// Radius
        radius: f32,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime in seconds
        duration: f32,
    },

    /// Point at position
    Point {
        /// Position
        position: Vec2,
        /// RGBA color
        color: Vec4,
        /// Point size in pixels
        size: f32,
        /// Remaining lifetime in seconds
        duration: f32,
    },
}

impl DebugShape {
    /// Get remaining duration
    pub fn duration(&self) -> f32 {
        match self {
            DebugShape::Line { duration, .. }
            | DebugShape::Rect { duration, .. }
            | DebugShape::Circle { duration, .. }
            | DebugShape::Point { duration, .. } => *duration,
        }
    }

    /// Set duration (returns modified shape)
    #[must_use]
    pub fn with_duration(mut self, new_duration: f32) -> Self {
        match &mut self {
            DebugShape::Line { duration, .. }
            | DebugShape::Rect { duration, .. }
            | DebugShape::Circle { duration, .. }
            | DebugShape::Point { duration, .. } => *duration = new_duration,
        }
        self
    }

    /// Decrease duration by `delta_time`, returns true if expired
    pub fn tick(&mut self, delta_time: f32) -> bool {
        match self {
            DebugShape::Line { duration, .. }
            | DebugShape::Rect { duration, .. }
            | DebugShape::Circle { duration, .. }
            | DebugShape::Point { duration, .. } => {
                *duration -= delta_time;
                *duration <= 0.0
            }
        }
    }
}

/// Debug drawing system collecting shapes for the application's renderer
///
/// Shapes expire after their duration.
#[derive(Debug)]
pub struct DebugDrawSystem {
    /// Temporary shapes that expire after their duration
    temporary_shapes: Vec<DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            temporary_shapes: Vec::new(),
            enabled: true,
        }
    }

    /// Draw a line segment (temporary)
    pub fn draw_line(&mut self, start: Vec2, end: Vec2, color: Vec4, duration: f32) {
        self.push(DebugShape::Line {
            start,
            end,
            color,
            duration,
        });
    }

    /// Draw a rectangle (temporary)
    pub fn draw_rect(&mut self, rect: Rect, color: Vec4, filled: bool, duration: f32) {
        self.push(DebugShape::Rect {
            rect,
            color,
            filled,
            duration,
        });
    }

    /// Draw a circle outline (temporary)
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Vec4, duration: f32) {
        self.push(DebugShape::Circle {
            center,
            radius,
            color,
            duration,
        });
    }

    /// Draw a point (temporary)
    pub fn draw_point(&mut self, position: Vec2, color: Vec4, size: f32, duration: f32) {
        self.push(DebugShape::Point {
            position,
            color,
            size,
            duration,
        });
    }

    /// Draw the outline of any geometry shape (temporary)
    ///
    /// Rectangles and circles map to their own primitive, everything else is
    /// drawn as its boundary edges.
    pub fn draw_shape(&mut self, shape: &Shape, color: Vec4, duration: f32) {
        if !self.enabled {
            return;
        }
        match shape {
            Shape::Point(p) => self.draw_point(*p, color, 1.0, duration),
            Shape::Circle(c) => self.draw_circle(c.center, c.radius, color, duration),
            Shape::Rect(r) => self.draw_rect(*r, color, false, duration),
            _ => {
                for edge in shape.edges(false).iter() {
                    self.draw_line(edge.start, edge.end, color, duration);
                }
            }
        }
    }

    /// Age temporary shapes and drop the expired ones
    pub fn update(&mut self, delta_time: f32) {
        self.temporary_shapes.retain_mut(|shape| !shape.tick(delta_time));
    }

    /// Every shape to render this frame
    pub fn get_shapes(&self) -> Vec<&DebugShape> {
        if !self.enabled {
            return Vec::new();
        }
        self.temporary_shapes.iter().collect()
    }

    /// Number of shapes currently held
    pub fn shape_count(&self) -> usize {
        self.temporary_shapes.len()
    }

    /// Drop every temporary shape
    pub fn clear(&mut self) {
        self.temporary_shapes.clear();
    }

    fn push(&mut self, shape: DebugShape) {
        if self.enabled {
            self.temporary_shapes.push(shape);
        }
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}
