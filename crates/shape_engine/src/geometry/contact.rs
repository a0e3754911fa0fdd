//! Contact data produced by the intersection routines

use crate::foundation::math::{Vec2, Vec2Ext};

/// One contact sample: a point on a boundary and the boundary normal there
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionPoint {
    /// Contact position in world space
    pub point: Vec2,
    /// Surface normal at the contact
    pub normal: Vec2,
}

impl CollisionPoint {
    /// Create a new contact sample
    pub fn new(point: Vec2, normal: Vec2) -> Self {
        Self { point, normal }
    }

    /// Same point with the normal reversed
    pub fn flip_normal(&self) -> Self {
        Self {
            point: self.point,
            normal: -self.normal,
        }
    }
}

/// Ordered list of contact samples
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollisionPoints(pub Vec<CollisionPoint>);

impl CollisionPoints {
    /// Create an empty list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A list is valid when it holds at least one point
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Append a contact
    pub fn push(&mut self, point: CollisionPoint) {
        self.0.push(point);
    }

    /// Flip every normal that points away from `reference`
    pub fn flip_normals(&mut self, reference: Vec2) {
        for p in &mut self.0 {
            let dir = reference - p.point;
            if dir.is_facing_opposite_direction(&p.normal) {
                *p = p.flip_normal();
            }
        }
    }

    /// Contact closest to `origin`
    pub fn closest(&self, origin: Vec2) -> Option<CollisionPoint> {
        self.0.iter().copied().min_by(|a, b| {
            let la = (a.point - origin).magnitude_squared();
            let lb = (b.point - origin).magnitude_squared();
            la.total_cmp(&lb)
        })
    }
}

impl std::ops::Deref for CollisionPoints {
    type Target = Vec<CollisionPoint>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for CollisionPoints {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<CollisionPoint>> for CollisionPoints {
    fn from(points: Vec<CollisionPoint>) -> Self {
        Self(points)
    }
}

impl FromIterator<CollisionPoint> for CollisionPoints {
    fn from_iter<I: IntoIterator<Item = CollisionPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CollisionPoints {
    type Item = CollisionPoint;
    type IntoIter = std::vec::IntoIter<CollisionPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CollisionPoints {
    type Item = &'a CollisionPoint;
    type IntoIter = std::slice::Iter<'a, CollisionPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Averaged contact used for simple collision response
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionSurface {
    /// Averaged contact point
    pub point: Vec2,
    /// Averaged, normalized normal
    pub normal: Vec2,
    /// False when no contact contributed to the average
    pub valid: bool,
}

impl CollisionSurface {
    /// A valid surface
    pub fn new(point: Vec2, normal: Vec2) -> Self {
        Self {
            point,
            normal,
            valid: true,
        }
    }

    /// The invalid surface
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Average a set of `(point, normal)` samples; invalid when empty
    pub(crate) fn average<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (&'a Vec2, &'a Vec2)>,
    {
        let mut avg_point = Vec2::zeros();
        let mut avg_normal = Vec2::zeros();
        let mut count = 0_u32;
        for (point, normal) in samples {
            avg_point += point;
            avg_normal += normal;
            count += 1;
        }
        if count == 0 {
            return Self::invalid();
        }
        #[allow(clippy::cast_precision_loss)]
        let divisor = count as f32;
        Self::new(avg_point / divisor, avg_normal.normalize_or_zero())
    }
}

/// Raw contacts plus the representative surface derived from them
///
/// The surface averages every contact whose normal does not face the same
/// direction as the reference velocity. Back-facing contacts are dropped
/// from the average but stay in [`Intersection::points`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Intersection {
    /// True when at least one contact point exists
    pub valid: bool,
    /// Representative contact
    pub surface: CollisionSurface,
    /// Every contact, unfiltered
    pub points: CollisionPoints,
}

impl Intersection {
    /// Build from contacts, discarding normals that face along `velocity`
    pub fn new(points: CollisionPoints, velocity: Vec2) -> Self {
        if !points.is_valid() {
            return Self::default();
        }
        let surface = CollisionSurface::average(
            points
                .iter()
                .filter(|p| !p.normal.is_facing_same_direction(&velocity))
                .map(|p| (&p.point, &p.normal)),
        );
        Self {
            valid: true,
            surface,
            points,
        }
    }

    /// Build from contacts, averaging all of them
    pub fn from_points(points: CollisionPoints) -> Self {
        if !points.is_valid() {
            return Self::default();
        }
        let surface = CollisionSurface::average(points.iter().map(|p| (&p.point, &p.normal)));
        Self {
            valid: true,
            surface,
            points,
        }
    }
}
