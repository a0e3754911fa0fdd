//! Broad-phase collision handler
//!
//! The handler owns every body and collider, re-buckets them into a
//! [`SpatialHash`] each update, tests the candidates of every enabled body
//! collider against it and hands the resulting [`CollisionInformation`] to
//! the body's [`CollisionResponder`].
//!
//! Structural changes (adding or removing bodies and colliders) are queued
//! and applied at the start of the resolve step, so responders may add or
//! remove objects from inside their callbacks. Overlapping pairs are tracked
//! across updates to tell first contacts from continued ones and to report
//! overlaps that ended.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::mem;

use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

use crate::config::{CollisionConfig, ConfigError};
use crate::debug::DebugDrawSystem;
use crate::foundation::math::{Transform2D, Vec2, Vec4};
use crate::geometry::{Rect, Shape};
use crate::physics::collider::{BodyHandle, Collider, ColliderHandle, CollisionBody};
use crate::physics::collision::{Collision, CollisionInformation};
use crate::physics::collision_layers::CollisionMask;
use crate::physics::registers::{ObjectRegister, OverlapRegister};
use crate::spatial::SpatialHash;

/// Collision handler errors
#[derive(Error, Debug)]
pub enum CollisionError {
    /// Grid without rows or columns
    #[error("Invalid spatial hash grid: {rows} rows x {cols} cols")]
    InvalidGrid {
        /// Requested rows
        rows: usize,
        /// Requested columns
        cols: usize,
    },

    /// Bounds without area or with non-finite values
    #[error("Invalid bounds: {0:?}")]
    InvalidBounds(Rect),

    /// Stale or foreign body handle
    #[error("Unknown body: {0:?}")]
    UnknownBody(BodyHandle),

    /// Stale or foreign collider handle
    #[error("Unknown collider: {0:?}")]
    UnknownCollider(ColliderHandle),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Receiver of a body's collision callbacks
///
/// Every callback gets the handler back, so responders can query space or
/// queue structural changes; queued changes apply on the next resolve.
pub trait CollisionResponder {
    /// One call per collider of the body that collided this update
    fn resolve_collision(&mut self, handler: &mut CollisionHandler, info: &CollisionInformation);

    /// `collider` stopped overlapping `other`
    fn collision_ended(&mut self, _handler: &mut CollisionHandler, _collider: ColliderHandle, _other: ColliderHandle) {}

    /// The body became live in the handler
    fn on_collision_system_entered(&mut self, _handler: &mut CollisionHandler, _body: BodyHandle) {}

    /// The body was removed from the handler
    fn on_collision_system_left(&mut self, _handler: &mut CollisionHandler, _body: BodyHandle) {}
}

/// Owner of bodies and colliders, driving detection and resolution
pub struct CollisionHandler {
    pub(super) bodies: SlotMap<BodyHandle, CollisionBody>,
    pub(super) colliders: SlotMap<ColliderHandle, Collider>,
    body_register: ObjectRegister<BodyHandle>,
    collider_register: ObjectRegister<ColliderHandle>,
    pending_detach: Vec<ColliderHandle>,

    pub(super) spatial_hash: SpatialHash<ColliderHandle>,
    pub(super) world_shapes: SecondaryMap<ColliderHandle, Shape>,

    collision_stack: BTreeMap<ColliderHandle, Vec<Collision>>,
    active_register: OverlapRegister,
    old_register: OverlapRegister,

    pub(super) candidate_check: HashSet<ColliderHandle>,
    pub(super) candidate_buckets: Vec<usize>,
    circle_edge_count: usize,
}

impl CollisionHandler {
    /// Handler over `bounds` split into `rows * cols` cells
    pub fn new(bounds: Rect, rows: usize, cols: usize, start_capacity: usize) -> Result<Self, CollisionError> {
        let spatial_hash = SpatialHash::new(bounds, rows, cols)?;
        log::debug!(
            "Creating collision handler: bounds {:?}, {}x{} grid, capacity {}",
            bounds,
            rows,
            cols,
            start_capacity
        );
        Ok(Self {
            bodies: SlotMap::with_capacity_and_key(start_capacity),
            colliders: SlotMap::with_capacity_and_key(start_capacity),
            body_register: ObjectRegister::new(start_capacity),
            collider_register: ObjectRegister::new(start_capacity),
            pending_detach: Vec::new(),
            spatial_hash,
            world_shapes: SecondaryMap::with_capacity(start_capacity),
            collision_stack: BTreeMap::new(),
            active_register: OverlapRegister::new(),
            old_register: OverlapRegister::new(),
            candidate_check: HashSet::with_capacity(start_capacity / 4),
            candidate_buckets: Vec::new(),
            circle_edge_count: crate::geometry::DEFAULT_CIRCLE_EDGE_COUNT,
        })
    }

    /// Handler built from a configuration
    pub fn from_config(config: &CollisionConfig) -> Result<Self, CollisionError> {
        let mut handler = Self::new(config.bounds.into(), config.rows, config.cols, config.start_capacity)?;
        handler.circle_edge_count = config.circle_edge_count.max(3);
        Ok(handler)
    }

    /// Number of live bodies
    pub fn count(&self) -> usize {
        self.body_register.len()
    }

    /// Region covered by the spatial hash
    pub fn bounds(&self) -> Rect {
        self.spatial_hash.bounds()
    }

    /// The broad-phase grid as of the last update
    pub fn spatial_hash(&self) -> &SpatialHash<ColliderHandle> {
        &self.spatial_hash
    }

    /// Move the spatial hash to new bounds
    pub fn resize_bounds(&mut self, bounds: Rect) -> Result<(), CollisionError> {
        self.spatial_hash.resize_bounds(bounds)?;
        log::debug!("Collision bounds resized to {:?}", bounds);
        Ok(())
    }

    /// Queue a body for addition; it becomes live on the next resolve
    pub fn add_body(&mut self, body: CollisionBody) -> BodyHandle {
        let handle = self.bodies.insert(body);
        self.body_register.add(handle);
        handle
    }

    /// Queue several bodies for addition
    pub fn add_bodies<I>(&mut self, bodies: I) -> Vec<BodyHandle>
    where
        I: IntoIterator<Item = CollisionBody>,
    {
        bodies.into_iter().map(|body| self.add_body(body)).collect()
    }

    /// Queue a body and its colliders for removal
    pub fn remove_body(&mut self, body: BodyHandle) -> Result<(), CollisionError> {
        if !self.bodies.contains_key(body) {
            log::warn!("Ignoring removal of unknown body {:?}", body);
            return Err(CollisionError::UnknownBody(body));
        }
        self.body_register.remove(body);
        Ok(())
    }

    /// Queue several bodies for removal; returns how many were known
    pub fn remove_bodies<I>(&mut self, bodies: I) -> usize
    where
        I: IntoIterator<Item = BodyHandle>,
    {
        bodies.into_iter().filter(|body| self.remove_body(*body).is_ok()).count()
    }

    /// Queue a standalone collider for addition
    ///
    /// Standalone colliders are found by bodies and queries but never
    /// produce collisions of their own.
    pub fn add_collider(&mut self, mut collider: Collider) -> ColliderHandle {
        collider.set_parent(None);
        let handle = self.colliders.insert(collider);
        self.collider_register.add(handle);
        handle
    }

    /// Queue a collider for removal, standalone or attached
    pub fn remove_collider(&mut self, collider: ColliderHandle) -> Result<(), CollisionError> {
        match self.colliders.get(collider).map(Collider::parent) {
            None => {
                log::warn!("Ignoring removal of unknown collider {:?}", collider);
                Err(CollisionError::UnknownCollider(collider))
            }
            Some(Some(_)) => self.detach_collider(collider),
            Some(None) => {
                self.collider_register.remove(collider);
                Ok(())
            }
        }
    }

    /// Attach a collider to a body
    ///
    /// The collider takes part from the next update on.
    pub fn attach_collider(&mut self, body: BodyHandle, mut collider: Collider) -> Result<ColliderHandle, CollisionError> {
        let Some(owner) = self.bodies.get_mut(body) else {
            log::warn!("Cannot attach collider to unknown body {:?}", body);
            return Err(CollisionError::UnknownBody(body));
        };
        if self.body_register.is_removal_pending(&body) {
            log::warn!("Attaching collider to body {:?} which is scheduled for removal", body);
        }
        collider.set_parent(Some(body));
        collider.follow_parent(&owner.transform);
        collider.commit_transform();
        let handle = self.colliders.insert(collider);
        owner.push_collider(handle);
        Ok(handle)
    }

    /// Queue a body collider for detachment and removal
    pub fn detach_collider(&mut self, collider: ColliderHandle) -> Result<(), CollisionError> {
        if !self.colliders.contains_key(collider) {
            log::warn!("Ignoring detach of unknown collider {:?}", collider);
            return Err(CollisionError::UnknownCollider(collider));
        }
        self.pending_detach.push(collider);
        Ok(())
    }

    /// Body by handle
    pub fn body(&self, body: BodyHandle) -> Option<&CollisionBody> {
        self.bodies.get(body)
    }

    /// Mutable body by handle; colliders pick up transform changes on the
    /// next update
    pub fn body_mut(&mut self, body: BodyHandle) -> Option<&mut CollisionBody> {
        self.bodies.get_mut(body)
    }

    /// Collider by handle
    pub fn collider(&self, collider: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(collider)
    }

    /// Mutable collider by handle
    pub fn collider_mut(&mut self, collider: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(collider)
    }

    /// Is the body live (added and flushed, not yet removed)
    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.body_register.contains(&body)
    }

    /// Move a body and its colliders
    pub fn set_body_transform(&mut self, body: BodyHandle, transform: Transform2D) -> Result<(), CollisionError> {
        let Some(owner) = self.bodies.get_mut(body) else {
            log::warn!("Cannot move unknown body {:?}", body);
            return Err(CollisionError::UnknownBody(body));
        };
        owner.transform = transform;
        for handle in owner.colliders() {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                collider.follow_parent(&transform);
            }
        }
        Ok(())
    }

    /// Change a body's velocity
    pub fn set_body_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> Result<(), CollisionError> {
        let Some(owner) = self.bodies.get_mut(body) else {
            log::warn!("Cannot set velocity of unknown body {:?}", body);
            return Err(CollisionError::UnknownBody(body));
        };
        owner.velocity = velocity;
        Ok(())
    }

    /// Place a standalone collider
    ///
    /// Attached colliders follow their body and are moved through it.
    pub fn set_collider_transform(&mut self, collider: ColliderHandle, transform: Transform2D) -> Result<(), CollisionError> {
        let Some(target) = self.colliders.get_mut(collider) else {
            log::warn!("Cannot move unknown collider {:?}", collider);
            return Err(CollisionError::UnknownCollider(collider));
        };
        if target.parent().is_some() {
            log::warn!("Collider {:?} follows its body; moving it directly is overwritten next update", collider);
        }
        target.set_transform(transform);
        Ok(())
    }

    /// Bodies owning the given colliders
    pub fn parents_of<I>(&self, colliders: I) -> BTreeSet<BodyHandle>
    where
        I: IntoIterator<Item = ColliderHandle>,
    {
        colliders
            .into_iter()
            .filter_map(|c| self.colliders.get(c).and_then(Collider::parent))
            .collect()
    }

    /// Number of overlapping pairs carried over from the last update
    pub fn overlap_count(&self) -> usize {
        self.old_register.len()
    }

    /// `(collider, other)` pairs overlapping as of the last update
    pub fn overlaps(&self) -> impl Iterator<Item = &(ColliderHandle, ColliderHandle)> {
        self.old_register.iter()
    }

    /// Is `collider` known to overlap `other` as of the last update
    pub fn is_overlapping(&self, collider: ColliderHandle, other: ColliderHandle) -> bool {
        self.old_register.contains(collider, other)
    }

    /// Run one frame: re-bucket, detect, resolve
    pub fn update(&mut self, dt: f32) {
        self.sync_transforms();
        self.fill_spatial_hash();
        self.process_collisions(dt);
        self.resolve();
        for collider in self.colliders.values_mut() {
            collider.commit_transform();
        }
    }

    /// Remove every body and collider; live bodies get their left callback
    pub fn clear(&mut self) {
        let live = self.body_register.clear();
        self.collider_register.clear();
        self.pending_detach.clear();
        self.collision_stack.clear();
        self.active_register.clear();
        self.old_register.clear();
        self.world_shapes.clear();
        self.spatial_hash.clear();

        for body in live {
            if let Some(mut removed) = self.bodies.remove(body) {
                if let Some(mut responder) = removed.take_responder() {
                    responder.on_collision_system_left(self, body);
                }
            }
        }
        self.bodies.clear();
        self.colliders.clear();
        log::debug!("Collision handler cleared");
    }

    /// Clear and release the spatial hash memory
    pub fn close(&mut self) {
        self.clear();
        self.spatial_hash.close();
    }

    /// Draw the spatial hash grid
    pub fn debug_draw(&self, draw: &mut DebugDrawSystem, border: Vec4, fill: Vec4) {
        self.spatial_hash.debug_draw(draw, border, fill);
    }

    fn sync_transforms(&mut self) {
        for body in self.bodies.values() {
            for handle in body.colliders() {
                if let Some(collider) = self.colliders.get_mut(*handle) {
                    collider.follow_parent(&body.transform);
                }
            }
        }
    }

    fn fill_spatial_hash(&mut self) {
        self.world_shapes.clear();
        let bodies = &self.bodies;
        let body_colliders = self
            .body_register
            .iter()
            .filter_map(|handle| bodies.get(*handle))
            .filter(|body| body.enabled)
            .flat_map(|body| body.colliders().iter().copied());
        let live = body_colliders.chain(self.collider_register.iter().copied());

        for handle in live {
            if let Some(collider) = self.colliders.get(handle).filter(|c| c.enabled) {
                self.world_shapes.insert(handle, collider.world_shape());
            }
        }
        let shapes = &self.world_shapes;
        self.spatial_hash.fill(shapes.iter().map(|(handle, shape)| (handle, shape.bounding_box())));
    }

    fn process_collisions(&mut self, dt: f32) {
        let Self {
            bodies,
            colliders,
            body_register,
            spatial_hash,
            world_shapes,
            collision_stack,
            active_register,
            old_register,
            candidate_check,
            candidate_buckets,
            circle_edge_count,
            ..
        } = self;

        let mut processed = 0_usize;
        for body_handle in body_register.iter() {
            let Some(body) = bodies.get(*body_handle) else {
                continue;
            };
            if !body.enabled || !body.has_colliders() {
                continue;
            }

            for handle in body.colliders() {
                let Some(collider) = colliders.get(*handle) else {
                    continue;
                };
                let Some(resting) = world_shapes.get(*handle) else {
                    continue;
                };
                if !collider.enabled {
                    continue;
                }
                processed += 1;

                let projected = if collider.project_shape {
                    resting.project_with_resolution(body.velocity * dt, *circle_edge_count)
                } else {
                    None
                };
                let shape = projected.as_ref().unwrap_or(resting);

                candidate_check.clear();
                if collider.project_shape {
                    spatial_hash.shape_candidate_buckets(shape, candidate_buckets);
                } else {
                    spatial_hash.registered_candidate_buckets(*handle, candidate_buckets);
                }
                if candidate_buckets.is_empty() {
                    continue;
                }

                let mut collisions = Vec::new();
                for index in candidate_buckets.iter() {
                    for candidate in spatial_hash.bucket(*index) {
                        if candidate == handle {
                            continue;
                        }
                        let (Some(other), Some(other_shape)) = (colliders.get(*candidate), world_shapes.get(*candidate)) else {
                            continue;
                        };
                        if other.parent().is_some() && other.parent() == collider.parent() {
                            continue;
                        }
                        if !collider.mask.has(other.layer) {
                            continue;
                        }
                        if !candidate_check.insert(*candidate) {
                            continue;
                        }
                        if !shape.overlap(other_shape) {
                            continue;
                        }

                        let first_contact = !old_register.remove_entry(*handle, *candidate);
                        active_register.add_entry(*handle, *candidate);

                        let other_velocity = other
                            .parent()
                            .and_then(|parent| bodies.get(parent))
                            .map_or_else(Vec2::zeros, |b| b.velocity);

                        let collision = if collider.compute_intersections {
                            let mut points = shape.intersect(other_shape);
                            if points.is_empty() {
                                // fully inside: fall back to the boundary point nearest the last position
                                let reference = collider.prev_transform().position;
                                if !other_shape.contains_point(reference) {
                                    points.push(other_shape.closest_point(reference));
                                }
                            }
                            Collision::with_points(*handle, *candidate, first_contact, body.velocity, other_velocity, points)
                        } else {
                            Collision::new(*handle, *candidate, first_contact, body.velocity, other_velocity)
                        };
                        collisions.push(collision);
                    }
                }

                if !collisions.is_empty() {
                    collision_stack.entry(*handle).or_default().extend(collisions);
                }
            }
        }
        log::trace!(
            "Processed {} colliders, {} with collisions, {} active overlaps",
            processed,
            collision_stack.len(),
            active_register.len()
        );
    }

    fn resolve(&mut self) {
        self.process_registers();

        let stack = mem::take(&mut self.collision_stack);
        let mut resolved = 0_usize;
        for (handle, collisions) in stack {
            if collisions.is_empty() {
                continue;
            }
            let Some(collider) = self.colliders.get(handle) else {
                continue;
            };
            let body = collider.parent();
            let info = CollisionInformation::new(handle, body, collisions, collider.compute_intersections);
            if let Some(body) = body {
                self.with_responder(body, |responder, handler| responder.resolve_collision(handler, &info));
            }
            resolved += 1;
        }

        let ended = self.old_register.drain();
        for (collider, other) in &ended {
            if let Some(body) = self.colliders.get(*collider).and_then(Collider::parent) {
                self.with_responder(body, |responder, handler| responder.collision_ended(handler, *collider, *other));
            }
        }
        self.old_register.swap(&mut self.active_register);
        self.active_register.clear();

        log::trace!("Resolved {} collision lists, {} overlaps ended", resolved, ended.len());
    }

    fn process_registers(&mut self) {
        let detached = mem::take(&mut self.pending_detach);
        for handle in &detached {
            if let Some(collider) = self.colliders.remove(*handle) {
                if let Some(body) = collider.parent().and_then(|parent| self.bodies.get_mut(parent)) {
                    body.remove_collider(*handle);
                }
            }
        }

        let body_changes = self.body_register.process();
        let collider_changes = self.collider_register.process();

        for handle in body_changes.removed.iter().chain(&body_changes.cancelled) {
            let Some(mut body) = self.bodies.remove(*handle) else {
                continue;
            };
            for collider in body.colliders() {
                self.colliders.remove(*collider);
            }
            if body_changes.removed.contains(handle) {
                if let Some(mut responder) = body.take_responder() {
                    responder.on_collision_system_left(self, *handle);
                }
            }
        }
        for handle in &body_changes.added {
            self.with_responder(*handle, |responder, handler| responder.on_collision_system_entered(handler, *handle));
        }
        for handle in collider_changes.removed.iter().chain(&collider_changes.cancelled) {
            self.colliders.remove(*handle);
        }

        if !detached.is_empty()
            || !body_changes.added.is_empty()
            || !body_changes.removed.is_empty()
            || !collider_changes.added.is_empty()
            || !collider_changes.removed.is_empty()
        {
            log::debug!(
                "Collision registers flushed: bodies +{} -{}, colliders +{} -{}, detached {}",
                body_changes.added.len(),
                body_changes.removed.len(),
                collider_changes.added.len(),
                collider_changes.removed.len(),
                detached.len()
            );
        }
    }

    fn with_responder<F>(&mut self, body: BodyHandle, callback: F)
    where
        F: FnOnce(&mut dyn CollisionResponder, &mut CollisionHandler),
    {
        let Some(mut responder) = self.bodies.get_mut(body).and_then(CollisionBody::take_responder) else {
            return;
        };
        callback(responder.as_mut(), self);
        if let Some(owner) = self.bodies.get_mut(body) {
            owner.restore_responder(responder);
        }
    }

    /// Visit every live candidate around `bounds` once, filtered by `mask`
    pub(super) fn visit_candidates<F>(&mut self, bounds: &Rect, mask: CollisionMask, exclude: Option<ColliderHandle>, mut visit: F)
    where
        F: FnMut(ColliderHandle, &Collider, &Shape),
    {
        let Self {
            colliders,
            spatial_hash,
            world_shapes,
            candidate_check,
            candidate_buckets,
            ..
        } = self;

        candidate_check.clear();
        spatial_hash.candidate_buckets(bounds, candidate_buckets);
        for index in candidate_buckets.iter() {
            for candidate in spatial_hash.bucket(*index) {
                if Some(*candidate) == exclude {
                    continue;
                }
                let (Some(other), Some(shape)) = (colliders.get(*candidate), world_shapes.get(*candidate)) else {
                    continue;
                };
                if !mask.has(other.layer) {
                    continue;
                }
                if !candidate_check.insert(*candidate) {
                    continue;
                }
                visit(*candidate, other, shape);
            }
        }
    }
}

impl std::fmt::Debug for CollisionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionHandler")
            .field("bounds", &self.spatial_hash.bounds())
            .field("bodies", &self.body_register.len())
            .field("colliders", &self.colliders.len())
            .field("overlaps", &self.old_register.len())
            .finish()
    }
}
