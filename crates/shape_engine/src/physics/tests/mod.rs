//! Multi-frame collision handler scenarios

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;

use crate::foundation::math::{Transform2D, Vec2};
use crate::geometry::Rect;
use crate::physics::{
    BodyHandle, Collider, ColliderHandle, ColliderShape, CollisionBody, CollisionHandler, CollisionInformation, CollisionLayer,
    CollisionMask, CollisionResponder,
};

const DT: f32 = 0.016;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Entered(BodyHandle),
    Left(BodyHandle),
    Hit {
        collider: ColliderHandle,
        others: Vec<(ColliderHandle, bool)>,
    },
    Ended(ColliderHandle, ColliderHandle),
}

type EventLog = Rc<RefCell<Vec<Event>>>;

/// Records every callback it receives
struct Recorder {
    log: EventLog,
}

impl Recorder {
    fn boxed(log: &EventLog) -> Box<dyn CollisionResponder> {
        Box::new(Self { log: Rc::clone(log) })
    }
}

impl CollisionResponder for Recorder {
    fn resolve_collision(&mut self, _handler: &mut CollisionHandler, info: &CollisionInformation) {
        self.log.borrow_mut().push(Event::Hit {
            collider: info.collider,
            others: info.collisions.iter().map(|c| (c.other, c.first_contact)).collect(),
        });
    }

    fn collision_ended(&mut self, _handler: &mut CollisionHandler, collider: ColliderHandle, other: ColliderHandle) {
        self.log.borrow_mut().push(Event::Ended(collider, other));
    }

    fn on_collision_system_entered(&mut self, _handler: &mut CollisionHandler, body: BodyHandle) {
        self.log.borrow_mut().push(Event::Entered(body));
    }

    fn on_collision_system_left(&mut self, _handler: &mut CollisionHandler, body: BodyHandle) {
        self.log.borrow_mut().push(Event::Left(body));
    }
}

/// Removes the body of everything it touches
struct Destroyer;

impl CollisionResponder for Destroyer {
    fn resolve_collision(&mut self, handler: &mut CollisionHandler, info: &CollisionInformation) {
        for body in handler.parents_of(info.all_colliders()) {
            let _ = handler.remove_body(body);
            assert!(handler.body(body).is_some(), "removal must be deferred");
        }
    }
}

fn handler() -> CollisionHandler {
    crate::foundation::logging::try_init();
    CollisionHandler::new(Rect::new(0.0, 0.0, 100.0, 100.0), 4, 4, 64).unwrap()
}

fn circle_at(x: f32, y: f32, radius: f32) -> Collider {
    Collider::new(ColliderShape::Circle { radius }).with_transform(Transform2D::from_position(Vec2::new(x, y)))
}

fn take(log: &EventLog) -> Vec<Event> {
    std::mem::take(&mut *log.borrow_mut())
}

fn hits(events: &[Event]) -> Vec<&Event> {
    events.iter().filter(|e| matches!(e, Event::Hit { .. })).collect()
}

#[test]
fn test_first_contact_reported_once_and_overlap_end_once() {
    let log = EventLog::default();
    let mut handler = handler();
    let body = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(20.0, 20.0))).with_responder(Recorder::boxed(&log)));
    let mover = handler.attach_collider(body, Collider::new(ColliderShape::Circle { radius: 5.0 })).unwrap();
    let wall = handler.add_collider(circle_at(25.0, 20.0, 5.0));

    handler.update(DT);
    assert_eq!(take(&log), vec![Event::Entered(body)]);

    let mut first_flags = Vec::new();
    for _ in 0..4 {
        handler.update(DT);
        let events = take(&log);
        assert_eq!(hits(&events).len(), 1);
        if let Event::Hit { collider, others } = &events[0] {
            assert_eq!(*collider, mover);
            assert_eq!(others.len(), 1);
            assert_eq!(others[0].0, wall);
            first_flags.push(others[0].1);
        }
    }
    assert_eq!(first_flags, vec![true, false, false, false]);
    assert!(handler.is_overlapping(mover, wall));
    assert_eq!(handler.overlaps().copied().collect::<Vec<_>>(), vec![(mover, wall)]);

    handler.set_collider_transform(wall, Transform2D::from_position(Vec2::new(80.0, 80.0))).unwrap();
    handler.update(DT);
    assert_eq!(take(&log), vec![Event::Ended(mover, wall)]);
    assert_eq!(handler.overlap_count(), 0);

    handler.update(DT);
    assert!(take(&log).is_empty());

    handler.set_collider_transform(wall, Transform2D::from_position(Vec2::new(22.0, 20.0))).unwrap();
    handler.update(DT);
    let events = take(&log);
    assert_eq!(
        events,
        vec![Event::Hit {
            collider: mover,
            others: vec![(wall, true)],
        }]
    );
}

#[test]
fn test_removal_from_callback_is_deferred_to_next_resolve() {
    let log = EventLog::default();
    let mut handler = handler();
    let hunter = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(50.0, 50.0))).with_responder(Box::new(Destroyer)));
    handler.attach_collider(hunter, Collider::new(ColliderShape::Circle { radius: 4.0 })).unwrap();
    let prey = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(55.0, 50.0))).with_responder(Recorder::boxed(&log)));
    let prey_collider = handler.attach_collider(prey, Collider::new(ColliderShape::Circle { radius: 4.0 })).unwrap();

    handler.update(DT);
    assert_eq!(handler.count(), 2);
    assert_eq!(take(&log), vec![Event::Entered(prey)]);

    // the hunter queues the removal while resolving
    handler.update(DT);
    assert_eq!(handler.count(), 2);
    assert!(handler.body(prey).is_some());
    assert_eq!(hits(&take(&log)).len(), 1);

    handler.update(DT);
    assert_eq!(handler.count(), 1);
    assert!(handler.body(prey).is_none());
    assert!(handler.collider(prey_collider).is_none());
    assert_eq!(take(&log), vec![Event::Left(prey)]);

    handler.update(DT);
    assert_eq!(handler.overlap_count(), 0);
}

#[test]
fn test_candidate_spanning_buckets_is_evaluated_once() {
    let log = EventLog::default();
    // 2x2 grid with 50 unit cells
    let mut handler = CollisionHandler::new(Rect::new(0.0, 0.0, 100.0, 100.0), 2, 2, 16).unwrap();
    let body = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(50.0, 50.0))).with_responder(Recorder::boxed(&log)));
    handler.attach_collider(body, Collider::new(ColliderShape::rect(Vec2::new(10.0, 10.0)))).unwrap();
    let plate = handler.add_collider(
        Collider::new(ColliderShape::rect(Vec2::new(30.0, 30.0))).with_transform(Transform2D::from_position(Vec2::new(50.0, 50.0))),
    );

    handler.update(DT);
    handler.update(DT);
    assert_eq!(handler.spatial_hash().registered_count(), 2);
    for index in 0..4 {
        assert_eq!(handler.spatial_hash().bucket(index).len(), 2);
    }

    let events = take(&log);
    let Some(Event::Hit { others, .. }) = events.iter().find(|e| matches!(e, Event::Hit { .. })) else {
        panic!("expected a hit");
    };
    assert_eq!(others, &vec![(plate, true)]);
}

#[test]
fn test_mask_filters_only_the_processing_side() {
    let log = EventLog::default();
    let mut handler = handler();
    let blind = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(30.0, 30.0))).with_responder(Recorder::boxed(&log)));
    handler
        .attach_collider(
            blind,
            Collider::new(ColliderShape::Circle { radius: 5.0 })
                .with_layer(CollisionLayer::PLAYER)
                .with_mask(CollisionMask::ENEMY),
        )
        .unwrap();
    let log_other = EventLog::default();
    let seer = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(33.0, 30.0))).with_responder(Recorder::boxed(&log_other)));
    handler
        .attach_collider(
            seer,
            Collider::new(ColliderShape::Circle { radius: 5.0 })
                .with_layer(CollisionLayer::ENVIRONMENT)
                .with_mask(CollisionMask::PLAYER),
        )
        .unwrap();

    handler.update(DT);
    handler.update(DT);
    assert!(hits(&take(&log)).is_empty());
    assert_eq!(hits(&take(&log_other)).len(), 1);
}

#[test]
fn test_same_body_colliders_never_collide() {
    let log = EventLog::default();
    let mut handler = handler();
    let body = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(40.0, 40.0))).with_responder(Recorder::boxed(&log)));
    handler.attach_collider(body, Collider::new(ColliderShape::Circle { radius: 5.0 })).unwrap();
    handler
        .attach_collider(
            body,
            Collider::new(ColliderShape::Circle { radius: 5.0 }).with_offset(Transform2D::from_position(Vec2::new(2.0, 0.0))),
        )
        .unwrap();

    handler.update(DT);
    handler.update(DT);
    assert!(hits(&take(&log)).is_empty());
}

#[test]
fn test_projection_catches_fast_bodies() {
    let run = |project: bool| {
        let log = EventLog::default();
        let mut handler = handler();
        let body = handler.add_body(
            CollisionBody::new(Transform2D::from_position(Vec2::new(10.0, 50.0)))
                .with_velocity(Vec2::new(1000.0, 0.0))
                .with_responder(Recorder::boxed(&log)),
        );
        handler
            .attach_collider(body, Collider::new(ColliderShape::Circle { radius: 2.0 }).with_projection(project))
            .unwrap();
        handler.add_collider(
            Collider::new(ColliderShape::rect(Vec2::new(2.0, 40.0))).with_transform(Transform2D::from_position(Vec2::new(40.0, 50.0))),
        );
        handler.update(0.05);
        handler.update(0.05);
        let events = take(&log);
        hits(&events).len()
    };
    assert_eq!(run(false), 0);
    assert_eq!(run(true), 1);
}

#[test]
fn test_contained_overlap_falls_back_to_closest_boundary_point() {
    let mut handler = handler();
    let seen: Rc<RefCell<Vec<CollisionInformation>>> = Rc::default();

    struct Keep(Rc<RefCell<Vec<CollisionInformation>>>);
    impl CollisionResponder for Keep {
        fn resolve_collision(&mut self, _handler: &mut CollisionHandler, info: &CollisionInformation) {
            self.0.borrow_mut().push(info.clone());
        }
    }

    let body = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(20.0, 50.0))).with_responder(Box::new(Keep(Rc::clone(&seen)))));
    handler
        .attach_collider(body, Collider::new(ColliderShape::Circle { radius: 1.0 }).with_intersections(true))
        .unwrap();
    handler.add_collider(circle_at(50.0, 50.0, 10.0));
    handler.update(DT);
    handler.update(DT);
    assert!(seen.borrow().is_empty());

    handler.set_body_transform(body, Transform2D::from_position(Vec2::new(50.0, 50.0))).unwrap();
    handler.update(DT);

    let infos = seen.borrow();
    assert_eq!(infos.len(), 1);
    let collision = &infos[0].collisions[0];
    assert!(collision.intersection.valid);
    assert_eq!(collision.intersection.points.len(), 1);
    assert_relative_eq!(collision.intersection.points[0].point, Vec2::new(40.0, 50.0), epsilon = 1e-4);
    assert!(infos[0].surface.valid);
}

#[test]
fn test_clear_reports_left_for_live_bodies() {
    let log = EventLog::default();
    let mut handler = handler();
    let body = handler.add_body(CollisionBody::new(Transform2D::identity()).with_responder(Recorder::boxed(&log)));
    handler.update(DT);
    take(&log);

    handler.clear();
    assert_eq!(take(&log), vec![Event::Left(body)]);
    assert_eq!(handler.count(), 0);
}

#[test]
fn test_queries_from_inside_callbacks() {
    struct Scout(Rc<RefCell<usize>>);
    impl CollisionResponder for Scout {
        fn resolve_collision(&mut self, handler: &mut CollisionHandler, info: &CollisionInformation) {
            *self.0.borrow_mut() = handler.cast_space_collider_count(info.collider);
        }
    }

    let found = Rc::new(RefCell::new(0));
    let mut handler = handler();
    let body = handler.add_body(CollisionBody::new(Transform2D::from_position(Vec2::new(60.0, 60.0))).with_responder(Box::new(Scout(Rc::clone(&found)))));
    handler.attach_collider(body, Collider::new(ColliderShape::Circle { radius: 6.0 })).unwrap();
    handler.add_collider(circle_at(64.0, 60.0, 3.0));
    handler.add_collider(circle_at(56.0, 60.0, 3.0));

    handler.update(DT);
    handler.update(DT);
    assert_eq!(*found.borrow(), 2);
}
