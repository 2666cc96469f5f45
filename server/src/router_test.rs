use events::{DEFAULT_HEIGHT, DEFAULT_WIDTH, ElementKind, Filters};

use super::*;

fn spawn_image(id: &str) -> ClientEvent {
    ClientEvent::Spawn(SpawnIntent::new(id, ElementKind::Image).with_source("x.jpg"))
}

fn move_to(id: &str, x: f64, y: f64) -> ClientEvent {
    ClientEvent::Move(MoveIntent { id: id.into(), x, y })
}

fn blur(amount: f64) -> Filters {
    Filters::from([("blur".to_owned(), amount)])
}

#[test]
fn spawn_fills_defaults_and_stamps_owner() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();

    let decision = route(&mut registry, origin, spawn_image("img-1"));

    let BroadcastDecision::Relay(ServerEvent::Spawn(record)) = decision else {
        panic!("expected spawn relay, got {decision:?}");
    };
    assert_eq!(record.id, "img-1");
    assert_eq!(record.source.as_deref(), Some("x.jpg"));
    assert!((record.width - DEFAULT_WIDTH).abs() < f64::EPSILON);
    assert!((record.height - DEFAULT_HEIGHT).abs() < f64::EPSILON);
    assert!(record.filters.is_empty());
    assert_eq!(record.owner_session, Some(origin.to_string()));
    assert_eq!(registry.get("img-1"), Some(&record));
}

#[test]
fn duplicate_spawn_is_dropped() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();
    route(&mut registry, origin, spawn_image("img-1"));

    let decision = route(&mut registry, origin, spawn_image("img-1"));

    assert_eq!(decision, BroadcastDecision::Drop(DropReason::Duplicate));
    assert_eq!(registry.len(), 1);
}

#[test]
fn move_is_relayed_verbatim() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();
    route(&mut registry, origin, spawn_image("img-1"));

    let decision = route(&mut registry, origin, move_to("img-1", 50.0, 80.0));

    assert_eq!(
        decision,
        BroadcastDecision::Relay(ServerEvent::Move(MoveIntent {
            id: "img-1".into(),
            x: 50.0,
            y: 80.0
        }))
    );
}

#[test]
fn resize_updates_registry() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();
    route(&mut registry, origin, spawn_image("img-1"));

    let intent = ResizeIntent { id: "img-1".into(), width: 100.0, height: 50.0 };
    let decision = route(&mut registry, origin, ClientEvent::Resize(intent.clone()));

    assert_eq!(decision, BroadcastDecision::Relay(ServerEvent::Resize(intent)));
    assert!((registry.get("img-1").unwrap().width - 100.0).abs() < f64::EPSILON);
}

#[test]
fn filter_sender_is_overwritten_with_origin() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();
    route(&mut registry, origin, spawn_image("img-1"));

    let intent = FilterIntent {
        id: "img-1".into(),
        filters: blur(4.0),
        sender_id: "someone-else".into(),
    };
    let decision = route(&mut registry, origin, ClientEvent::Filter(intent));

    let BroadcastDecision::Relay(ServerEvent::Filter(relayed)) = decision else {
        panic!("expected filter relay, got {decision:?}");
    };
    assert_eq!(relayed.sender_id, origin.to_string());
    assert_eq!(registry.get("img-1").unwrap().filters, blur(4.0));
}

#[test]
fn dangling_references_are_dropped() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();

    let intents = [
        move_to("ghost", 1.0, 1.0),
        ClientEvent::Resize(ResizeIntent { id: "ghost".into(), width: 1.0, height: 1.0 }),
        ClientEvent::Filter(FilterIntent {
            id: "ghost".into(),
            filters: blur(1.0),
            sender_id: String::new(),
        }),
        ClientEvent::Delete(DeleteIntent { id: "ghost".into() }),
    ];
    for intent in intents {
        assert_eq!(
            route(&mut registry, origin, intent),
            BroadcastDecision::Drop(DropReason::Dangling)
        );
    }
    assert!(registry.is_empty());
}

#[test]
fn delete_then_move_does_not_resurrect() {
    let mut registry = Registry::new();
    let origin = Uuid::new_v4();
    route(&mut registry, origin, spawn_image("img-1"));

    let delete = ClientEvent::Delete(DeleteIntent { id: "img-1".into() });
    let deleted = route(&mut registry, origin, delete);
    let moved = route(&mut registry, origin, move_to("img-1", 5.0, 5.0));

    assert!(matches!(deleted, BroadcastDecision::Relay(ServerEvent::Delete(_))));
    assert_eq!(moved, BroadcastDecision::Drop(DropReason::Dangling));
    assert!(registry.get("img-1").is_none());
}
