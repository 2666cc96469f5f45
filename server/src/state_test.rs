use events::{DeleteIntent, ElementKind, MoveIntent, SpawnIntent};
use tokio::time::{Duration, timeout};

use super::test_helpers::{join_client, test_app_state, test_app_state_with_capacity};
use crate::config::MIN_CLIENT_CHANNEL_CAPACITY;
use super::*;

async fn recv_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("event receive timed out")
        .expect("event channel closed unexpectedly")
}

async fn assert_no_event(rx: &mut mpsc::Receiver<ServerEvent>) {
    assert!(timeout(Duration::from_millis(80), rx.recv()).await.is_err(), "expected no event");
}

/// Skip the `hello` / `init` / `users` handshake.
async fn drain_handshake(rx: &mut mpsc::Receiver<ServerEvent>) {
    while timeout(Duration::from_millis(50), rx.recv()).await.is_ok() {}
}

#[tokio::test]
async fn connect_sends_hello_then_init_then_users() {
    let state = test_app_state();
    let (client_id, mut rx) = join_client(&state).await;

    assert_eq!(
        recv_event(&mut rx).await,
        ServerEvent::Hello(Hello { client_id: client_id.to_string() })
    );
    assert_eq!(recv_event(&mut rx).await, ServerEvent::Init(Vec::new()));
    assert_eq!(recv_event(&mut rx).await, ServerEvent::Users(vec![client_id.to_string()]));
}

#[tokio::test]
async fn intents_reach_peers_but_not_origin() {
    let state = test_app_state();
    let (a, mut rx_a) = join_client(&state).await;
    let (_b, mut rx_b) = join_client(&state).await;
    drain_handshake(&mut rx_a).await;
    drain_handshake(&mut rx_b).await;

    let spawn =
        ClientEvent::Spawn(SpawnIntent::new("img-1", ElementKind::Image).with_source("x.jpg"));
    state.stage.lock().await.handle_intent(a, spawn);

    let ServerEvent::Spawn(record) = recv_event(&mut rx_b).await else {
        panic!("expected spawn");
    };
    assert_eq!(record.id, "img-1");
    assert_no_event(&mut rx_a).await;
}

#[tokio::test]
async fn dropped_intents_are_not_broadcast() {
    let state = test_app_state();
    let (a, mut rx_a) = join_client(&state).await;
    let (_b, mut rx_b) = join_client(&state).await;
    drain_handshake(&mut rx_a).await;
    drain_handshake(&mut rx_b).await;

    let ghost_move = ClientEvent::Move(MoveIntent { id: "ghost".into(), x: 1.0, y: 2.0 });
    state.stage.lock().await.handle_intent(a, ghost_move);

    assert_no_event(&mut rx_b).await;
}

#[tokio::test]
async fn late_joiner_gets_current_snapshot() {
    let state = test_app_state();
    let (a, _rx_a) = join_client(&state).await;
    {
        let mut stage = state.stage.lock().await;
        stage.handle_intent(a, ClientEvent::Spawn(SpawnIntent::new("img-1", ElementKind::Image)));
        let to = MoveIntent { id: "img-1".into(), x: 50.0, y: 80.0 };
        stage.handle_intent(a, ClientEvent::Move(to));
    }

    let (_c, mut rx_c) = join_client(&state).await;
    recv_event(&mut rx_c).await;
    let ServerEvent::Init(records) = recv_event(&mut rx_c).await else {
        panic!("expected init");
    };

    assert_eq!(records.len(), 1);
    assert!((records[0].x - 50.0).abs() < f64::EPSILON);
    assert!((records[0].y - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn disconnect_announces_departure_and_keeps_elements() {
    let state = test_app_state();
    let (a, _rx_a) = join_client(&state).await;
    let (_b, mut rx_b) = join_client(&state).await;
    drain_handshake(&mut rx_b).await;
    state
        .stage
        .lock()
        .await
        .handle_intent(a, ClientEvent::Spawn(SpawnIntent::new("txt-1", ElementKind::Text)));
    recv_event(&mut rx_b).await;

    state.stage.lock().await.disconnect(a);

    assert_eq!(recv_event(&mut rx_b).await, ServerEvent::UserLeft(a.to_string()));
    let stage = state.stage.lock().await;
    assert_eq!(stage.registry.len(), 1);
    assert_eq!(stage.directory.len(), 1);
}

#[tokio::test]
async fn minimum_capacity_join_receives_full_handshake() {
    let state = test_app_state_with_capacity(MIN_CLIENT_CHANNEL_CAPACITY);
    let (client_id, mut rx) = join_client(&state).await;

    assert!(matches!(recv_event(&mut rx).await, ServerEvent::Hello(_)));
    assert_eq!(recv_event(&mut rx).await, ServerEvent::Init(Vec::new()));
    assert_eq!(recv_event(&mut rx).await, ServerEvent::Users(vec![client_id.to_string()]));
}

#[tokio::test]
async fn join_is_refused_when_init_does_not_fit() {
    let state = test_app_state();
    let (a, mut rx_a) = join_client(&state).await;
    drain_handshake(&mut rx_a).await;

    let b = Uuid::new_v4();
    let (tx_b, mut rx_b) = mpsc::channel(1);
    let joined = state.stage.lock().await.connect(b, tx_b);

    assert!(!joined);
    assert_eq!(state.stage.lock().await.directory.ids(), vec![a.to_string()]);
    assert!(matches!(recv_event(&mut rx_b).await, ServerEvent::Hello(_)));
    assert!(rx_b.recv().await.is_none());
    assert_no_event(&mut rx_a).await;
}

#[tokio::test]
async fn lagging_peer_is_evicted_instead_of_missing_a_delete() {
    let state = test_app_state_with_capacity(8);
    let (a, mut rx_a) = join_client(&state).await;
    let (b, mut rx_b) = join_client(&state).await;
    drain_handshake(&mut rx_a).await;
    {
        let mut stage = state.stage.lock().await;
        stage.handle_intent(a, ClientEvent::Spawn(SpawnIntent::new("img-1", ElementKind::Image)));
        for step in 0..20 {
            let x = f64::from(step);
            stage.handle_intent(a, ClientEvent::Move(MoveIntent { id: "img-1".into(), x, y: x }));
        }
        stage.handle_intent(a, ClientEvent::Delete(DeleteIntent { id: "img-1".into() }));
    }

    let mut seen = Vec::new();
    while let Some(event) = timeout(Duration::from_millis(500), rx_b.recv())
        .await
        .expect("event receive timed out")
    {
        seen.push(event);
    }
    let delivered_delete = seen.contains(&ServerEvent::Delete(DeleteIntent { id: "img-1".into() }));
    let stage = state.stage.lock().await;
    assert!(stage.registry.is_empty());
    assert!(!delivered_delete);
    assert_eq!(stage.directory.ids(), vec![a.to_string()]);
    drop(stage);
    assert_eq!(recv_event(&mut rx_a).await, ServerEvent::UserLeft(b.to_string()));
}

#[tokio::test]
async fn disconnect_after_eviction_does_not_announce_twice() {
    let state = test_app_state_with_capacity(MIN_CLIENT_CHANNEL_CAPACITY);
    let (a, mut rx_a) = join_client(&state).await;
    drain_handshake(&mut rx_a).await;
    let (b, _rx_b) = join_client(&state).await;
    recv_event(&mut rx_a).await;

    state
        .stage
        .lock()
        .await
        .handle_intent(a, ClientEvent::Spawn(SpawnIntent::new("txt-1", ElementKind::Text)));
    assert_eq!(recv_event(&mut rx_a).await, ServerEvent::UserLeft(b.to_string()));

    state.stage.lock().await.disconnect(b);
    assert_no_event(&mut rx_a).await;
}
