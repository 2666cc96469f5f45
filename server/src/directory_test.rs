use events::{DeleteIntent, MoveIntent};

use super::*;

fn delete(id: &str) -> ServerEvent {
    ServerEvent::Delete(DeleteIntent { id: id.into() })
}

#[test]
fn broadcast_skips_excluded_session() {
    let mut directory = Directory::new();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let (tx_a, mut rx_a) = mpsc::channel(4);
    let (tx_b, mut rx_b) = mpsc::channel(4);
    directory.join(a, tx_a);
    directory.join(b, tx_b);

    directory.broadcast(&delete("img-1"), Some(a));

    assert!(rx_a.try_recv().is_err());
    assert_eq!(rx_b.try_recv().unwrap(), delete("img-1"));
}

#[test]
fn ids_follow_join_order_and_leave_removes() {
    let mut directory = Directory::new();
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let mut receivers = Vec::new();
    for id in &ids {
        let (tx, rx) = mpsc::channel(1);
        receivers.push(rx);
        directory.join(*id, tx);
    }

    assert!(directory.leave(ids[1]));
    assert!(!directory.leave(ids[1]));

    assert_eq!(directory.ids(), vec![ids[0].to_string(), ids[2].to_string()]);
}

#[test]
fn lagging_session_is_evicted_on_lifecycle_event() {
    let mut directory = Directory::new();
    let (slow, fast) = (Uuid::new_v4(), Uuid::new_v4());
    let (tx_slow, mut rx_slow) = mpsc::channel(1);
    let (tx_fast, mut rx_fast) = mpsc::channel(4);
    directory.join(slow, tx_slow);
    directory.join(fast, tx_fast);

    assert!(directory.broadcast(&delete("a"), None).is_empty());
    assert_eq!(directory.broadcast(&delete("b"), None), vec![slow]);

    assert_eq!(directory.ids(), vec![fast.to_string()]);
    assert_eq!(rx_slow.try_recv().unwrap(), delete("a"));
    assert!(matches!(rx_slow.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
    assert_eq!(rx_fast.try_recv().unwrap(), delete("a"));
    assert_eq!(rx_fast.try_recv().unwrap(), delete("b"));
}

#[test]
fn full_queue_drops_positional_update_without_eviction() {
    let mut directory = Directory::new();
    let slow = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(1);
    directory.join(slow, tx);
    let first = ServerEvent::Move(MoveIntent { id: "a".into(), x: 1.0, y: 1.0 });
    let second = ServerEvent::Move(MoveIntent { id: "a".into(), x: 2.0, y: 2.0 });

    assert!(directory.broadcast(&first, None).is_empty());
    assert!(directory.broadcast(&second, None).is_empty());

    assert_eq!(directory.len(), 1);
    assert_eq!(rx.try_recv().unwrap(), first);
    assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty)));
}

#[test]
fn closed_receiver_is_evicted() {
    let mut directory = Directory::new();
    let gone = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(4);
    directory.join(gone, tx);
    drop(rx);

    assert!(!directory.send_to(gone, delete("a")));
    assert!(directory.is_empty());
}

#[test]
fn send_to_unknown_session_reports_failure() {
    let mut directory = Directory::new();
    assert!(!directory.send_to(Uuid::new_v4(), delete("a")));
}
