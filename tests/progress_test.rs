//! Progress broadcaster: subscription lifecycle and fan-out.

use std::time::Duration;

use essaygen::event::ProgressEvent;
use essaygen::progress::{Broadcaster, ProgressSink};
use futures_util::StreamExt;

fn progress(current: usize) -> ProgressEvent {
    ProgressEvent::Progress {
        current,
        total: 3,
        topic: format!("topic {current}"),
    }
}

#[tokio::test]
async fn connected_is_always_first() {
    let broadcaster = Broadcaster::new();
    let mut sub = broadcaster.subscribe();
    broadcaster.broadcast(&progress(1));

    assert_eq!(sub.recv().await, Some(ProgressEvent::Connected));
    assert_eq!(sub.recv().await, Some(progress(1)));
}

#[tokio::test]
async fn every_subscriber_receives_every_event() {
    let broadcaster = Broadcaster::new();
    let mut subs: Vec<_> = (0..3).map(|_| broadcaster.subscribe()).collect();

    assert_eq!(broadcaster.broadcast(&progress(1)), 3);
    broadcaster.emit(progress(2));

    for sub in &mut subs {
        assert_eq!(sub.try_recv(), Some(ProgressEvent::Connected));
        assert_eq!(sub.try_recv(), Some(progress(1)));
        assert_eq!(sub.try_recv(), Some(progress(2)));
        assert_eq!(sub.try_recv(), None);
    }
}

#[tokio::test]
async fn late_subscriber_gets_no_history() {
    let broadcaster = Broadcaster::new();
    let _early = broadcaster.subscribe();
    broadcaster.broadcast(&progress(1));

    let mut late = broadcaster.subscribe();
    broadcaster.broadcast(&progress(2));

    assert_eq!(late.try_recv(), Some(ProgressEvent::Connected));
    assert_eq!(late.try_recv(), Some(progress(2)));
    assert_eq!(late.try_recv(), None);
}

#[tokio::test]
async fn broadcast_with_no_subscribers_is_a_no_op() {
    let broadcaster = Broadcaster::new();
    assert_eq!(broadcaster.broadcast(&progress(1)), 0);
}

#[tokio::test]
async fn dropping_a_subscription_unsubscribes() {
    let broadcaster = Broadcaster::new();
    let keep = broadcaster.subscribe();
    let gone = broadcaster.subscribe();
    assert_eq!(broadcaster.subscriber_count(), 2);

    drop(gone);
    assert_eq!(broadcaster.subscriber_count(), 1);
    assert_eq!(broadcaster.broadcast(&progress(1)), 1);
    drop(keep);
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[tokio::test]
async fn explicit_unsubscribe_is_idempotent() {
    let broadcaster = Broadcaster::new();
    let mut sub = broadcaster.subscribe();
    let id = sub.id();

    assert!(broadcaster.unsubscribe(id));
    assert!(!broadcaster.unsubscribe(id));
    assert_eq!(broadcaster.subscriber_count(), 0);

    // The queued connected event is still readable, then the stream ends.
    assert_eq!(sub.recv().await, Some(ProgressEvent::Connected));
    assert_eq!(sub.recv().await, None);
}

#[tokio::test]
async fn subscription_is_a_stream() {
    let broadcaster = Broadcaster::new();
    let sub = broadcaster.subscribe();

    let reader = tokio::spawn(async move { sub.take(3).collect::<Vec<_>>().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    broadcaster.broadcast(&progress(1));
    broadcaster.broadcast(&progress(2));

    let events = tokio::time::timeout(Duration::from_secs(1), reader)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(events, vec![ProgressEvent::Connected, progress(1), progress(2)]);
}

#[tokio::test]
async fn subscriber_ids_are_distinct() {
    let broadcaster = Broadcaster::new();
    let a = broadcaster.subscribe();
    let b = broadcaster.subscribe();
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn stalled_subscriber_is_dropped() {
    let broadcaster = Broadcaster::with_capacity(4);
    let mut stalled = broadcaster.subscribe();
    let mut reading = broadcaster.subscribe();

    // `connected` plus three events fills the stalled queue.
    for current in 1..=3 {
        assert_eq!(broadcaster.broadcast(&progress(current)), 2);
        reading.try_recv();
    }
    reading.try_recv();

    assert_eq!(broadcaster.broadcast(&progress(4)), 1);
    assert_eq!(broadcaster.subscriber_count(), 1);
    assert_eq!(reading.try_recv(), Some(progress(4)));

    // What was queued before the drop is still readable, then the stream ends.
    assert_eq!(stalled.recv().await, Some(ProgressEvent::Connected));
    for current in 1..=3 {
        assert_eq!(stalled.recv().await, Some(progress(current)));
    }
    assert_eq!(stalled.recv().await, None);
}
