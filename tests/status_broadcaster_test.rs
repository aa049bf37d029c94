use std::time::Duration;

use prospector::scrape_events::{CrawlStatus, StatusBroadcaster, StatusEvent};
use tokio::time::timeout;

async fn recv(
    receiver: &mut tokio::sync::broadcast::Receiver<StatusEvent>,
) -> StatusEvent {
    match timeout(Duration::from_millis(200), receiver.recv()).await {
        Ok(Ok(event)) => event,
        Ok(Err(e)) => panic!("Failed to receive event: {e}"),
        Err(_) => panic!("Timeout waiting for event"),
    }
}

#[tokio::test]
async fn events_arrive_in_publish_order() {
    let bus = StatusBroadcaster::default();
    let mut subscription = bus.subscribe("job-1");

    bus.publish(StatusEvent::initializing("job-1", "init"));
    bus.publish(StatusEvent::running("job-1", 1, 0, "page 1"));
    bus.publish(StatusEvent::running("job-1", 2, 5, "page 2"));
    bus.publish(StatusEvent::completed("job-1", 2, 8, "done"));

    assert_eq!(recv(&mut subscription.receiver).await.status, CrawlStatus::Initializing);
    assert_eq!(recv(&mut subscription.receiver).await.current_page, 1);
    assert_eq!(recv(&mut subscription.receiver).await.current_page, 2);

    let last = recv(&mut subscription.receiver).await;
    assert!(last.is_terminal());
    assert_eq!(last.total_items, 8);
}

#[tokio::test]
async fn late_subscriber_sees_the_latest_buffered_event() {
    let bus = StatusBroadcaster::default();
    bus.publish(StatusEvent::initializing("job-2", "init"));
    bus.publish(StatusEvent::running("job-2", 3, 12, "page 3"));

    let subscription = bus.subscribe("job-2");
    let latest = subscription.latest.expect("latest event should be buffered");
    assert_eq!(latest.current_page, 3);
    assert_eq!(latest.total_items, 12);
}

#[tokio::test]
async fn multiple_subscribers_observe_the_same_crawl() {
    let bus = StatusBroadcaster::default();
    let mut first = bus.subscribe("job-3");
    let mut second = bus.subscribe("job-3");
    assert_eq!(bus.subscriber_count("job-3"), 2);

    let delivered = bus.publish(StatusEvent::running("job-3", 1, 2, "page 1"));
    assert_eq!(delivered, 2);

    assert_eq!(recv(&mut first.receiver).await.total_items, 2);
    assert_eq!(recv(&mut second.receiver).await.total_items, 2);
}

#[tokio::test]
async fn publish_without_subscribers_is_not_an_error() {
    let bus = StatusBroadcaster::default();
    assert_eq!(bus.publish(StatusEvent::running("job-4", 1, 0, "page 1")), 0);
    // The event is still buffered for a later subscriber
    assert!(bus.subscribe("job-4").latest.is_some());
}

#[tokio::test]
async fn streams_are_isolated_per_scraper_id() {
    let bus = StatusBroadcaster::default();
    let mut a = bus.subscribe("job-a");
    let _b = bus.subscribe("job-b");

    bus.publish(StatusEvent::running("job-a", 1, 1, "only for a"));

    let event = recv(&mut a.receiver).await;
    assert_eq!(event.scraper_id, "job-a");
    assert_eq!(bus.subscriber_count("job-b"), 1);
}

#[tokio::test]
async fn finish_drops_the_stream_but_live_receivers_drain() {
    let bus = StatusBroadcaster::default();
    let mut subscription = bus.subscribe("job-5");

    bus.publish(StatusEvent::running("job-5", 1, 1, "page 1"));
    bus.publish(StatusEvent::completed("job-5", 1, 1, "done"));
    bus.finish("job-5");

    // Already-subscribed receiver still drains the buffered events
    assert_eq!(recv(&mut subscription.receiver).await.current_page, 1);
    assert!(recv(&mut subscription.receiver).await.is_terminal());

    // A new subscriber starts from an empty stream
    assert!(bus.subscribe("job-5").latest.is_none());
}
