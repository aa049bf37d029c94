use std::time::{Duration, Instant};

use prospector::scrape_engine::{
    NavigationThrottle, NetworkErrorKind, RetryPolicy, ScrapeError, run_with_retry,
};

fn fast_throttle() -> NavigationThrottle {
    NavigationThrottle::new(Duration::from_millis(1))
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(2),
        max_delay: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn retryable_error_exhausts_all_attempts() {
    let throttle = fast_throttle();
    let policy = fast_policy(4);
    let mut calls = 0u32;

    let result: Result<(), _> = run_with_retry(&throttle, &policy, async || {
        calls += 1;
        Err(ScrapeError::network(
            NetworkErrorKind::ConnectionReset,
            "reset by peer",
        ))
    })
    .await;

    assert_eq!(calls, 4, "operation must run exactly max_attempts times");
    let err = result.unwrap_err();
    assert_eq!(err.network_kind(), Some(NetworkErrorKind::ConnectionReset));
}

#[tokio::test]
async fn non_retryable_error_runs_once() {
    let throttle = fast_throttle();
    let policy = fast_policy(5);
    let mut calls = 0u32;

    let result: Result<(), _> = run_with_retry(&throttle, &policy, async || {
        calls += 1;
        Err(ScrapeError::Extraction("selector mismatch".into()))
    })
    .await;

    assert_eq!(calls, 1, "fatal errors must not be retried");
    assert!(matches!(result.unwrap_err(), ScrapeError::Extraction(_)));
}

#[tokio::test]
async fn recovers_when_a_later_attempt_succeeds() {
    let throttle = fast_throttle();
    let policy = fast_policy(5);
    let mut calls = 0u32;

    let result = run_with_retry(&throttle, &policy, async || {
        calls += 1;
        if calls < 3 {
            Err(ScrapeError::network(NetworkErrorKind::Timeout, "slow"))
        } else {
            Ok(calls)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn zero_attempt_policy_still_runs_once() {
    let throttle = fast_throttle();
    let policy = fast_policy(0);
    let mut calls = 0u32;

    let result: Result<(), _> = run_with_retry(&throttle, &policy, async || {
        calls += 1;
        Err(ScrapeError::network(NetworkErrorKind::Timeout, "slow"))
    })
    .await;

    assert_eq!(calls, 1);
    assert!(result.is_err());
}

#[tokio::test]
async fn throttle_runs_before_the_first_attempt() {
    let throttle = NavigationThrottle::new(Duration::from_millis(50));
    let policy = fast_policy(1);

    // Seed the throttle so the next attempt has to wait out the spacing
    throttle.throttle().await;
    let start = Instant::now();

    let attempt_delay = run_with_retry(&throttle, &policy, async || Ok(start.elapsed()))
        .await
        .unwrap();

    assert!(
        attempt_delay >= Duration::from_millis(45),
        "first attempt ran after {attempt_delay:?}, before the spacing elapsed"
    );
}
