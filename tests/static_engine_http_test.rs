//! Static engine over a real HTTP server
//!
//! End-to-end pass through navigate → extract → paginate against served
//! markup, including the pagination hop and the transient-error taxonomy.

use std::time::Duration;

use prospector::config::{EngineSettings, ScraperConfig};
use prospector::scrape_engine::{
    CrawlContext, CrawlEngine, NavigationThrottle, RetryPolicy, ScrapeError, StaticEngine,
    run_crawl,
};
use prospector::scrape_events::StatusBroadcaster;

const PAGE_ONE: &str = r#"
<html><body>
  <div class="card">
    <h3>Acme Corp</h3>
    <a class="mail" href="mailto:contact@acme.fr">Email</a>
  </div>
  <div class="card">
    <h3>Globex SARL</h3>
    <p>Tel: 01 22 33 44 55</p>
  </div>
  <a rel="next" href="/annuaire/page2">Suivant</a>
</body></html>
"#;

const PAGE_TWO: &str = r#"
<html><body>
  <div class="card">
    <h3>Initech SAS</h3>
  </div>
</body></html>
"#;

fn fast_settings() -> EngineSettings {
    EngineSettings {
        navigation_timeout: Duration::from_secs(5),
        ..EngineSettings::default()
    }
}

#[tokio::test]
async fn crawls_served_pages_through_pagination() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/annuaire")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(PAGE_ONE)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/annuaire/page2")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(PAGE_TWO)
        .create_async()
        .await;

    let config = ScraperConfig::builder()
        .source_url(format!("{}/annuaire", server.url()))
        .container(".card")
        .id("annuaire-http")
        .field("email", "a.mail")
        .next_page("a[rel=next]")
        .build();

    let mut engine = StaticEngine::new(&fast_settings()).unwrap();
    let throttle = NavigationThrottle::new(Duration::from_millis(1));
    let policy = RetryPolicy::default();
    let broadcaster = StatusBroadcaster::default();
    let ctx = CrawlContext {
        config: &config,
        throttle: &throttle,
        policy: &policy,
        broadcaster: &broadcaster,
        max_pages: 10,
    };

    let run = run_crawl(&mut engine, &ctx).await.unwrap();
    engine.close().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;

    assert_eq!(run.pages_visited, 2);
    assert_eq!(run.records.len(), 3);
    assert_eq!(run.records[0].metadata["email"], "contact@acme.fr");
    assert!(run.records[1].text.contains("Globex SARL"));
}

#[tokio::test]
async fn http_500_is_not_a_transient_network_error() {
    let mut server = mockito::Server::new_async().await;
    let _broken = server
        .mock("GET", "/broken")
        .with_status(500)
        .create_async()
        .await;

    let mut engine = StaticEngine::new(&fast_settings()).unwrap();
    let err = engine
        .navigate(&format!("{}/broken", server.url()))
        .await
        .unwrap_err();

    // Server-side failures are not on the retry allow-list
    assert!(err.network_kind().is_none(), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_maps_to_the_network_taxonomy() {
    // Nothing listens on this port; the connect attempt fails immediately
    let mut engine = StaticEngine::new(&fast_settings()).unwrap();
    let err = engine.navigate("http://127.0.0.1:9/").await.unwrap_err();

    assert!(
        err.network_kind().is_some(),
        "refused connection should classify as transient network error, got {err:?}"
    );
    assert!(matches!(err, ScrapeError::Network { .. }));
}
