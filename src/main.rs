// Prospector runner
//
// Loads a scraper configuration from a JSON file, runs the extraction
// engine, and prints the canonical records as JSON on stdout. Progress
// events stream to stderr via the status broadcaster.

use anyhow::{Context, Result};
use prospector::{EngineSettings, ScrapeOrchestrator, ScraperConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Captures both `tracing` events and `log` records, filtered by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .context("Usage: prospector <scraper-config.json>")?;

    let raw = tokio::fs::read_to_string(&config_path)
        .await
        .with_context(|| format!("Failed to read {config_path}"))?;
    let config: ScraperConfig =
        serde_json::from_str(&raw).with_context(|| format!("Invalid scraper config in {config_path}"))?;

    let orchestrator = ScrapeOrchestrator::new(EngineSettings::from_env());

    // Mirror progress to stderr while the crawl runs
    let broadcaster = orchestrator.broadcaster();
    let mut subscription = broadcaster.subscribe(config.id());
    let progress_task = tokio::spawn(async move {
        while let Ok(event) = subscription.receiver.recv().await {
            eprintln!(
                "[{}] {:?}/{:?} page {} ({} items): {}",
                event.scraper_id,
                event.status,
                event.severity,
                event.current_page,
                event.total_items,
                event.message
            );
            if event.is_terminal() {
                break;
            }
        }
    });

    let records = orchestrator
        .execute(&config)
        .await
        .context("Scrape execution failed")?;
    let _ = progress_task.await;

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
