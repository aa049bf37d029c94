//! Engine tunables sourced from the environment
//!
//! Deployment knobs the engine consumes as configuration rather than
//! hard-coded values: retry budget, backoff bounds, session concurrency,
//! page ceiling, and timeouts. Each has a default suitable for respectful
//! crawling and an environment variable override.

use std::time::Duration;

use log::warn;

/// Runtime tunables for the extraction engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Total navigation attempts per page, first try included
    pub max_retry_attempts: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,
    /// Cap applied to the computed backoff delay
    pub retry_max_delay: Duration,
    /// Maximum concurrently open crawl sessions
    pub max_sessions: usize,
    /// Hard ceiling on pages visited per crawl
    pub max_pages: u32,
    /// Timeout for a single page navigation
    pub navigation_timeout: Duration,
    /// Timeout for the browser launch handshake
    pub launch_timeout: Duration,
    /// Minimum spacing between outbound navigation attempts
    pub min_request_spacing: Duration,
    /// Run the browser engine headless
    pub headless: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(10),
            max_sessions: 2,
            max_pages: 50,
            navigation_timeout: Duration::from_secs(30),
            launch_timeout: Duration::from_secs(20),
            min_request_spacing: Duration::from_millis(1000),
            headless: true,
        }
    }
}

impl EngineSettings {
    /// Build settings from the process environment, falling back to defaults.
    ///
    /// Unparsable values are ignored with a warning rather than failing the
    /// process; a bad deployment knob should not take the engine down.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retry_attempts: env_parse("PROSPECTOR_MAX_RETRIES", defaults.max_retry_attempts),
            retry_base_delay: Duration::from_millis(env_parse(
                "PROSPECTOR_RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay.as_millis() as u64,
            )),
            retry_max_delay: Duration::from_millis(env_parse(
                "PROSPECTOR_RETRY_MAX_DELAY_MS",
                defaults.retry_max_delay.as_millis() as u64,
            )),
            max_sessions: env_parse("PROSPECTOR_MAX_SESSIONS", defaults.max_sessions).max(1),
            max_pages: env_parse("PROSPECTOR_MAX_PAGES", defaults.max_pages).max(1),
            navigation_timeout: Duration::from_secs(env_parse(
                "PROSPECTOR_NAVIGATION_TIMEOUT_SECS",
                defaults.navigation_timeout.as_secs(),
            )),
            launch_timeout: Duration::from_secs(env_parse(
                "PROSPECTOR_LAUNCH_TIMEOUT_SECS",
                defaults.launch_timeout.as_secs(),
            )),
            min_request_spacing: Duration::from_millis(env_parse(
                "PROSPECTOR_MIN_REQUEST_SPACING_MS",
                defaults.min_request_spacing.as_millis() as u64,
            )),
            headless: env_parse("PROSPECTOR_HEADLESS", defaults.headless),
        }
    }
}

/// Parse an environment variable, returning the default when unset or invalid
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring unparsable {name}={raw}");
                default
            }
        },
        Err(_) => default,
    }
}
