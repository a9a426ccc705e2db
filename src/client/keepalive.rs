//! Keep-alive pinger.
//!
//! Periodically GETs a URL on the translation server so a hosted instance
//! that sleeps when idle stays warm. Each result is logged with its latency.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use super::ApiClient;
use crate::config::schema::KeepaliveConfig;

/// Resolve the URL to ping: `[keepalive] url`, or `<base_url>/api/models`.
pub fn target_url(config: &KeepaliveConfig, client: &ApiClient) -> String {
    if config.url.trim().is_empty() {
        format!("{}/api/models", client.base_url())
    } else {
        config.url.trim().to_string()
    }
}

/// Ping `url` once and log the outcome. Returns whether the server answered
/// with 200.
pub fn ping_once(client: &ApiClient, url: &str) -> bool {
    match client.ping(url) {
        Ok(outcome) if outcome.is_ok() => {
            log::info!(
                "server online: {url} ({:.2}s)",
                outcome.latency.as_secs_f64()
            );
            true
        }
        Ok(outcome) => {
            log::warn!("server answered {} for {url}", outcome.status);
            false
        }
        Err(e) => {
            log::error!("could not reach {url}: {e}");
            false
        }
    }
}

/// Ping `url` every `interval` until `stop` receives a message or its
/// sender is dropped. Returns the number of successful pings.
pub fn run(client: &ApiClient, url: &str, interval: Duration, stop: &Receiver<()>) -> usize {
    log::info!("keep-alive started for {url}");
    let mut successes = 0;
    loop {
        if ping_once(client, url) {
            successes += 1;
        }
        log::info!("next ping in {}s", interval.as_secs());
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log::info!("keep-alive stopped");
    successes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_models_endpoint() {
        let client = ApiClient::new("http://pi.local:5000/", Duration::from_secs(1));
        let config = KeepaliveConfig::default();
        assert_eq!(target_url(&config, &client), "http://pi.local:5000/api/models");
    }

    #[test]
    fn configured_target_wins() {
        let client = ApiClient::new("http://pi.local:5000", Duration::from_secs(1));
        let config = KeepaliveConfig {
            url: "https://translator.example/api/status".to_string(),
            interval_secs: 25,
        };
        assert_eq!(
            target_url(&config, &client),
            "https://translator.example/api/status"
        );
    }

    #[test]
    fn run_stops_when_sender_dropped() {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200));
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        drop(tx);
        let successes = run(&client, "http://127.0.0.1:9/api/models", Duration::from_secs(60), &rx);
        assert_eq!(successes, 0);
    }
}
