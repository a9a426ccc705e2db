//! Periodic sampling timers.
//!
//! A [`Sampler`] drives a shared [`MetricsCollector`] from three background
//! threads: the server poll, the client probe, and the inactivity sweep.
//! Each thread waits on its own stop channel with a timeout, so stopping is
//! prompt and dropping the sampler stops it too.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::collector::MetricsCollector;
use super::now_ms;
use super::probe::ClientProbe;
use crate::client::ApiClient;
use crate::config::schema::CollectorConfig;

pub type SharedCollector = Arc<Mutex<MetricsCollector>>;

/// Lock the collector, recovering the data if a holder panicked.
pub fn lock(collector: &SharedCollector) -> MutexGuard<'_, MetricsCollector> {
    collector.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Timer {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Running timers for one collection period.
pub struct Sampler {
    collector: SharedCollector,
    timers: Vec<Timer>,
}

/// Call `tick` every `interval` until a stop signal arrives or the sender is
/// dropped.
fn spawn_timer(
    name: &str,
    interval: Duration,
    mut tick: impl FnMut() + Send + 'static,
) -> std::io::Result<Timer> {
    let (stop, rx): (Sender<()>, Receiver<()>) = mpsc::channel();
    let handle = thread::Builder::new()
        .name(format!("transctl-{name}"))
        .spawn(move || {
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;
    Ok(Timer { stop, handle })
}

impl Sampler {
    /// Put the collector into Collecting and start the timers. The first
    /// server and client samples are taken immediately.
    pub fn start(
        collector: SharedCollector,
        client: ApiClient,
        probe: Option<Box<dyn ClientProbe>>,
        config: &CollectorConfig,
    ) -> std::io::Result<Self> {
        if !lock(&collector).start_collection(now_ms()) {
            log::debug!("collector already collecting");
        }
        log::info!("metrics collection started");

        let mut timers = Vec::new();

        {
            let collector = collector.clone();
            let poll = move || {
                // Fetch outside the lock so readers are never blocked on HTTP.
                let reply = client.system_metrics();
                let now = now_ms();
                let mut guard = lock(&collector);
                match reply {
                    Ok(reply) => guard.record_system_metrics(&reply, now),
                    Err(e) => guard.record_system_error(e.to_string(), now),
                }
            };
            poll();
            timers.push(spawn_timer(
                "system",
                Duration::from_millis(config.system_interval_ms),
                poll,
            )?);
        }

        if let Some(mut probe) = probe {
            let collector = collector.clone();
            lock(&collector).collect_client_metrics(probe.as_mut(), now_ms());
            timers.push(spawn_timer(
                "client",
                Duration::from_millis(config.client_interval_ms),
                move || lock(&collector).collect_client_metrics(probe.as_mut(), now_ms()),
            )?);
        }

        {
            let collector = collector.clone();
            timers.push(spawn_timer(
                "sweep",
                Duration::from_millis(config.inactivity_sweep_ms),
                move || {
                    if lock(&collector).sweep_inactivity(now_ms()) {
                        log::debug!("interaction session closed after inactivity");
                    }
                },
            )?);
        }

        Ok(Self { collector, timers })
    }

    pub fn collector(&self) -> &SharedCollector {
        &self.collector
    }

    /// Stop and join every timer, then move the collector to Idle.
    pub fn stop(self) {
        for timer in self.timers {
            let _ = timer.stop.send(());
            if timer.handle.join().is_err() {
                log::error!("sampling thread panicked");
            }
        }
        lock(&self.collector).stop_collection(now_ms());
        log::info!("metrics collection stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::metrics::CollectionState;
    use crate::metrics::probe::{HeapReading, ProbeReading};

    struct CountingProbe;

    impl ClientProbe for CountingProbe {
        fn read(&mut self) -> anyhow::Result<ProbeReading> {
            Ok(ProbeReading {
                heap: Some(HeapReading {
                    used: 1024,
                    total: 2048,
                    limit: 4096,
                }),
                ..Default::default()
            })
        }
    }

    fn fast_config() -> CollectorConfig {
        CollectorConfig {
            system_interval_ms: 20,
            client_interval_ms: 20,
            inactivity_sweep_ms: 20,
            ..Default::default()
        }
    }

    #[test]
    fn sampler_collects_and_stops() {
        let collector: SharedCollector = Arc::new(Mutex::new(MetricsCollector::default()));
        // Nothing listens on port 9, so every server poll records an error.
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200));
        let sampler = Sampler::start(
            collector.clone(),
            client,
            Some(Box::new(CountingProbe)),
            &fast_config(),
        )
        .unwrap();

        assert_eq!(lock(&collector).state(), CollectionState::Collecting);
        thread::sleep(Duration::from_millis(120));

        let started = Instant::now();
        sampler.stop();
        assert!(started.elapsed() < Duration::from_secs(2));

        let guard = lock(&collector);
        assert_eq!(guard.state(), CollectionState::Idle);
        assert!(guard.heap_samples().len() >= 2);
        assert!(!guard.errors().is_empty());
        assert!(guard.cpu().is_empty());
    }
}
