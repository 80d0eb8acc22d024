//! Probe implementations of the `Task` trait
//!
//! A probe records how often its cargo steps were invoked and can be told
//! to fail, panic or stall inside a step.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleet_core::{CargoError, Task};
use tokio::time::sleep;

/// Shared call counters of a probe, still readable after the probe was moved into a dispatch
#[derive(Debug, Clone, Default)]
pub struct CallCounters {
    loads: Arc<AtomicUsize>,
    unloads: Arc<AtomicUsize>,
}

impl CallCounters {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.loads() + self.unloads()
    }
}

/// Records the number of probes currently inside a cargo step and the maximum seen
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    current: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one step as running until the returned guard is dropped
    pub fn enter(&self) -> ConcurrencyGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        ConcurrencyGuard {
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn max_seen(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

/// Decrements the probe when dropped, including when a step future is cancelled
#[derive(Debug)]
pub struct ConcurrencyGuard {
    current: Arc<AtomicUsize>,
}

impl Drop for ConcurrencyGuard {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Test double for the `Task` trait
#[derive(Debug, Clone)]
pub struct ProbeTask {
    id: String,
    cargo: i32,
    counters: CallCounters,
    load_error: Option<CargoError>,
    unload_error: Option<CargoError>,
    panic_on_load: bool,
    step_delay: Duration,
    probe: Option<ConcurrencyProbe>,
}

impl ProbeTask {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            cargo: 0,
            counters: CallCounters::default(),
            load_error: None,
            unload_error: None,
            panic_on_load: false,
            step_delay: Duration::ZERO,
            probe: None,
        }
    }

    pub fn failing_load(mut self, error: CargoError) -> Self {
        self.load_error = Some(error);
        self
    }

    pub fn failing_unload(mut self, error: CargoError) -> Self {
        self.unload_error = Some(error);
        self
    }

    pub fn panicking_on_load(mut self) -> Self {
        self.panic_on_load = true;
        self
    }

    /// Sleep this long inside every cargo step
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_probe(mut self, probe: ConcurrencyProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn counters(&self) -> CallCounters {
        self.counters.clone()
    }

    pub fn cargo(&self) -> i32 {
        self.cargo
    }

    async fn step(&self) {
        let _running = self.probe.as_ref().map(ConcurrencyProbe::enter);
        if !self.step_delay.is_zero() {
            sleep(self.step_delay).await;
        }
    }
}

#[async_trait]
impl Task for ProbeTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn load_cargo(&mut self) -> Result<(), CargoError> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_load {
            panic!("probe {} panicked while loading", self.id);
        }
        self.step().await;
        if let Some(error) = &self.load_error {
            return Err(error.clone());
        }
        self.cargo += 10;
        Ok(())
    }

    async fn unload_cargo(&mut self) -> Result<(), CargoError> {
        self.counters.unloads.fetch_add(1, Ordering::SeqCst);
        self.step().await;
        if let Some(error) = &self.unload_error {
            return Err(error.clone());
        }
        self.cargo = 0;
        Ok(())
    }
}

/// Build `count` probes with ids `{prefix}{n}`, starting at 1
pub fn probes(prefix: &str, count: usize) -> Vec<ProbeTask> {
    (1..=count)
        .map(|n| ProbeTask::new(&format!("{prefix}{n}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_counts_calls() {
        let mut probe = ProbeTask::new("P1");
        let counters = probe.counters();

        probe.load_cargo().await.unwrap();
        assert_eq!(probe.cargo(), 10);
        probe.unload_cargo().await.unwrap();
        assert_eq!(probe.cargo(), 0);

        assert_eq!(counters.loads(), 1);
        assert_eq!(counters.unloads(), 1);
        assert_eq!(counters.total(), 2);
    }

    #[tokio::test]
    async fn test_probe_failure_injection() {
        let mut probe = ProbeTask::new("P1").failing_load(CargoError::not_found("P1"));
        let err = probe.load_cargo().await.unwrap_err();
        assert_eq!(err, CargoError::not_found("P1"));
        assert_eq!(probe.cargo(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_probe_tracks_max() {
        let gauge = ConcurrencyProbe::new();
        let mut first = ProbeTask::new("P1")
            .with_step_delay(Duration::from_millis(10))
            .with_probe(gauge.clone());
        let mut second = ProbeTask::new("P2")
            .with_step_delay(Duration::from_millis(10))
            .with_probe(gauge.clone());

        let (a, b) = tokio::join!(first.load_cargo(), second.load_cargo());
        a.unwrap();
        b.unwrap();

        assert_eq!(gauge.max_seen(), 2);
        assert_eq!(gauge.current(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_probe_released_when_step_dropped() {
        let gauge = ConcurrencyProbe::new();
        let mut task = ProbeTask::new("P1")
            .with_step_delay(Duration::from_secs(10))
            .with_probe(gauge.clone());

        let result = tokio::time::timeout(Duration::from_secs(1), task.load_cargo()).await;

        assert!(result.is_err());
        assert_eq!(gauge.max_seen(), 1);
        assert_eq!(gauge.current(), 0);
    }

    #[test]
    fn test_probes_builder() {
        let tasks = probes("T", 3);
        let ids: Vec<&str> = tasks.iter().map(|task| task.id()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
    }
}
