use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use core_sim::{AggregateResult, SimConfig, SummaryStatistics};
use runtime::metrics::RunLatencySummary;
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StateError {
    ExperimentIdOverflow,
    StorePoisoned,
}

#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LabEvent {
    Connected {
        experiment_id: Option<u64>,
    },
    ExperimentStarted {
        experiment_id: u64,
        num_runs: usize,
    },
    ExperimentCompleted {
        experiment_id: u64,
        mean: f64,
        std_dev: f64,
    },
    ExperimentFailed {
        experiment_id: u64,
        reason: String,
    },
}

impl LabEvent {
    pub fn connected() -> Self {
        Self::Connected {
            experiment_id: None,
        }
    }

    pub fn experiment_started(experiment_id: u64, num_runs: usize) -> Self {
        Self::ExperimentStarted {
            experiment_id,
            num_runs,
        }
    }

    pub fn experiment_completed(experiment_id: u64, summary: &SummaryStatistics) -> Self {
        Self::ExperimentCompleted {
            experiment_id,
            mean: summary.mean,
            std_dev: summary.std_dev,
        }
    }

    pub fn experiment_failed(experiment_id: u64, reason: impl Into<String>) -> Self {
        Self::ExperimentFailed {
            experiment_id,
            reason: reason.into(),
        }
    }

    pub fn experiment_id(&self) -> Option<u64> {
        match self {
            Self::Connected { experiment_id } => *experiment_id,
            Self::ExperimentStarted { experiment_id, .. }
            | Self::ExperimentCompleted { experiment_id, .. }
            | Self::ExperimentFailed { experiment_id, .. } => Some(*experiment_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredExperiment {
    pub experiment_id: u64,
    pub config: SimConfig,
    pub base_seed: u64,
    pub summary: SummaryStatistics,
    pub runs_per_sec: u64,
    pub run_latency: Option<RunLatencySummary>,
    pub aggregate: AggregateResult,
}

/// Finished experiments kept for lookup before the oldest is evicted.
pub const DEFAULT_RETAINED_EXPERIMENTS: usize = 32;

/// Id-indexed experiments with insertion order for eviction.
#[derive(Debug, Default)]
struct ExperimentStore {
    by_id: HashMap<u64, Arc<StoredExperiment>>,
    order: VecDeque<u64>,
}

impl ExperimentStore {
    fn insert(&mut self, experiment: StoredExperiment, retain: usize) {
        let experiment_id = experiment.experiment_id;
        if self
            .by_id
            .insert(experiment_id, Arc::new(experiment))
            .is_none()
        {
            self.order.push_back(experiment_id);
        }

        while self.order.len() > retain {
            if let Some(evicted) = self.order.pop_front() {
                self.by_id.remove(&evicted);
                tracing::debug!(experiment_id = evicted, "evicted stored experiment");
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    next_experiment_id: Arc<AtomicU64>,
    events_tx: broadcast::Sender<LabEvent>,
    experiments: Arc<RwLock<ExperimentStore>>,
    retained_experiments: usize,
    defaults: SimConfig,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_defaults(SimConfig::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: SimConfig) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            next_experiment_id: Arc::new(AtomicU64::new(0)),
            events_tx,
            experiments: Arc::new(RwLock::new(ExperimentStore::default())),
            retained_experiments: DEFAULT_RETAINED_EXPERIMENTS,
            defaults,
        }
    }

    /// At least one experiment is always retained.
    pub fn with_retained_experiments(mut self, retained_experiments: usize) -> Self {
        self.retained_experiments = retained_experiments.max(1);
        self
    }

    pub fn defaults(&self) -> SimConfig {
        self.defaults
    }

    pub fn allocate_experiment_id(&self) -> Result<u64, StateError> {
        let previous = self
            .next_experiment_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .map_err(|_| StateError::ExperimentIdOverflow)?;

        Ok(previous + 1)
    }

    pub fn store_experiment(&self, experiment: StoredExperiment) -> Result<(), StateError> {
        let mut experiments = self
            .experiments
            .write()
            .map_err(|_| StateError::StorePoisoned)?;
        experiments.insert(experiment, self.retained_experiments);
        Ok(())
    }

    pub fn experiment(&self, experiment_id: u64) -> Result<Option<Arc<StoredExperiment>>, StateError> {
        let experiments = self
            .experiments
            .read()
            .map_err(|_| StateError::StorePoisoned)?;
        Ok(experiments.by_id.get(&experiment_id).cloned())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LabEvent> {
        self.events_tx.subscribe()
    }

    /// Returns the number of subscribers reached; zero subscribers is not an
    /// error for callers.
    pub fn publish_event(&self, event: LabEvent) -> usize {
        self.events_tx.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use core_sim::{MonteCarloEngine, SimConfig};

    use super::{AppState, LabEvent, StateError, StoredExperiment, DEFAULT_RETAINED_EXPERIMENTS};

    #[test]
    fn allocate_experiment_id_returns_overflow_error_at_u64_max() {
        let state = AppState::new();
        state.next_experiment_id.store(u64::MAX, Ordering::Relaxed);

        assert_eq!(
            state.allocate_experiment_id(),
            Err(StateError::ExperimentIdOverflow)
        );
    }

    #[test]
    fn experiment_ids_start_at_one_and_increase() {
        let state = AppState::new();

        assert_eq!(state.allocate_experiment_id(), Ok(1));
        assert_eq!(state.allocate_experiment_id(), Ok(2));
    }

    fn stored(experiment_id: u64) -> StoredExperiment {
        let config = SimConfig {
            num_runs: 3,
            num_ticks: 5,
            ..SimConfig::default()
        }
        .with_seed(experiment_id);
        let aggregate = MonteCarloEngine::new(config).unwrap().run();

        StoredExperiment {
            experiment_id,
            config,
            base_seed: experiment_id,
            summary: aggregate.summary().unwrap(),
            runs_per_sec: 0,
            run_latency: None,
            aggregate,
        }
    }

    #[test]
    fn stored_experiment_is_shared_between_clones() {
        let state = AppState::new();
        let experiment = stored(4);
        let summary = experiment.summary;

        state.clone().store_experiment(experiment).unwrap();

        let stored = state.experiment(4).unwrap().expect("experiment should be stored");
        assert_eq!(stored.summary, summary);
        assert!(state.experiment(5).unwrap().is_none());
    }

    #[test]
    fn oldest_experiment_is_evicted_past_retention() {
        let state = AppState::new().with_retained_experiments(3);

        for experiment_id in 1..=4 {
            state.store_experiment(stored(experiment_id)).unwrap();
        }

        assert!(state.experiment(1).unwrap().is_none());
        for experiment_id in 2..=4 {
            assert!(state.experiment(experiment_id).unwrap().is_some());
        }
    }

    #[test]
    fn default_retention_is_bounded() {
        let state = AppState::new();

        for experiment_id in 1..=(DEFAULT_RETAINED_EXPERIMENTS as u64 + 1) {
            state.store_experiment(stored(experiment_id)).unwrap();
        }

        assert!(state.experiment(1).unwrap().is_none());
        assert!(state.experiment(2).unwrap().is_some());
        assert_eq!(
            state.experiments.read().unwrap().order.len(),
            DEFAULT_RETAINED_EXPERIMENTS
        );
    }

    #[test]
    fn storing_same_id_twice_keeps_one_slot() {
        let state = AppState::new().with_retained_experiments(2);

        state.store_experiment(stored(1)).unwrap();
        state.store_experiment(stored(1)).unwrap();
        state.store_experiment(stored(2)).unwrap();

        assert!(state.experiment(1).unwrap().is_some());
        assert!(state.experiment(2).unwrap().is_some());
    }

    #[test]
    fn publishing_without_subscribers_reaches_nobody() {
        let state = AppState::new();

        assert_eq!(state.publish_event(LabEvent::connected()), 0);
    }

    #[test]
    fn subscribers_receive_published_events() {
        let state = AppState::new();
        let mut events = state.subscribe_events();

        assert_eq!(state.publish_event(LabEvent::experiment_started(1, 10)), 1);

        match events.try_recv().unwrap() {
            LabEvent::ExperimentStarted {
                experiment_id,
                num_runs,
            } => {
                assert_eq!(experiment_id, 1);
                assert_eq!(num_runs, 10);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
