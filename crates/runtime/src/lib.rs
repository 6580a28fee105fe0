pub mod engine;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod report;

pub use engine::{ExecutionMode, ExperimentEngine, ExperimentError, ExperimentOutcome};

pub fn module_ready() -> bool {
    true
}
