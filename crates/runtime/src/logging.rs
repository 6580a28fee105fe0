use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLogEventKind {
    ExperimentStarted,
    RunCompleted,
    ProgressReported,
    ExperimentCompleted,
    ArtifactWritten,
}

impl RunLogEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExperimentStarted => "experiment_started",
            Self::RunCompleted => "run_completed",
            Self::ProgressReported => "progress_reported",
            Self::ExperimentCompleted => "experiment_completed",
            Self::ArtifactWritten => "artifact_written",
        }
    }
}

/// One journal entry. `run_index` counts completed runs for progress and
/// completion events, and is the zero-based index for `RunCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLogEvent {
    pub run_index: u64,
    pub kind: RunLogEventKind,
    pub final_difference: Option<f64>,
    pub elapsed_nanos: Option<u64>,
}

impl RunLogEvent {
    pub fn new(run_index: u64, kind: RunLogEventKind) -> Self {
        Self {
            run_index,
            kind,
            final_difference: None,
            elapsed_nanos: None,
        }
    }

    pub fn run_completed(run_index: u64, final_difference: f64, elapsed_nanos: u64) -> Self {
        Self {
            run_index,
            kind: RunLogEventKind::RunCompleted,
            final_difference: Some(final_difference),
            elapsed_nanos: Some(elapsed_nanos),
        }
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }

    pub fn count(&self, kind: RunLogEventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

/// Forwards journal entries to `tracing`. Per-run entries go to `debug`,
/// lifecycle entries to `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        match event.kind {
            RunLogEventKind::RunCompleted => tracing::debug!(
                event = event.kind.as_str(),
                run_index = event.run_index,
                final_difference = event.final_difference,
                elapsed_nanos = event.elapsed_nanos,
            ),
            _ => tracing::info!(
                event = event.kind.as_str(),
                run_index = event.run_index,
                elapsed_nanos = event.elapsed_nanos,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter};

    #[test]
    fn in_memory_writer_keeps_events_in_order() {
        let mut writer = InMemoryRunLogWriter::new();

        writer.write(RunLogEvent::new(0, RunLogEventKind::ExperimentStarted));
        writer.write(RunLogEvent::run_completed(0, -12.5, 900));
        writer.write(RunLogEvent::new(1, RunLogEventKind::ExperimentCompleted));

        let kinds: Vec<RunLogEventKind> = writer.events().iter().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RunLogEventKind::ExperimentStarted,
                RunLogEventKind::RunCompleted,
                RunLogEventKind::ExperimentCompleted,
            ]
        );
        assert_eq!(writer.events()[1].final_difference, Some(-12.5));
        assert_eq!(writer.count(RunLogEventKind::RunCompleted), 1);
    }

    #[test]
    fn tracing_writer_accepts_every_kind_without_subscriber() {
        let mut writer = TracingRunLogWriter;

        writer.write(RunLogEvent::new(0, RunLogEventKind::ExperimentStarted));
        writer.write(RunLogEvent::run_completed(3, 1.0, 10));
        writer.write(RunLogEvent::new(10, RunLogEventKind::ProgressReported));
        writer.write(RunLogEvent::new(0, RunLogEventKind::ArtifactWritten));
    }

    #[test]
    fn kinds_have_stable_names() {
        assert_eq!(RunLogEventKind::RunCompleted.as_str(), "run_completed");
        assert_eq!(RunLogEventKind::ArtifactWritten.as_str(), "artifact_written");
    }

    #[test]
    fn events_serialize_with_snake_case_kind() {
        let json = serde_json::to_value(RunLogEvent::run_completed(4, -2.5, 120)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "run_index": 4,
                "kind": "run_completed",
                "final_difference": -2.5,
                "elapsed_nanos": 120
            })
        );
    }
}
