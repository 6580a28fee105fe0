use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use core_sim::{SimConfig, SummaryStatistics, TickSample};
use runtime::{
    logging::TracingRunLogWriter, metrics::RunLatencySummary, ExecutionMode, ExperimentEngine,
    ExperimentError,
};
use serde::{Deserialize, Serialize};

use crate::{
    state::{AppState, LabEvent, StateError, StoredExperiment},
    ws,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/experiments", post(create_experiment))
        .route("/experiments/:experiment_id", get(get_experiment))
        .route(
            "/experiments/:experiment_id/final-differences",
            get(get_final_differences),
        )
        .route("/experiments/:experiment_id/runs/:run_index", get(get_run))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

/// Overrides applied on top of the server defaults. Absent fields keep the
/// default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentRequest {
    pub mean_daily_change: Option<f64>,
    pub stdev_daily_change: Option<f64>,
    pub initial_value: Option<f64>,
    pub num_ticks: Option<usize>,
    pub leverage: Option<f64>,
    pub num_runs: Option<usize>,
    pub seed: Option<u64>,
    pub floor_at_zero: Option<bool>,
    pub parallel: Option<bool>,
}

impl ExperimentRequest {
    pub fn apply(&self, defaults: SimConfig) -> SimConfig {
        SimConfig {
            mean_daily_change: self.mean_daily_change.unwrap_or(defaults.mean_daily_change),
            stdev_daily_change: self
                .stdev_daily_change
                .unwrap_or(defaults.stdev_daily_change),
            initial_value: self.initial_value.unwrap_or(defaults.initial_value),
            num_ticks: self.num_ticks.unwrap_or(defaults.num_ticks),
            leverage: self.leverage.unwrap_or(defaults.leverage),
            num_runs: self.num_runs.unwrap_or(defaults.num_runs),
            seed: self.seed.or(defaults.seed),
            floor_at_zero: self.floor_at_zero.unwrap_or(defaults.floor_at_zero),
        }
    }

    fn execution_mode(&self) -> ExecutionMode {
        if self.parallel.unwrap_or(false) {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        }
    }
}

#[derive(Debug, Serialize)]
struct ExperimentResponse {
    experiment_id: u64,
    config: SimConfig,
    base_seed: u64,
    runs_per_sec: u64,
    run_latency: Option<RunLatencySummary>,
    summary: SummaryStatistics,
}

impl From<&StoredExperiment> for ExperimentResponse {
    fn from(experiment: &StoredExperiment) -> Self {
        Self {
            experiment_id: experiment.experiment_id,
            config: experiment.config,
            base_seed: experiment.base_seed,
            runs_per_sec: experiment.runs_per_sec,
            run_latency: experiment.run_latency,
            summary: experiment.summary,
        }
    }
}

#[derive(Debug, Serialize)]
struct FinalDifferencesResponse<'a> {
    experiment_id: u64,
    final_differences: &'a [f64],
}

#[derive(Debug, Serialize)]
struct RunResponse<'a> {
    experiment_id: u64,
    run_index: usize,
    samples: &'a [TickSample],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub enum ApiError {
    MalformedRequest(String),
    InvalidConfig(ExperimentError),
    NotFound,
    Internal(&'static str),
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::ExperimentIdOverflow => Self::Internal("experiment id space exhausted"),
            StateError::StorePoisoned => Self::Internal("experiment store unavailable"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::MalformedRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            Self::InvalidConfig(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
            Self::Internal(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason.to_owned()),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn parse_request(body: &[u8]) -> Result<ExperimentRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ExperimentRequest::default());
    }

    serde_json::from_slice(body).map_err(|err| ApiError::MalformedRequest(err.to_string()))
}

async fn create_experiment(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_request(&body)?;
    let config = request.apply(state.defaults());
    let engine = ExperimentEngine::new(config)
        .map_err(ApiError::InvalidConfig)?
        .with_mode(request.execution_mode());
    let base_seed = engine.base_seed();

    let experiment_id = state.allocate_experiment_id()?;
    state.publish_event(LabEvent::experiment_started(experiment_id, config.num_runs));

    let outcome = tokio::task::spawn_blocking(move || engine.run(&mut TracingRunLogWriter))
        .await
        .map_err(|_| ApiError::Internal("experiment worker panicked"));
    let outcome = match outcome {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            state.publish_event(LabEvent::experiment_failed(experiment_id, err.to_string()));
            return Err(ApiError::InvalidConfig(err));
        }
        Err(err) => {
            state.publish_event(LabEvent::experiment_failed(
                experiment_id,
                "experiment worker panicked",
            ));
            return Err(err);
        }
    };

    tracing::info!(
        experiment_id,
        num_runs = config.num_runs,
        runs_per_sec = outcome.runs_per_sec,
        mean = outcome.summary.mean,
        "experiment completed"
    );

    let stored = StoredExperiment {
        experiment_id,
        config,
        base_seed,
        summary: outcome.summary,
        runs_per_sec: outcome.runs_per_sec,
        run_latency: outcome.run_latency,
        aggregate: outcome.aggregate,
    };
    let response = ExperimentResponse::from(&stored);
    state.store_experiment(stored)?;
    state.publish_event(LabEvent::experiment_completed(
        experiment_id,
        &response.summary,
    ));

    let location = format!("/experiments/{experiment_id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(response),
    ))
}

async fn get_experiment(
    State(state): State<AppState>,
    Path(experiment_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let experiment = state.experiment(experiment_id)?.ok_or(ApiError::NotFound)?;

    Ok(Json(ExperimentResponse::from(experiment.as_ref())))
}

async fn get_final_differences(
    State(state): State<AppState>,
    Path(experiment_id): Path<u64>,
) -> Result<Response, ApiError> {
    let experiment = state.experiment(experiment_id)?.ok_or(ApiError::NotFound)?;

    Ok(Json(FinalDifferencesResponse {
        experiment_id,
        final_differences: experiment.aggregate.final_differences(),
    })
    .into_response())
}

async fn get_run(
    State(state): State<AppState>,
    Path((experiment_id, run_index)): Path<(u64, usize)>,
) -> Result<Response, ApiError> {
    let experiment = state.experiment(experiment_id)?.ok_or(ApiError::NotFound)?;
    let run = experiment
        .aggregate
        .runs()
        .get(run_index)
        .ok_or(ApiError::NotFound)?;

    Ok(Json(RunResponse {
        experiment_id,
        run_index,
        samples: run.samples(),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use core_sim::SimConfig;

    use super::{parse_request, ApiError, ExperimentRequest};

    #[test]
    fn empty_body_uses_defaults() {
        let request = parse_request(b"  \n").unwrap();
        let defaults = SimConfig::default().with_seed(3);

        assert_eq!(request.apply(defaults), defaults);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let request: ExperimentRequest =
            serde_json::from_str(r#"{"leverage": 3.0, "num_runs": 12}"#).unwrap();

        let config = request.apply(SimConfig::default());

        assert_eq!(config.leverage, 3.0);
        assert_eq!(config.num_runs, 12);
        assert_eq!(config.num_ticks, 100);
        assert_eq!(config.stdev_daily_change, 0.06);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_request(br#"{"levrage": 3.0}"#).unwrap_err();

        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }
}
