use axum::{routing::get, Router};
use core_sim::SimConfig;

pub fn build_app(defaults: SimConfig) -> Router {
    debug_assert!(runtime::module_ready());
    debug_assert!(api::module_ready());

    api::app_with_defaults(defaults).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
