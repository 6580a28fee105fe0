pub mod routes;
pub mod state;
pub mod ws;

use axum::Router;
use core_sim::SimConfig;

pub fn module_ready() -> bool {
    true
}

pub fn app() -> Router {
    routes::router(state::AppState::new())
}

pub fn app_with_defaults(defaults: SimConfig) -> Router {
    routes::router(state::AppState::with_defaults(defaults))
}
