pub mod dto;
pub mod evaluator;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use evaluator::{evaluate, BudgetEvaluation, BudgetStatus};
pub use repo_types::{Budget, BudgetPeriod};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
