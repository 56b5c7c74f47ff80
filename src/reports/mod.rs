pub mod aggregator;
pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use aggregator::{summarize, CategoryTotal, PeriodRange, Summary};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
