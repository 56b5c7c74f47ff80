pub mod app;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod config;
pub mod error;
pub mod extract;
pub mod money;
pub mod notify;
pub mod reports;
pub mod state;
pub mod store;
pub mod transactions;
pub mod validation;
