//! Persistence seam. Each domain module declares its repository trait in its
//! `repo.rs`; `PgStore` backs them with Postgres and `MemoryStore` keeps
//! everything in process for tests and local runs.

mod memory;
mod postgres;

use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub(crate) use postgres::{like_pattern, write_error};

use crate::auth::repo::UserRepo;
use crate::budgets::repo::BudgetRepo;
use crate::categories::repo::CategoryRepo;
use crate::transactions::repo::TransactionRepo;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("{0} is still referenced")]
    InUse(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the services need from persistence.
pub trait Store: UserRepo + CategoryRepo + TransactionRepo + BudgetRepo + Send + Sync {}

impl<T> Store for T where T: UserRepo + CategoryRepo + TransactionRepo + BudgetRepo + Send + Sync {}
