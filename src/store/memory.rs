use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::auth::repo::UserRepo;
use crate::auth::repo_types::{NewUser, User};
use crate::budgets::repo::BudgetRepo;
use crate::budgets::repo_types::{Budget, BudgetPeriod, NewBudget};
use crate::categories::repo::CategoryRepo;
use crate::categories::repo_types::{Category, EntryType, NewCategory};
use crate::transactions::repo::TransactionRepo;
use crate::transactions::repo_types::{NewTransaction, Transaction, TransactionFilter};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
}

/// In-process store with the same constraints as the Postgres schema
/// (unique emails, unique category names per user, restricted category deletes).
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate("User"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_profile(&self, id: Uuid, name: &str, email: &str) -> StoreResult<Option<User>> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.id != id && u.email == email) {
            return Err(StoreError::Duplicate("User"));
        }
        Ok(t.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.name = name.to_string();
            u.email = email.to_string();
            u.clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
            u.reset_token_hash = None;
            u.reset_token_expires_at = None;
        }
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expires_at: OffsetDateTime) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id) {
            u.reset_token_hash = Some(token_hash.to_string());
            u.reset_token_expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn clear_reset_token(&self, id: Uuid) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id) {
            u.reset_token_hash = None;
            u.reset_token_expires_at = None;
        }
        Ok(())
    }

    async fn find_user_by_reset_token(&self, token_hash: &str, now: OffsetDateTime) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users
            .iter()
            .find(|u| {
                u.reset_token_hash.as_deref() == Some(token_hash)
                    && u.reset_token_expires_at.map_or(false, |exp| exp > now)
            })
            .cloned())
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let mut t = self.tables.write().await;
        if t.categories
            .iter()
            .any(|c| c.user_id == new.user_id && c.name == new.name)
        {
            return Err(StoreError::Duplicate("Category"));
        }
        let category = Category {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            color: new.color,
            icon: new.icon,
            kind: new.kind,
            created_at: OffsetDateTime::now_utc(),
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn find_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Category>> {
        let t = self.tables.read().await;
        Ok(t.categories
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn list_categories(&self, user_id: Uuid, kind: Option<EntryType>) -> StoreResult<Vec<Category>> {
        let t = self.tables.read().await;
        let mut out: Vec<Category> = t
            .categories
            .iter()
            .filter(|c| c.user_id == user_id && kind.map_or(true, |k| c.kind == k))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn update_category(&self, category: &Category) -> StoreResult<Category> {
        let mut t = self.tables.write().await;
        if t.categories.iter().any(|c| {
            c.user_id == category.user_id && c.id != category.id && c.name == category.name
        }) {
            return Err(StoreError::Duplicate("Category"));
        }
        let slot = t
            .categories
            .iter_mut()
            .find(|c| c.id == category.id && c.user_id == category.user_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        *slot = category.clone();
        Ok(slot.clone())
    }

    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let referenced = t.transactions.iter().any(|x| x.category_id == id)
            || t.budgets.iter().any(|b| b.category_id == id);
        let exists = t
            .categories
            .iter()
            .any(|c| c.id == id && c.user_id == user_id);
        if exists && referenced {
            return Err(StoreError::InUse("Category"));
        }
        t.categories.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(exists)
    }
}

#[async_trait]
impl TransactionRepo for MemoryStore {
    async fn create_transaction(&self, new: NewTransaction) -> StoreResult<Transaction> {
        let mut t = self.tables.write().await;
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            category_id: new.category_id,
            amount: new.amount,
            kind: new.kind,
            description: new.description,
            date: new.date,
            created_at: OffsetDateTime::now_utc(),
        };
        t.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Transaction>> {
        let t = self.tables.read().await;
        Ok(t.transactions
            .iter()
            .find(|x| x.id == id && x.user_id == user_id)
            .cloned())
    }

    async fn find_transactions(&self, user_id: Uuid, filter: &TransactionFilter) -> StoreResult<Vec<Transaction>> {
        let t = self.tables.read().await;
        let mut out: Vec<Transaction> = t
            .transactions
            .iter()
            .filter(|x| x.user_id == user_id && filter.matches(x))
            .cloned()
            .collect();
        // Insertion order stands in for created_at, so reverse before the stable sort.
        out.reverse();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(out.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_transactions(&self, user_id: Uuid, filter: &TransactionFilter) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.transactions
            .iter()
            .filter(|x| x.user_id == user_id && filter.matches(x))
            .count() as i64)
    }

    async fn update_transaction(&self, transaction: &Transaction) -> StoreResult<Transaction> {
        let mut t = self.tables.write().await;
        let slot = t
            .transactions
            .iter_mut()
            .find(|x| x.id == transaction.id && x.user_id == transaction.user_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        *slot = transaction.clone();
        Ok(slot.clone())
    }

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.transactions.len();
        t.transactions.retain(|x| !(x.id == id && x.user_id == user_id));
        Ok(t.transactions.len() < before)
    }
}

#[async_trait]
impl BudgetRepo for MemoryStore {
    async fn create_budget(&self, new: NewBudget) -> StoreResult<Budget> {
        let mut t = self.tables.write().await;
        let budget = Budget {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            category_id: new.category_id,
            name: new.name,
            amount: new.amount,
            period: new.period,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: OffsetDateTime::now_utc(),
        };
        t.budgets.push(budget.clone());
        Ok(budget)
    }

    async fn find_budget(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Budget>> {
        let t = self.tables.read().await;
        Ok(t.budgets
            .iter()
            .find(|b| b.id == id && b.user_id == user_id)
            .cloned())
    }

    async fn list_budgets(&self, user_id: Uuid, period: Option<BudgetPeriod>) -> StoreResult<Vec<Budget>> {
        let t = self.tables.read().await;
        let mut out: Vec<Budget> = t
            .budgets
            .iter()
            .filter(|b| b.user_id == user_id && period.map_or(true, |p| b.period == p))
            .cloned()
            .collect();
        out.reverse();
        out.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(out)
    }

    async fn update_budget(&self, budget: &Budget) -> StoreResult<Budget> {
        let mut t = self.tables.write().await;
        let slot = t
            .budgets
            .iter_mut()
            .find(|b| b.id == budget.id && b.user_id == budget.user_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        *slot = budget.clone();
        Ok(slot.clone())
    }

    async fn delete_budget(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.budgets.len();
        t.budgets.retain(|b| !(b.id == id && b.user_id == user_id));
        Ok(t.budgets.len() < before)
    }
}
