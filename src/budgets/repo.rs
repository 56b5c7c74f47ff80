use async_trait::async_trait;
use uuid::Uuid;

use crate::budgets::repo_types::{Budget, BudgetPeriod, BudgetRow, NewBudget};
use crate::store::{write_error, PgStore, StoreError, StoreResult};

#[async_trait]
pub trait BudgetRepo: Send + Sync {
    async fn create_budget(&self, new: NewBudget) -> StoreResult<Budget>;
    async fn find_budget(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Budget>>;
    /// Ordered by start date, newest first.
    async fn list_budgets(&self, user_id: Uuid, period: Option<BudgetPeriod>) -> StoreResult<Vec<Budget>>;
    async fn update_budget(&self, budget: &Budget) -> StoreResult<Budget>;
    async fn delete_budget(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

fn decode(row: BudgetRow) -> StoreResult<Budget> {
    Budget::try_from(row).map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))
}

#[async_trait]
impl BudgetRepo for PgStore {
    async fn create_budget(&self, new: NewBudget) -> StoreResult<Budget> {
        let row = sqlx::query_as::<_, BudgetRow>(
            r#"
            INSERT INTO budgets (id, user_id, category_id, name, amount, period, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, category_id, name, amount, period, start_date, end_date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.category_id)
        .bind(&new.name)
        .bind(new.amount)
        .bind(new.period.as_str())
        .bind(new.start_date)
        .bind(new.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "Budget"))?;
        decode(row)
    }

    async fn find_budget(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Budget>> {
        let row = sqlx::query_as::<_, BudgetRow>(
            r#"
            SELECT id, user_id, category_id, name, amount, period, start_date, end_date, created_at
              FROM budgets
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(decode).transpose()
    }

    async fn list_budgets(&self, user_id: Uuid, period: Option<BudgetPeriod>) -> StoreResult<Vec<Budget>> {
        let rows = sqlx::query_as::<_, BudgetRow>(
            r#"
            SELECT id, user_id, category_id, name, amount, period, start_date, end_date, created_at
              FROM budgets
             WHERE user_id = $1 AND ($2::text IS NULL OR period = $2)
             ORDER BY start_date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(period.map(|p| p.as_str()))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(decode).collect()
    }

    async fn update_budget(&self, budget: &Budget) -> StoreResult<Budget> {
        let row = sqlx::query_as::<_, BudgetRow>(
            r#"
            UPDATE budgets
               SET category_id = $3, name = $4, amount = $5, period = $6,
                   start_date = $7, end_date = $8
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, category_id, name, amount, period, start_date, end_date, created_at
            "#,
        )
        .bind(budget.id)
        .bind(budget.user_id)
        .bind(budget.category_id)
        .bind(&budget.name)
        .bind(budget.amount)
        .bind(budget.period.as_str())
        .bind(budget.start_date)
        .bind(budget.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "Budget"))?;
        decode(row)
    }

    async fn delete_budget(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
