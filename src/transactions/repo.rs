use async_trait::async_trait;
use uuid::Uuid;

use crate::store::{like_pattern, write_error, PgStore, StoreError, StoreResult};
use crate::transactions::repo_types::{
    NewTransaction, Transaction, TransactionFilter, TransactionRow,
};

#[async_trait]
pub trait TransactionRepo: Send + Sync {
    async fn create_transaction(&self, new: NewTransaction) -> StoreResult<Transaction>;
    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Transaction>>;
    /// Newest first (date, then creation time).
    async fn find_transactions(&self, user_id: Uuid, filter: &TransactionFilter) -> StoreResult<Vec<Transaction>>;
    /// Ignores the filter's limit and offset.
    async fn count_transactions(&self, user_id: Uuid, filter: &TransactionFilter) -> StoreResult<i64>;
    async fn update_transaction(&self, transaction: &Transaction) -> StoreResult<Transaction>;
    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

fn decode(row: TransactionRow) -> StoreResult<Transaction> {
    Transaction::try_from(row).map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))
}

const FILTER_CLAUSE: &str = r#"
    user_id = $1
    AND ($2::text IS NULL OR kind = $2)
    AND ($3::uuid IS NULL OR category_id = $3)
    AND ($4::date IS NULL OR date >= $4)
    AND ($5::date IS NULL OR date <= $5)
    AND ($6::text IS NULL OR description ILIKE $6)
"#;

#[async_trait]
impl TransactionRepo for PgStore {
    async fn create_transaction(&self, new: NewTransaction) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (id, user_id, category_id, amount, kind, description, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, category_id, amount, kind, description, date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.category_id)
        .bind(new.amount)
        .bind(new.kind.as_str())
        .bind(&new.description)
        .bind(new.date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "Transaction"))?;
        decode(row)
    }

    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, category_id, amount, kind, description, date, created_at
              FROM transactions
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(decode).transpose()
    }

    async fn find_transactions(&self, user_id: Uuid, filter: &TransactionFilter) -> StoreResult<Vec<Transaction>> {
        let sql = format!(
            r#"
            SELECT id, user_id, category_id, amount, kind, description, date, created_at
              FROM transactions
             WHERE {FILTER_CLAUSE}
             ORDER BY date DESC, created_at DESC
             LIMIT $7 OFFSET $8
            "#
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(filter.category_id)
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.limit)
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(self.pool())
            .await?;
        rows.into_iter().map(decode).collect()
    }

    async fn count_transactions(&self, user_id: Uuid, filter: &TransactionFilter) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM transactions WHERE {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(filter.category_id)
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn update_transaction(&self, transaction: &Transaction) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
               SET category_id = $3, amount = $4, kind = $5, description = $6, date = $7
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, category_id, amount, kind, description, date, created_at
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.category_id)
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(&transaction.description)
        .bind(transaction.date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "Transaction"))?;
        decode(row)
    }

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
