use async_trait::async_trait;
use uuid::Uuid;

use crate::categories::repo_types::{Category, CategoryRow, EntryType, NewCategory};
use crate::store::{write_error, PgStore, StoreError, StoreResult};

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// Fails with `StoreError::Duplicate` when the user already has a category with this name.
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category>;
    async fn find_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Category>>;
    async fn list_categories(&self, user_id: Uuid, kind: Option<EntryType>) -> StoreResult<Vec<Category>>;
    async fn update_category(&self, category: &Category) -> StoreResult<Category>;
    /// Returns `false` when nothing was deleted; `StoreError::InUse` while referenced.
    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

fn decode(row: CategoryRow) -> StoreResult<Category> {
    Category::try_from(row).map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))
}

#[async_trait]
impl CategoryRepo for PgStore {
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (id, user_id, name, color, icon, kind)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, color, icon, kind, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.color)
        .bind(&new.icon)
        .bind(new.kind.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "Category"))?;
        decode(row)
    }

    async fn find_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, user_id, name, color, icon, kind, created_at
              FROM categories
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(decode).transpose()
    }

    async fn list_categories(&self, user_id: Uuid, kind: Option<EntryType>) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, user_id, name, color, icon, kind, created_at
              FROM categories
             WHERE user_id = $1 AND ($2::text IS NULL OR kind = $2)
             ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(decode).collect()
    }

    async fn update_category(&self, category: &Category) -> StoreResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
               SET name = $3, color = $4, icon = $5, kind = $6
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, color, icon, kind, created_at
            "#,
        )
        .bind(category.id)
        .bind(category.user_id)
        .bind(&category.name)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.kind.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, "Category"))?;
        decode(row)
    }

    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await
            .map_err(|e| write_error(e, "Category"))?;
        Ok(res.rows_affected() > 0)
    }
}
