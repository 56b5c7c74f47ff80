use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateCategoryRequest, UpdateCategoryRequest},
    repo::CategoryRepo,
    repo_types::{Category, EntryType, NewCategory},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    validation::{Validator, NAME_MAX},
};

/// Categories every new account starts with: (type, name, color, icon).
pub const DEFAULT_CATEGORIES: [(EntryType, &str, &str, &str); 13] = [
    (EntryType::Income, "Salary", "#10B981", "💼"),
    (EntryType::Income, "Freelance", "#8B5CF6", "💻"),
    (EntryType::Income, "Investment", "#F59E0B", "📈"),
    (EntryType::Income, "Other Income", "#6B7280", "💰"),
    (EntryType::Expense, "Food & Dining", "#EF4444", "🍽️"),
    (EntryType::Expense, "Transportation", "#3B82F6", "🚗"),
    (EntryType::Expense, "Shopping", "#EC4899", "🛍️"),
    (EntryType::Expense, "Entertainment", "#F97316", "🎬"),
    (EntryType::Expense, "Bills & Utilities", "#84CC16", "📋"),
    (EntryType::Expense, "Healthcare", "#06B6D4", "🏥"),
    (EntryType::Expense, "Education", "#8B5CF6", "📚"),
    (EntryType::Expense, "Travel", "#10B981", "✈️"),
    (EntryType::Expense, "Other", "#6B7280", "📦"),
];

fn clean_icon(icon: Option<String>) -> Option<String> {
    icon.map(|i| i.trim().to_string()).filter(|i| !i.is_empty())
}

fn validate(name: &str, color: &str) -> AppResult<()> {
    let mut v = Validator::new();
    v.length("name", name, 1, NAME_MAX).color("color", color);
    v.finish()
}

/// Inserts the default set for a freshly registered user. Returns how many were created.
#[instrument(skip(state))]
pub async fn seed_default_categories(state: &AppState, user_id: Uuid) -> AppResult<usize> {
    for (kind, name, color, icon) in DEFAULT_CATEGORIES {
        state
            .store
            .create_category(NewCategory {
                user_id,
                name: name.to_string(),
                color: color.to_string(),
                icon: Some(icon.to_string()),
                kind,
            })
            .await?;
    }
    Ok(DEFAULT_CATEGORIES.len())
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    state: &AppState,
    user_id: Uuid,
    payload: CreateCategoryRequest,
) -> AppResult<Category> {
    let name = payload.name.trim().to_string();
    let color = payload.color.trim().to_string();
    validate(&name, &color)?;

    let category = state
        .store
        .create_category(NewCategory {
            user_id,
            name,
            color,
            icon: clean_icon(payload.icon),
            kind: payload.kind,
        })
        .await?;

    info!(user_id = %user_id, category_id = %category.id, "category created");
    Ok(category)
}

#[instrument(skip(state))]
pub async fn list_categories(
    state: &AppState,
    user_id: Uuid,
    kind: Option<EntryType>,
) -> AppResult<Vec<Category>> {
    Ok(state.store.list_categories(user_id, kind).await?)
}

#[instrument(skip(state))]
pub async fn get_category(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Category> {
    state
        .store
        .find_category(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Category"))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<Category> {
    let mut category = get_category(state, user_id, id).await?;

    if let Some(name) = payload.name {
        category.name = name.trim().to_string();
    }
    if let Some(color) = payload.color {
        category.color = color.trim().to_string();
    }
    if payload.icon.is_some() {
        category.icon = clean_icon(payload.icon);
    }
    if let Some(kind) = payload.kind {
        category.kind = kind;
    }
    validate(&category.name, &category.color)?;

    let updated = state.store.update_category(&category).await?;
    info!(user_id = %user_id, category_id = %id, "category updated");
    Ok(updated)
}

#[instrument(skip(state))]
pub async fn delete_category(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<()> {
    if !state.store.delete_category(user_id, id).await? {
        warn!(user_id = %user_id, category_id = %id, "delete of missing category");
        return Err(AppError::NotFound("Category"));
    }
    info!(user_id = %user_id, category_id = %id, "category deleted");
    Ok(())
}
