//! # Category Repository
//!
//! CRUD for product categories. Categories are never hard-deleted because
//! products reference them; `deactivate` hides them instead.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use inventa_core::validation::{validate_name, validate_new_category};
use inventa_core::{new_id, Category, CategoryUpdate, CoreError, NewCategory, ValidationError};

use crate::error::{AppResult, DbError, DbResult};

const SELECT_CATEGORY: &str = r#"
    SELECT id, name, description, active, created_by, created_at, updated_at
    FROM categories
"#;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category. Names are unique.
    pub async fn create(&self, input: NewCategory) -> AppResult<Category> {
        validate_new_category(&input)?;

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: input.description,
            active: true,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, active, created_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .bind(&category.created_by)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_name(e.into(), &category.name))?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    /// Lists categories by name; inactive ones only when asked.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "{SELECT_CATEGORY} WHERE active = 1 OR ?1 ORDER BY name"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Applies a partial update and returns the stored record.
    pub async fn update(&self, id: &str, update: CategoryUpdate) -> AppResult<Category> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }

        let mut category = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            category.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            category.description = Some(description);
        }
        if let Some(active) = update.active {
            category.active = active;
        }
        category.updated_at = Utc::now();

        debug!(id = %id, "Updating category");

        sqlx::query(
            r#"
            UPDATE categories
            SET name = ?2, description = ?3, active = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_name(e.into(), &category.name))?;

        Ok(category)
    }

    /// Soft-deletes a category.
    pub async fn deactivate(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE categories SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CategoryNotFound(id.to_string()).into());
        }

        info!(id = %id, "Category deactivated");
        Ok(())
    }

    /// Counts active categories.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Turns a UNIQUE violation on the name column into a validation error.
fn duplicate_name(err: DbError, name: &str) -> crate::error::AppError {
    match err {
        DbError::UniqueViolation { .. } => ValidationError::Duplicate {
            field: "name".to_string(),
            value: name.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
