//! # Supplier Repository
//!
//! CRUD for suppliers. Like categories, suppliers are soft-deleted.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use inventa_core::validation::{validate_email, validate_name, validate_new_supplier, validate_phone};
use inventa_core::{new_id, CoreError, NewSupplier, Supplier, SupplierUpdate};

use crate::error::{AppResult, DbResult};

const SELECT_SUPPLIER: &str = r#"
    SELECT id, name, contact, phone, email, address, active, created_by, created_at, updated_at
    FROM suppliers
"#;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn create(&self, input: NewSupplier) -> AppResult<Supplier> {
        validate_new_supplier(&input)?;

        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            name: input.name.trim().to_string(),
            contact: input.contact,
            phone: input.phone,
            email: input.email,
            address: input.address,
            active: true,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, contact, phone, email, address,
                active, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.active)
        .bind(&supplier.created_by)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "{SELECT_SUPPLIER} WHERE active = 1 OR ?1 ORDER BY name"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn update(&self, id: &str, update: SupplierUpdate) -> AppResult<Supplier> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        validate_phone("phone", update.phone.as_deref())?;
        validate_email(update.email.as_deref())?;

        let mut supplier = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SupplierNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            supplier.name = name.trim().to_string();
        }
        if update.contact.is_some() {
            supplier.contact = update.contact;
        }
        if update.phone.is_some() {
            supplier.phone = update.phone;
        }
        if update.email.is_some() {
            supplier.email = update.email;
        }
        if update.address.is_some() {
            supplier.address = update.address;
        }
        if let Some(active) = update.active {
            supplier.active = active;
        }
        supplier.updated_at = Utc::now();

        debug!(id = %id, "Updating supplier");

        sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?2, contact = ?3, phone = ?4, email = ?5, address = ?6,
                active = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.active)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn deactivate(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE suppliers SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SupplierNotFound(id.to_string()).into());
        }

        info!(id = %id, "Supplier deactivated");
        Ok(())
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
