//! # Validation Module
//!
//! Field-level input validation for Inventa.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: THIS MODULE                                                   │
//! │  ├── Required fields, lengths, formats                                 │
//! │  └── Quantities ≥ 1, prices ≥ 0                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ledger rules (crate::ledger)                                 │
//! │  ├── Stock availability                                                │
//! │  └── Return availability, status guards                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── NOT NULL, CHECK (stock >= 0), foreign keys                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use inventa_core::validation::validate_quantity;
//!
//! assert!(validate_quantity("quantity", 5).is_ok());
//! assert!(validate_quantity("quantity", 0).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{
    NewCategory, NewProduct, NewReturn, NewSale, NewSupplier, ProductUpdate, ReturnRequest,
};
use crate::MAX_SALE_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Name length bounds for catalog records.
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;

// =============================================================================
// Primitive Validators
// =============================================================================

/// Validates that a required string field is present and non-blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a catalog name (category, supplier, product).
///
/// ## Rules
/// - Must not be blank
/// - 2 to 100 characters after trimming
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();
    validate_required(field, name)?;

    let len = name.chars().count();
    if len < NAME_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: NAME_MIN_LEN,
        });
    }
    if len > NAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: NAME_MAX_LEN,
        });
    }
    Ok(())
}

/// Validates a quantity (must be ≥ 1).
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a price or stock figure (must be ≥ 0).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an optional e-mail address.
///
/// Only the shape is checked: one `@` with text on both sides and a dot in
/// the domain part.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        });
    }
    Ok(())
}

/// Validates an optional phone number (at most 20 characters).
pub fn validate_phone(field: &str, phone: Option<&str>) -> ValidationResult<()> {
    if let Some(phone) = phone {
        if phone.trim().chars().count() > 20 {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: 20,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a new sale before any stock is looked at.
///
/// ## Rules
/// - `user_id` present
/// - At least one line, at most [`MAX_SALE_LINES`]
/// - Every line names a product and has quantity ≥ 1
/// - Price overrides, when given, are ≥ 0
pub fn validate_new_sale(sale: &NewSale) -> CoreResult<()> {
    validate_required("user_id", &sale.user_id)?;

    if sale.lines.is_empty() {
        return Err(CoreError::EmptySale);
    }
    if sale.lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        }
        .into());
    }

    for line in &sale.lines {
        validate_required("product_id", &line.product_id)?;
        validate_quantity("quantity", line.quantity)?;
        if let Some(price) = line.unit_price_cents {
            validate_non_negative("unit_price", price)?;
        }
    }

    validate_phone("customer_phone", sale.customer_phone.as_deref())?;
    Ok(())
}

/// Turns a raw return request into a [`NewReturn`].
///
/// Fields are checked in a fixed order: user, sale, product, quantity,
/// reason. The first missing one is reported.
///
/// ## Example
/// ```rust
/// use inventa_core::types::{ReturnReason, ReturnRequest};
/// use inventa_core::validation::validate_return_request;
///
/// let request = ReturnRequest {
///     user_id: Some("u1".into()),
///     sale_id: Some("s1".into()),
///     product_id: Some("p1".into()),
///     quantity: Some(2),
///     reason: Some(ReturnReason::Defective),
///     description: None,
/// };
/// let valid = validate_return_request(&request).unwrap();
/// assert_eq!(valid.quantity, 2);
/// ```
pub fn validate_return_request(request: &ReturnRequest) -> ValidationResult<NewReturn> {
    fn required(field: &str, value: &Option<String>) -> ValidationResult<String> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(ValidationError::Required {
                field: field.to_string(),
            }),
        }
    }

    let user_id = required("user_id", &request.user_id)?;
    let sale_id = required("sale_id", &request.sale_id)?;
    let product_id = required("product_id", &request.product_id)?;

    let quantity = request.quantity.ok_or_else(|| ValidationError::Required {
        field: "quantity".to_string(),
    })?;
    validate_quantity("quantity", quantity)?;

    let reason = request.reason.ok_or_else(|| ValidationError::Required {
        field: "reason".to_string(),
    })?;

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(NewReturn {
        user_id,
        sale_id,
        product_id,
        quantity,
        reason,
        description,
    })
}

/// Validates a new category.
pub fn validate_new_category(category: &NewCategory) -> ValidationResult<()> {
    validate_name("name", &category.name)
}

/// Validates a new supplier.
pub fn validate_new_supplier(supplier: &NewSupplier) -> ValidationResult<()> {
    validate_name("name", &supplier.name)?;
    validate_phone("phone", supplier.phone.as_deref())?;
    validate_email(supplier.email.as_deref())
}

/// Validates a new product (references are checked by the database layer).
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_non_negative("purchase_price", product.purchase_price_cents)?;
    validate_non_negative("sale_price", product.sale_price_cents)?;
    validate_non_negative("stock", product.stock)?;
    if let Some(minimum) = product.stock_minimum {
        validate_non_negative("stock_minimum", minimum)?;
    }
    validate_required("category_id", &product.category_id)
}

/// Validates the fields present in a product update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    if let Some(price) = update.purchase_price_cents {
        validate_non_negative("purchase_price", price)?;
    }
    if let Some(price) = update.sale_price_cents {
        validate_non_negative("sale_price", price)?;
    }
    if let Some(stock) = update.stock {
        validate_non_negative("stock", stock)?;
    }
    if let Some(minimum) = update.stock_minimum {
        validate_non_negative("stock_minimum", minimum)?;
    }
    if let Some(category_id) = &update.category_id {
        validate_required("category_id", category_id)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewSaleLine, ReturnReason};

    fn full_request() -> ReturnRequest {
        ReturnRequest {
            user_id: Some("user-1".into()),
            sale_id: Some("sale-1".into()),
            product_id: Some("prod-1".into()),
            quantity: Some(1),
            reason: Some(ReturnReason::Exchange),
            description: Some("  wrong size ".into()),
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Beverages").is_ok());
        assert!(matches!(
            validate_name("name", "   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", "A"),
            Err(ValidationError::TooShort { min: 2, .. })
        ));
        assert!(validate_name("name", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("")).is_ok());
        assert!(validate_email(Some("sales@acme.com")).is_ok());
        assert!(validate_email(Some("sales@acme")).is_err());
        assert!(validate_email(Some("@acme.com")).is_err());
        assert!(validate_email(Some("a@b@c.com")).is_err());
    }

    #[test]
    fn test_validate_new_sale() {
        let empty = NewSale::new("user-1", vec![]);
        assert!(matches!(validate_new_sale(&empty), Err(CoreError::EmptySale)));

        let zero_qty = NewSale::new("user-1", vec![NewSaleLine::new("p1", 0)]);
        assert!(matches!(
            validate_new_sale(&zero_qty),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        let negative_price =
            NewSale::new("user-1", vec![NewSaleLine::new("p1", 1).with_price(-1)]);
        assert!(validate_new_sale(&negative_price).is_err());

        let no_user = NewSale::new(" ", vec![NewSaleLine::new("p1", 1)]);
        assert!(validate_new_sale(&no_user).is_err());

        let free_item = NewSale::new("user-1", vec![NewSaleLine::new("p1", 1).with_price(0)]);
        assert!(validate_new_sale(&free_item).is_ok());
    }

    #[test]
    fn test_return_request_reports_first_missing_field() {
        let mut request = full_request();
        request.sale_id = None;
        request.quantity = None;
        let err = validate_return_request(&request).unwrap_err();
        assert_eq!(err.to_string(), "sale_id is required");

        let mut request = full_request();
        request.reason = None;
        let err = validate_return_request(&request).unwrap_err();
        assert_eq!(err.to_string(), "reason is required");
    }

    #[test]
    fn test_return_request_trims_and_checks_quantity() {
        let valid = validate_return_request(&full_request()).unwrap();
        assert_eq!(valid.description.as_deref(), Some("wrong size"));

        let mut request = full_request();
        request.quantity = Some(0);
        assert!(matches!(
            validate_return_request(&request),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_new_product() {
        let product = NewProduct {
            name: "Widget".into(),
            purchase_price_cents: 500,
            sale_price_cents: 1000,
            stock: 10,
            category_id: "cat-1".into(),
            ..Default::default()
        };
        assert!(validate_new_product(&product).is_ok());

        let negative_stock = NewProduct {
            stock: -1,
            ..product.clone()
        };
        assert!(validate_new_product(&negative_stock).is_err());

        let no_category = NewProduct {
            category_id: String::new(),
            ..product
        };
        assert!(validate_new_product(&no_category).is_err());
    }
}
