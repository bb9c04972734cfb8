//! Product queries.

use sqlx::PgConnection;

use cartwheel_core::catalog::{Product, ProductFields};
use cartwheel_core::{ProductCode, ProductId};

use super::{RepositoryError, map_constraint};

pub(crate) const PRODUCT_COLUMNS: &str = "id, code, name, description, image, category, price, \
     quantity, internal_reference, shell_id, inventory_status, rating, created_at, updated_at";

pub async fn list(conn: &mut PgConnection) -> Result<Vec<Product>, RepositoryError> {
    let products =
        sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(conn)
            .await?;
    Ok(products)
}

pub async fn get(conn: &mut PgConnection, id: ProductId) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

pub async fn code_exists(
    conn: &mut PgConnection,
    code: &ProductCode,
) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE code = $1)")
        .bind(code)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Insert a product under `code`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the code is already taken.
pub async fn insert(
    conn: &mut PgConnection,
    code: &ProductCode,
    fields: &ProductFields,
) -> Result<Product, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r"
        INSERT INTO products (code, name, description, image, category, price, quantity,
                              internal_reference, shell_id, inventory_status, rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(code)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.image)
    .bind(&fields.category)
    .bind(fields.price)
    .bind(fields.quantity)
    .bind(&fields.internal_reference)
    .bind(fields.shell_id)
    .bind(fields.inventory_status)
    .bind(fields.rating)
    .fetch_one(conn)
    .await
    .map_err(map_constraint)?;
    Ok(product)
}

/// Write back every mutable column. `code` is not touched.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the row is gone.
pub async fn update(conn: &mut PgConnection, product: &Product) -> Result<Product, RepositoryError> {
    sqlx::query_as::<_, Product>(&format!(
        r"
        UPDATE products
        SET name = $2, description = $3, image = $4, category = $5, price = $6,
            quantity = $7, internal_reference = $8, shell_id = $9,
            inventory_status = $10, rating = $11, updated_at = now()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.image)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.quantity)
    .bind(&product.internal_reference)
    .bind(product.shell_id)
    .bind(product.inventory_status)
    .bind(product.rating)
    .fetch_optional(conn)
    .await
    .map_err(map_constraint)?
    .ok_or(RepositoryError::NotFound)
}

/// Delete a product.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if cart or wishlist rows still
/// reference it.
pub async fn delete(conn: &mut PgConnection, id: ProductId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(map_constraint)?;
    Ok(result.rows_affected() > 0)
}
