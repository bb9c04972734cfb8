//! Cart queries.
//!
//! The cart row is get-or-created and locked `FOR UPDATE`, so concurrent
//! requests on one cart run one after the other.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use cartwheel_core::cart::{Cart, CartItem, LineChange};
use cartwheel_core::catalog::Product;
use cartwheel_core::{CartId, CartItemId, ProductId, UserId};

use super::{RepositoryError, map_constraint};

/// Product columns qualified with the `p` alias, for joins.
pub(crate) const JOINED_PRODUCT_COLUMNS: &str = "p.id, p.code, p.name, p.description, p.image, \
     p.category, p.price, p.quantity, p.internal_reference, p.shell_id, p.inventory_status, \
     p.rating, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineRow {
    item_id: CartItemId,
    cart_id: CartId,
    item_quantity: i32,
    item_created_at: DateTime<Utc>,
    item_updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: Product,
}

/// Load the user's cart, creating it if needed, and lock its row.
pub async fn get_or_create(conn: &mut PgConnection, user_id: UserId) -> Result<Cart, RepositoryError> {
    sqlx::query("INSERT INTO shopping_carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(map_constraint)?;

    let cart = sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id, created_at, updated_at FROM shopping_carts WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let lines = sqlx::query_as::<_, LineRow>(&format!(
        r"
        SELECT ci.id AS item_id, ci.cart_id, ci.quantity AS item_quantity,
               ci.created_at AS item_created_at, ci.updated_at AS item_updated_at,
               {JOINED_PRODUCT_COLUMNS}
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        "
    ))
    .bind(cart.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Cart {
        id: cart.id,
        user_id: cart.user_id,
        items: lines
            .into_iter()
            .map(|line| CartItem {
                id: line.item_id,
                cart_id: line.cart_id,
                product: line.product,
                quantity: line.item_quantity,
                created_at: line.item_created_at,
                updated_at: line.item_updated_at,
            })
            .collect(),
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    })
}

/// Apply a planned line change.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a second line for the same product
/// would be created, `RepositoryError::NotFound` if the line to update is gone.
pub async fn apply(
    conn: &mut PgConnection,
    cart_id: CartId,
    change: LineChange,
) -> Result<(), RepositoryError> {
    match change {
        LineChange::Insert {
            product_id,
            quantity,
        } => {
            sqlx::query(
                "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(cart_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await
            .map_err(map_constraint)?;
        }
        LineChange::SetQuantity { item_id, quantity } => {
            let result = sqlx::query(
                "UPDATE cart_items SET quantity = $3, updated_at = now() WHERE id = $1 AND cart_id = $2",
            )
            .bind(item_id)
            .bind(cart_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await
            .map_err(map_constraint)?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }
    }
    touch(conn, cart_id).await
}

pub async fn delete_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    touch(conn, cart_id).await?;
    Ok(true)
}

pub async fn clear(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    touch(conn, cart_id).await
}

async fn touch(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shopping_carts SET updated_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}
