//! Wishlist queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use cartwheel_core::catalog::Product;
use cartwheel_core::wishlist::{Wishlist, WishlistItem};
use cartwheel_core::{ProductId, UserId, WishlistId, WishlistItemId};

use super::carts::JOINED_PRODUCT_COLUMNS;
use super::{RepositoryError, map_constraint};

#[derive(sqlx::FromRow)]
struct WishlistRow {
    id: WishlistId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    item_id: WishlistItemId,
    wishlist_id: WishlistId,
    item_created_at: DateTime<Utc>,
    item_updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: Product,
}

/// Load the user's wishlist, creating it if needed, and lock its row.
pub async fn get_or_create(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Wishlist, RepositoryError> {
    sqlx::query("INSERT INTO wishlists (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(map_constraint)?;

    let wishlist = sqlx::query_as::<_, WishlistRow>(
        "SELECT id, user_id, created_at, updated_at FROM wishlists WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let entries = sqlx::query_as::<_, EntryRow>(&format!(
        r"
        SELECT wi.id AS item_id, wi.wishlist_id,
               wi.created_at AS item_created_at, wi.updated_at AS item_updated_at,
               {JOINED_PRODUCT_COLUMNS}
        FROM wishlist_items wi
        JOIN products p ON p.id = wi.product_id
        WHERE wi.wishlist_id = $1
        ORDER BY wi.id
        "
    ))
    .bind(wishlist.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Wishlist {
        id: wishlist.id,
        user_id: wishlist.user_id,
        items: entries
            .into_iter()
            .map(|entry| WishlistItem {
                id: entry.item_id,
                wishlist_id: entry.wishlist_id,
                product: entry.product,
                created_at: entry.item_created_at,
                updated_at: entry.item_updated_at,
            })
            .collect(),
        created_at: wishlist.created_at,
        updated_at: wishlist.updated_at,
    })
}

pub async fn insert_item(
    conn: &mut PgConnection,
    wishlist_id: WishlistId,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO wishlist_items (wishlist_id, product_id) VALUES ($1, $2)")
        .bind(wishlist_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await
        .map_err(map_constraint)?;
    touch(conn, wishlist_id).await
}

pub async fn delete_item(
    conn: &mut PgConnection,
    wishlist_id: WishlistId,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let result =
        sqlx::query("DELETE FROM wishlist_items WHERE wishlist_id = $1 AND product_id = $2")
            .bind(wishlist_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    touch(conn, wishlist_id).await?;
    Ok(true)
}

pub async fn clear(conn: &mut PgConnection, wishlist_id: WishlistId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM wishlist_items WHERE wishlist_id = $1")
        .bind(wishlist_id)
        .execute(&mut *conn)
        .await?;
    touch(conn, wishlist_id).await
}

async fn touch(conn: &mut PgConnection, wishlist_id: WishlistId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE wishlists SET updated_at = now() WHERE id = $1")
        .bind(wishlist_id)
        .execute(conn)
        .await?;
    Ok(())
}
