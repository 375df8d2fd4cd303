//! Cart repository.
//!
//! Guest carts live in `guest_cart_item` (keyed by guest token and removed
//! with their session); user carts live in `cart_item`. Both hold at most one
//! line per product, so adding an existing product sums quantities.

use async_trait::async_trait;
use sqlx::PgPool;

use footwear_core::{ProductId, SessionToken, UserId};

use super::{CartStore, RepositoryError};
use crate::models::{CartItem, CartOwner};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: ProductId,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} for product {}",
                row.quantity, row.product_id
            ))
        })?;
        Ok(Self {
            product_id: row.product_id,
            quantity,
        })
    }
}

fn quantity_param(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} out of range")))
}

/// `PostgreSQL` repository for guest and user carts.
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn cart_items(&self, owner: CartOwner) -> Result<Vec<CartItem>, RepositoryError> {
        let rows: Vec<CartItemRow> = match owner {
            CartOwner::Guest(token) => {
                sqlx::query_as(
                    r"
                    SELECT product_id, quantity
                    FROM storefront.guest_cart_item
                    WHERE guest_token = $1
                    ORDER BY created_at, product_id
                    ",
                )
                .bind(token)
                .fetch_all(&self.pool)
                .await?
            }
            CartOwner::User(user_id) => {
                sqlx::query_as(
                    r"
                    SELECT product_id, quantity
                    FROM storefront.cart_item
                    WHERE user_id = $1
                    ORDER BY created_at, product_id
                    ",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(CartItem::try_from).collect()
    }

    async fn add_cart_item(
        &self,
        owner: CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        let quantity = quantity_param(quantity)?;

        let row: CartItemRow = match owner {
            CartOwner::Guest(token) => {
                sqlx::query_as(
                    r"
                    INSERT INTO storefront.guest_cart_item AS c (guest_token, product_id, quantity)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (guest_token, product_id)
                    DO UPDATE SET quantity = c.quantity + EXCLUDED.quantity, updated_at = now()
                    RETURNING product_id, quantity
                    ",
                )
                .bind(token)
                .bind(product_id)
                .bind(quantity)
                .fetch_one(&self.pool)
                .await?
            }
            CartOwner::User(user_id) => {
                sqlx::query_as(
                    r"
                    INSERT INTO storefront.cart_item AS c (user_id, product_id, quantity)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id, product_id)
                    DO UPDATE SET quantity = c.quantity + EXCLUDED.quantity, updated_at = now()
                    RETURNING product_id, quantity
                    ",
                )
                .bind(user_id)
                .bind(product_id)
                .bind(quantity)
                .fetch_one(&self.pool)
                .await?
            }
        };

        row.try_into()
    }

    async fn transfer_guest_cart(
        &self,
        guest: SessionToken,
        user_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the guest session so two concurrent sign-ins carrying the same
        // guest cookie merge once: the second waits, then finds no lines.
        let live: Option<SessionToken> = sqlx::query_scalar(
            r"
            SELECT token
            FROM storefront.guest_session
            WHERE token = $1 AND expires_at > now()
            FOR UPDATE
            ",
        )
        .bind(guest)
        .fetch_optional(&mut *tx)
        .await?;

        if live.is_none() {
            tx.rollback().await?;
            return Ok(0);
        }

        let moved = sqlx::query(
            r"
            INSERT INTO storefront.cart_item AS c (user_id, product_id, quantity)
            SELECT $2, product_id, quantity
            FROM storefront.guest_cart_item
            WHERE guest_token = $1
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = c.quantity + EXCLUDED.quantity, updated_at = now()
            ",
        )
        .bind(guest)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM storefront.guest_cart_item WHERE guest_token = $1")
            .bind(guest)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(moved)
    }
}
