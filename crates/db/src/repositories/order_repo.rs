//! Repository for the `orders` and `order_items` tables.

use sqlx::PgPool;
use shopfloor_core::types::DbId;

use crate::models::order::{Order, OrderItem, UpsertOrder, UpsertOrderItem};

const ORDER_COLUMNS: &str = "id, shopify_order_id, order_number, customer_name, customer_email, \
    total_price, financial_status, fulfillment_status, ordered_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, shopify_line_item_id, title, variant_title, sku, \
    quantity, price, properties, product_category, specs, imported_at, created_at, updated_at";

/// Provides sync upserts and reads for orders and their line items.
pub struct OrderRepo;

impl OrderRepo {
    // -----------------------------------------------------------------------
    // Sync
    // -----------------------------------------------------------------------

    /// Upsert an order and its line items in one transaction.
    ///
    /// Existing rows are matched on storefront id. Classification and specs
    /// of an existing line item are left untouched: they are derived once.
    pub async fn upsert_with_items(
        pool: &PgPool,
        order: &UpsertOrder,
        items: &[UpsertOrderItem],
    ) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO orders
                (shopify_order_id, order_number, customer_name, customer_email,
                 total_price, financial_status, fulfillment_status, ordered_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT ON CONSTRAINT uq_orders_shopify_id DO UPDATE SET
                order_number = EXCLUDED.order_number,
                customer_name = EXCLUDED.customer_name,
                customer_email = EXCLUDED.customer_email,
                total_price = EXCLUDED.total_price,
                financial_status = EXCLUDED.financial_status,
                fulfillment_status = EXCLUDED.fulfillment_status,
                ordered_at = EXCLUDED.ordered_at
             RETURNING {ORDER_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, Order>(&query)
            .bind(order.shopify_order_id)
            .bind(&order.order_number)
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(order.total_price)
            .bind(&order.financial_status)
            .bind(&order.fulfillment_status)
            .bind(order.ordered_at)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items
                (order_id, shopify_line_item_id, title, variant_title, sku, quantity,
                 price, properties, product_category, specs)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT ON CONSTRAINT uq_order_items_shopify_line_item_id DO UPDATE SET
                title = EXCLUDED.title,
                variant_title = EXCLUDED.variant_title,
                sku = EXCLUDED.sku,
                quantity = EXCLUDED.quantity,
                price = EXCLUDED.price,
                properties = EXCLUDED.properties
             RETURNING {ITEM_COLUMNS}"
        );
        let mut stored_items = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(stored.id)
                .bind(item.shopify_line_item_id)
                .bind(&item.title)
                .bind(&item.variant_title)
                .bind(&item.sku)
                .bind(item.quantity)
                .bind(item.price)
                .bind(&item.properties)
                .bind(&item.product_category)
                .bind(&item.specs)
                .fetch_one(&mut *tx)
                .await?;
            stored_items.push(row);
        }

        tx.commit().await?;
        Ok((stored, stored_items))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List orders newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             ORDER BY ordered_at DESC NULLS LAST, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn items_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_item(pool: &PgPool, id: DbId) -> Result<Option<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = $1");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count how many of `ids` exist.
    pub async fn count_existing_items(pool: &PgPool, ids: &[DbId]) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(pool)
            .await
    }
}
