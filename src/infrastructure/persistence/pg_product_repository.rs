//! PostgreSQL implementation of product repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::entities::{Batch, OrderLine, Product};
use crate::domain::repositories::{ProductChange, ProductRepository};
use crate::error::AppError;

#[derive(FromRow)]
struct BatchRow {
    id: i64,
    reference: String,
    sku: String,
    purchased_quantity: i64,
    eta: Option<NaiveDate>,
}

#[derive(FromRow)]
struct AllocationRow {
    batch_id: i64,
    order_id: String,
    sku: String,
    qty: i64,
}

/// PostgreSQL repository for product aggregates.
///
/// A product spans three tables: `products` (SKU and version), `batches` and
/// `allocations`. Allocation rows carry a `position` so batches come back with
/// their lines in insertion order.
pub struct PgProductRepository {
    pool: Arc<PgPool>,
}

impl PgProductRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn load(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM products WHERE sku = $1")
                .bind(sku)
                .fetch_optional(self.pool.as_ref())
                .await?;

        let Some(version) = version else {
            return Ok(None);
        };

        let batch_rows: Vec<BatchRow> = sqlx::query_as(
            r#"
            SELECT id, reference, sku, purchased_quantity, eta
            FROM batches
            WHERE sku = $1
            ORDER BY id
            "#,
        )
        .bind(sku)
        .fetch_all(self.pool.as_ref())
        .await?;

        let allocation_rows: Vec<AllocationRow> = sqlx::query_as(
            r#"
            SELECT a.batch_id, a.order_id, a.sku, a.qty
            FROM allocations a
            JOIN batches b ON b.id = a.batch_id
            WHERE b.sku = $1
            ORDER BY a.batch_id, a.position
            "#,
        )
        .bind(sku)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut lines: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in allocation_rows {
            lines
                .entry(row.batch_id)
                .or_default()
                .push(OrderLine::new(row.order_id, row.sku, row.qty));
        }

        let batches = batch_rows
            .into_iter()
            .map(|row| {
                let allocations = lines.remove(&row.id).unwrap_or_default();
                Batch::restore(
                    row.reference,
                    row.sku,
                    row.purchased_quantity,
                    row.eta,
                    allocations,
                )
            })
            .collect();

        Ok(Some(Product::restore(sku, batches, version)))
    }

    async fn write_product(
        tx: &mut Transaction<'_, Postgres>,
        change: &ProductChange,
    ) -> Result<(), AppError> {
        let product = &change.product;

        let written = match change.expected_version {
            None => sqlx::query(
                "INSERT INTO products (sku, version) VALUES ($1, $2) ON CONFLICT (sku) DO NOTHING",
            )
            .bind(&product.sku)
            .bind(product.version())
            .execute(&mut **tx)
            .await?
            .rows_affected(),
            Some(expected) => {
                sqlx::query("UPDATE products SET version = $2 WHERE sku = $1 AND version = $3")
                    .bind(&product.sku)
                    .bind(product.version())
                    .bind(expected)
                    .execute(&mut **tx)
                    .await?
                    .rows_affected()
            }
        };

        if written == 0 {
            return Err(AppError::conflict(
                "Product was modified concurrently",
                json!({ "sku": product.sku, "expected_version": change.expected_version }),
            ));
        }

        for batch in product.batches() {
            Self::write_batch(tx, batch).await?;
        }

        Ok(())
    }

    async fn write_batch(
        tx: &mut Transaction<'_, Postgres>,
        batch: &Batch,
    ) -> Result<(), AppError> {
        let batch_id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO batches (reference, sku, purchased_quantity, eta)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (reference) DO UPDATE
                SET purchased_quantity = EXCLUDED.purchased_quantity,
                    eta = EXCLUDED.eta
                WHERE batches.sku = EXCLUDED.sku
            RETURNING id
            "#,
        )
        .bind(&batch.reference)
        .bind(&batch.sku)
        .bind(batch.purchased_quantity())
        .bind(batch.eta)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(batch_id) = batch_id else {
            return Err(AppError::conflict(
                "Batch reference belongs to another product",
                json!({ "reference": batch.reference, "sku": batch.sku }),
            ));
        };

        sqlx::query("DELETE FROM allocations WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&mut **tx)
            .await?;

        for (position, line) in batch.allocations().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO allocations (batch_id, order_id, sku, qty, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(batch_id)
            .bind(&line.order_id)
            .bind(&line.sku)
            .bind(line.qty)
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        self.load(sku).await
    }

    async fn find_by_batch_reference(&self, reference: &str) -> Result<Option<Product>, AppError> {
        let sku: Option<String> = sqlx::query_scalar("SELECT sku FROM batches WHERE reference = $1")
            .bind(reference)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match sku {
            Some(sku) => self.load(&sku).await,
            None => Ok(None),
        }
    }

    async fn save_all(&self, changes: Vec<ProductChange>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for change in &changes {
            Self::write_product(&mut tx, change).await?;
        }

        tx.commit().await?;
        debug!(products = changes.len(), "Products saved");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
