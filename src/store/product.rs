use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::product::{DailyRecord, DailyRecordRow, NewProduct, Product, ProductRow};

/// All products of one user, in upload order.
#[instrument(skip(pool))]
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Product>, AppError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, product_code, product_name, opening_inventory
         FROM products
         WHERE user_id = $1
         ORDER BY position, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let records = sqlx::query_as::<_, DailyRecordRow>(
        "SELECT product_id, day, procurement_qty, procurement_price, sales_qty, sales_price
         FROM daily_records
         WHERE product_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_product: HashMap<i64, Vec<DailyRecord>> = HashMap::new();
    for record in records {
        by_product.entry(record.product_id).or_default().push(record.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| Product {
            id: row.id,
            daily_data: by_product.remove(&row.id).unwrap_or_default(),
            product_id: row.product_code,
            product_name: row.product_name,
            opening_inventory: row.opening_inventory,
        })
        .collect())
}

/// Replaces the user's whole product set in one transaction.
#[instrument(skip(pool, products), fields(count = products.len()))]
pub async fn replace_for_user(
    pool: &PgPool,
    user_id: i64,
    products: Vec<NewProduct>,
) -> Result<Vec<Product>, AppError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM products WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut stored = Vec::with_capacity(products.len());
    for (position, product) in products.into_iter().enumerate() {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (user_id, position, product_code, product_name, opening_inventory)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(user_id)
        .bind(position as i32)
        .bind(&product.product_id)
        .bind(&product.product_name)
        .bind(product.opening_inventory)
        .fetch_one(&mut *tx)
        .await?;

        for record in &product.daily_data {
            sqlx::query(
                "INSERT INTO daily_records
                 (product_id, day, procurement_qty, procurement_price, sales_qty, sales_price)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(record.day as i32)
            .bind(record.procurement_qty)
            .bind(record.procurement_price)
            .bind(record.sales_qty)
            .bind(record.sales_price)
            .execute(&mut *tx)
            .await?;
        }

        stored.push(product.into_product(id));
    }

    tx.commit().await?;
    info!(user_id, removed, stored = stored.len(), "Replaced product set");

    Ok(stored)
}

#[instrument(skip(pool))]
pub async fn clear_for_user(pool: &PgPool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
