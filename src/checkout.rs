//! Order placement: turns a cart into a priced order.
//!
//! The cart is claimed, validated, converted into an order with snapshotted
//! item prices, and deleted inside a single transaction. Order hooks only run
//! once that transaction has committed.

use chrono::Utc;
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::error::AppError;
use crate::models::{Order, OrderDetail, OrderLine, PaymentStatus, User};
use crate::money::Money;
use crate::notify::OrderHooks;
use crate::routes::customers::customer_for_user;

/// A cart item paired with its product's price at the moment it was read.
#[derive(Debug, FromRow)]
struct PricedItem {
    product_id: i64,
    quantity: i64,
    price: Money,
}

pub async fn place_order(
    db: &SqlitePool,
    hooks: &OrderHooks,
    user: &User,
    cart_id: &str,
) -> Result<OrderDetail, AppError> {
    let mut tx = db.begin().await?;

    // No-op write: takes the write lock before anything is read, so a
    // concurrent placement for the same cart waits and then finds it gone.
    let claimed = sqlx::query("UPDATE carts SET created_at = created_at WHERE id = ?")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        return Err(AppError::NotFound("cart not found"));
    }

    let items: Vec<PricedItem> = sqlx::query_as(
        r#"
        SELECT ci.product_id, ci.quantity, p.price
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = ?
        ORDER BY ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *tx)
    .await?;

    if items.is_empty() {
        return Err(AppError::Invalid("cart is empty".to_string()));
    }

    let customer = customer_for_user(&mut *tx, &user.id).await?;

    let order: Order = sqlx::query_as(
        "INSERT INTO orders (customer_id, placed_at, payment_status) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(customer.id)
    .bind(Utc::now())
    .bind(PaymentStatus::Pending)
    .fetch_one(&mut *tx)
    .await?;

    let mut insert = QueryBuilder::<Sqlite>::new(
        "INSERT INTO order_items (order_id, product_id, quantity, price) ",
    );
    insert.push_values(&items, |mut row, item| {
        row.push_bind(order.id)
            .push_bind(item.product_id)
            .push_bind(item.quantity)
            .push_bind(item.price);
    });
    insert.build().execute(&mut *tx).await?;

    sqlx::query("DELETE FROM carts WHERE id = ?")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

    let lines = fetch_order_lines(&mut *tx, order.id).await?;

    tx.commit().await?;

    let detail = OrderDetail::new(order, lines);
    tracing::info!(
        order_id = detail.id,
        customer_id = detail.customer_id,
        items = detail.items.len(),
        "order placed from cart {cart_id}"
    );

    hooks.dispatch(&detail);

    Ok(detail)
}

pub async fn fetch_order_lines<'e, E>(
    executor: E,
    order_id: i64,
) -> Result<Vec<OrderLine>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(
        r#"
        SELECT oi.id, oi.product_id, p.title AS product_title, oi.quantity, oi.price
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ?
        ORDER BY oi.id
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await
}
