use log::debug;
use rwd_common::Millime;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    sqlbuild::{InsertQuery, SelectQuery, UpdateQuery},
    traits::RewardsDatabaseError,
};

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, RewardsDatabaseError> {
    let q = InsertQuery::new("orders")
        .value("customer_id", order.customer_id)
        .value("merchant_id", order.merchant_id)
        .value("order_qr_code", order.order_qr_code)
        .value("merchant_qr_code", order.merchant_qr_code)
        .value("currency", order.currency)
        .value("expires_at", order.expires_at)
        .returning_all()
        .build()?;
    let order = q.fetch_one::<Order>(conn).await?;
    debug!("📝️ New order #{} opened for customer {}", order.id, order.customer_id);
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, RewardsDatabaseError> {
    let q = SelectQuery::new("orders").filter_eq("id", id).build()?;
    let order = q.fetch_optional(conn).await?;
    Ok(order)
}

/// Resolves a customer-facing QR code at the till. A code only resolves while its order is still
/// `pending` and inside the expiry window, so stale codes fall out of the handshake here rather
/// than at confirmation time.
pub async fn fetch_pending_by_qr_code(
    order_qr_code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, RewardsDatabaseError> {
    let q = SelectQuery::new("orders")
        .filter_eq("order_qr_code", order_qr_code)
        .filter_eq("status", OrderStatusType::Pending)
        .filter_raw("unixepoch(expires_at) > unixepoch(CURRENT_TIMESTAMP)")
        .build()?;
    let order = q.fetch_optional(conn).await?;
    Ok(order)
}

/// The guarded state transition at the heart of confirmation. The `pending` and not-yet-expired
/// predicates ride along in the UPDATE itself, so a lost race (another till confirmed first, or the
/// sweep expired the order) comes back as `None` instead of clobbering a terminal state.
pub async fn confirm_pending(
    id: i64,
    total_amount: Millime,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, RewardsDatabaseError> {
    let q = UpdateQuery::new("orders")
        .set("status", OrderStatusType::Confirmed)
        .set("total_amount", total_amount)
        .set_raw("confirmed_at = CURRENT_TIMESTAMP")
        .touch()
        .filter_eq("id", id)
        .filter_eq("status", OrderStatusType::Pending)
        .filter_raw("unixepoch(expires_at) > unixepoch(CURRENT_TIMESTAMP)")
        .returning_all()
        .build()?;
    let order = q.fetch_optional(conn).await?;
    Ok(order)
}

pub async fn insert_order_item(
    order_id: i64,
    item: NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, RewardsDatabaseError> {
    let q = InsertQuery::new("order_items")
        .value("order_id", order_id)
        .value("name", item.name)
        .value("price", item.price)
        .value("quantity", item.quantity)
        .returning_all()
        .build()?;
    let item = q.fetch_one(conn).await?;
    Ok(item)
}

pub async fn items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, RewardsDatabaseError> {
    let q = SelectQuery::new("order_items").filter_eq("order_id", order_id).order_by("id ASC").build()?;
    let items = q.fetch_all(conn).await?;
    Ok(items)
}

/// Sweeps every overdue `pending` order into `expired` and returns the swept rows.
pub async fn expire_overdue(conn: &mut SqliteConnection) -> Result<Vec<Order>, RewardsDatabaseError> {
    let q = UpdateQuery::new("orders")
        .set("status", OrderStatusType::Expired)
        .touch()
        .filter_eq("status", OrderStatusType::Pending)
        .filter_raw("unixepoch(expires_at) <= unixepoch(CURRENT_TIMESTAMP)")
        .returning_all()
        .build()?;
    let expired = q.fetch_all::<Order>(conn).await?;
    if !expired.is_empty() {
        debug!("🗑️ {} overdue orders moved to expired", expired.len());
    }
    Ok(expired)
}
