use crate::{
    db_types::{Order, OrderItem},
    traits::RewardsDatabaseError,
};

/// Read-side access to orders and their line items.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, RewardsDatabaseError>;

    /// Looks an order up by its customer-facing QR code. Only `pending`, unexpired orders match;
    /// anything else returns `None`, so a stale code scanned at the till simply fails to resolve.
    async fn fetch_order_by_code(&self, order_qr_code: &str) -> Result<Option<Order>, RewardsDatabaseError>;

    /// Line items for an order, in insertion order. Empty until the order is confirmed.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RewardsDatabaseError>;
}
