use rwd_common::Millime;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem},
    helpers,
    traits::{RewardsDatabase, RewardsDatabaseError},
};

/// The QR order handshake: open a pending order, resolve a scanned code, confirm with line items.
#[derive(Debug, Clone)]
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> OrderFlowApi<B>
where B: RewardsDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Opens a pending order with a freshly generated QR code pair and the default expiry window.
    pub async fn new_order(&self, customer_id: i64, merchant_id: i64) -> Result<Order, RewardsDatabaseError> {
        let (order_qr_code, merchant_qr_code) = helpers::qr_code_pair();
        let order = NewOrder::new(customer_id, merchant_id, order_qr_code, merchant_qr_code);
        self.db.create_order(order).await
    }

    /// Resolves a scanned customer QR code. Only pending, unexpired orders resolve.
    pub async fn order_by_qr_code(&self, code: &str) -> Result<Option<Order>, RewardsDatabaseError> {
        self.db.fetch_order_by_code(code).await
    }

    pub async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RewardsDatabaseError> {
        self.db.fetch_order_items(order_id).await
    }

    /// Confirms a pending order with its final total and line items. The inputs are validated up
    /// front; the store then applies the state transition and the item inserts atomically.
    pub async fn confirm_order(
        &self,
        order_id: i64,
        total_amount: Millime,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, RewardsDatabaseError> {
        if !total_amount.is_positive() {
            return Err(RewardsDatabaseError::InvalidAmount(total_amount));
        }
        if items.is_empty() {
            return Err(RewardsDatabaseError::EmptyItemList);
        }
        for item in &items {
            if item.name.trim().is_empty() {
                return Err(RewardsDatabaseError::InvalidItem(item.name.clone(), "name is empty".to_string()));
            }
            if item.quantity < 1 {
                return Err(RewardsDatabaseError::InvalidItem(
                    item.name.clone(),
                    format!("quantity must be at least 1, got {}", item.quantity),
                ));
            }
            if item.price.value() < 0 {
                return Err(RewardsDatabaseError::InvalidItem(
                    item.name.clone(),
                    format!("price cannot be negative, got {}", item.price),
                ));
            }
        }
        self.db.confirm_order(order_id, total_amount, items).await
    }

    /// Sweeps overdue pending orders into the expired state and returns them.
    pub async fn expire_old_orders(&self) -> Result<Vec<Order>, RewardsDatabaseError> {
        self.db.expire_old_orders().await
    }
}
