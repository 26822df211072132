use rwd_common::Millime;
use thiserror::Error;

use crate::{
    db_types::{Customer, CustomerOtp, CustomerSubscription, NewCustomer, NewOrder, NewOrderItem, NewOtp,
        NewSubscription, Order},
    sqlbuild::QueryBuildError,
    traits::{CustomerApiError, CustomerManagement, OrderManagement, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum RewardsDatabaseError {
    #[error("{0}")]
    StoreError(#[from] StoreError),
    #[error("{0}")]
    CustomerError(#[from] CustomerApiError),
    #[error("User error constructing query: {0}")]
    QueryError(#[from] QueryBuildError),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} is not pending, or has expired. Confirmation is forbidden")]
    OrderNotPending(i64),
    #[error("An order confirmation must carry at least one line item")]
    EmptyItemList,
    #[error("Line item '{0}' is invalid: {1}")]
    InvalidItem(String, String),
    #[error("Order total must be positive, got {0}")]
    InvalidAmount(Millime),
    #[error("No customer matches referral code {0}")]
    ReferralCodeNotFound(String),
}

/// This trait defines the highest level of behaviour for backends supporting the rewards engine.
///
/// This behaviour includes:
/// * Customer onboarding (with the welcome bonus already applied to the new record).
/// * The one-time-code lifecycle used to verify phone numbers.
/// * Subscription upgrades, the sole trigger for membership tier changes.
/// * The QR-code order handshake, including the confirmation transaction.
#[allow(async_fn_in_trait)]
pub trait RewardsDatabase: Clone + CustomerManagement + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Inserts a new customer record. A colliding phone number or referral code surfaces as
    /// [`StoreError::DuplicateEntry`].
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, RewardsDatabaseError>;

    /// Issues a one-time code and, in the same atomic transaction, invalidates every prior
    /// unverified code for the phone so that only the newest code can ever verify. Two concurrent
    /// issuances for one phone therefore serialize: the loser's code is already dead when it lands.
    async fn issue_otp(&self, otp: NewOtp) -> Result<CustomerOtp, RewardsDatabaseError>;

    /// Checks a code. The attempt counter is bumped first, unconditionally, so a wrong guess
    /// consumes an attempt. A code verifies only while it is unverified, unexpired and within the
    /// attempt budget; on success the row is flagged verified and returned.
    ///
    /// `None` covers wrong code, expired code and exhausted attempts alike; the caller is not told
    /// which. A `None` is an expected outcome, not a store failure.
    async fn verify_otp(&self, phone: &str, code: &str) -> Result<Option<CustomerOtp>, RewardsDatabaseError>;

    /// Records a tier subscription and, in the same transaction, moves the customer onto the
    /// subscribed tier.
    async fn create_subscription(&self, sub: NewSubscription) -> Result<CustomerSubscription, RewardsDatabaseError>;

    /// Opens a new pending order for the QR handshake.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RewardsDatabaseError>;

    /// Atomically transitions a pending order to `confirmed`, stamps the total and confirmation
    /// time, and inserts every line item, all on one connection, all or nothing. If any item
    /// insert fails the order is left exactly as it was and no items persist.
    ///
    /// Callers validate the inputs; the backend still refuses an empty item list.
    async fn confirm_order(
        &self,
        order_id: i64,
        total_amount: Millime,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, RewardsDatabaseError>;

    /// Sweeps pending orders past their hard expiry into the `expired` state and returns them.
    /// Expiry is data-level: `fetch_order_by_code` already refuses overdue orders at query time,
    /// and this sweep makes the state catch up.
    async fn expire_old_orders(&self) -> Result<Vec<Order>, RewardsDatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), RewardsDatabaseError> {
        Ok(())
    }
}
