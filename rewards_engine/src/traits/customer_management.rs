use rwd_common::{Millime, Points};
use thiserror::Error;

use crate::{
    db_types::{Customer, TierLevel},
    sqlbuild::QueryBuildError,
    traits::StoreError,
};

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("{0}")]
    StoreError(#[from] StoreError),
    #[error("User error constructing query: {0}")]
    QueryError(#[from] QueryBuildError),
    #[error("The requested customer id {0} does not exist")]
    CustomerNotFound(i64),
    #[error("Point balance for customer {0} cannot go negative")]
    InsufficientPoints(i64),
}

/// Queries and single-statement bookkeeping updates over customer records.
///
/// Every method here is one statement; none of them needs a transaction. The multi-statement flows
/// (onboarding, OTP issuance, subscription upgrades, order confirmation) live on
/// [`RewardsDatabase`](crate::traits::RewardsDatabase).
#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    async fn fetch_customer_by_id(&self, id: i64) -> Result<Option<Customer>, CustomerApiError>;

    async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerApiError>;

    async fn fetch_customer_by_referral_code(&self, code: &str) -> Result<Option<Customer>, CustomerApiError>;

    /// Applies a point delta (positive to earn, negative to redeem) and returns the updated record.
    ///
    /// The store enforces that the balance never goes negative as a result of a single update; a
    /// violating delta fails with [`CustomerApiError::InsufficientPoints`] and changes nothing.
    async fn update_points(&self, id: i64, delta: Points) -> Result<Customer, CustomerApiError>;

    /// Adds `amount` to the customer's spending counter for the current month.
    async fn update_monthly_spending(&self, id: i64, amount: Millime) -> Result<Customer, CustomerApiError>;

    /// Zeroes `used_this_month` for every customer (the start-of-month sweep). Returns the number
    /// of rows affected.
    async fn reset_monthly_spending(&self) -> Result<u64, CustomerApiError>;

    /// Sets the membership tier. Only subscription creation calls this; tier transitions have no
    /// other trigger.
    async fn update_level(&self, id: i64, level: TierLevel) -> Result<Customer, CustomerApiError>;

    /// Flags the phone as verified and stamps `last_login`. Returns the number of rows affected,
    /// which is zero when no customer exists for the phone yet (first-time sign-up).
    async fn mark_phone_verified(&self, phone: &str) -> Result<u64, CustomerApiError>;

    /// True when fewer than three codes were issued for this phone within the trailing 60 seconds.
    /// Callers must check this before issuing a new code.
    async fn can_resend_otp(&self, phone: &str) -> Result<bool, CustomerApiError>;
}
