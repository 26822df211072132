use log::debug;
use rwd_common::{Millime, Points};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Customer, NewCustomer, TierLevel},
    sqlbuild::{InsertQuery, SelectQuery, UpdateQuery},
    traits::{CustomerApiError, RewardsDatabaseError, StoreError},
};

pub async fn insert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<Customer, RewardsDatabaseError> {
    let q = InsertQuery::new("customers")
        .value("phone", customer.phone)
        .value("first_name", customer.first_name)
        .value("last_name", customer.last_name)
        .value("referral_code", customer.referral_code)
        .value("referred_by", customer.referred_by)
        .value("points", customer.points)
        .value("monthly_limit", customer.monthly_limit)
        .returning_all()
        .build()?;
    let customer = q.fetch_one::<Customer>(conn).await?;
    debug!("📝️ New customer #{} registered with phone {}", customer.id, customer.phone);
    Ok(customer)
}

pub async fn fetch_customer_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, CustomerApiError> {
    let q = SelectQuery::new("customers").filter_eq("id", id).build()?;
    let customer = q.fetch_optional(conn).await?;
    Ok(customer)
}

pub async fn fetch_customer_by_phone(
    phone: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, CustomerApiError> {
    let q = SelectQuery::new("customers").filter_eq("phone", phone).build()?;
    let customer = q.fetch_optional(conn).await?;
    Ok(customer)
}

pub async fn fetch_customer_by_referral_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, CustomerApiError> {
    let q = SelectQuery::new("customers").filter_eq("referral_code", code).build()?;
    let customer = q.fetch_optional(conn).await?;
    Ok(customer)
}

/// Applies a point delta in place. The `points >= 0` check constraint on the table is what turns an
/// over-redemption into [`CustomerApiError::InsufficientPoints`], so the balance test and the write
/// are a single atomic statement.
pub async fn adjust_points(id: i64, delta: Points, conn: &mut SqliteConnection) -> Result<Customer, CustomerApiError> {
    let q = UpdateQuery::new("customers")
        .set_expr("points = points + {}", delta)
        .touch()
        .filter_eq("id", id)
        .returning_all()
        .build()?;
    let customer = match q.fetch_optional::<Customer>(conn).await {
        Ok(c) => c,
        Err(StoreError::ValidationFailed(_)) => return Err(CustomerApiError::InsufficientPoints(id)),
        Err(e) => return Err(e.into()),
    };
    customer.ok_or(CustomerApiError::CustomerNotFound(id))
}

pub async fn add_monthly_spending(
    id: i64,
    amount: Millime,
    conn: &mut SqliteConnection,
) -> Result<Customer, CustomerApiError> {
    let q = UpdateQuery::new("customers")
        .set_expr("used_this_month = used_this_month + {}", amount)
        .touch()
        .filter_eq("id", id)
        .returning_all()
        .build()?;
    let customer = q.fetch_optional::<Customer>(conn).await?;
    customer.ok_or(CustomerApiError::CustomerNotFound(id))
}

/// The start-of-month sweep. Every customer's spending counter goes back to zero.
pub async fn reset_monthly_spending(conn: &mut SqliteConnection) -> Result<u64, CustomerApiError> {
    let q = UpdateQuery::new("customers").set("used_this_month", Millime::default()).touch().build()?;
    let result = q.execute(conn).await?;
    Ok(result.rows_affected())
}

/// Moves the customer onto `level`. The monthly spending cap tracks the tier, so both columns move
/// together.
pub async fn update_level(id: i64, level: TierLevel, conn: &mut SqliteConnection) -> Result<Customer, CustomerApiError> {
    let q = UpdateQuery::new("customers")
        .set("level", level)
        .set("monthly_limit", level.monthly_limit())
        .touch()
        .filter_eq("id", id)
        .returning_all()
        .build()?;
    let customer = q.fetch_optional::<Customer>(conn).await?;
    customer.ok_or(CustomerApiError::CustomerNotFound(id))
}

/// Zero rows affected is not an error here. A first-time sign-up verifies the phone before the
/// customer record exists.
pub async fn mark_phone_verified(phone: &str, conn: &mut SqliteConnection) -> Result<u64, CustomerApiError> {
    let q = UpdateQuery::new("customers")
        .set("phone_verified", true)
        .set_raw("last_login = CURRENT_TIMESTAMP")
        .touch()
        .filter_eq("phone", phone)
        .build()?;
    let result = q.execute(conn).await?;
    Ok(result.rows_affected())
}
