use sqlx::SqliteConnection;

use crate::{
    db_types::{CustomerOtp, NewOtp},
    sqlbuild::{Filter, InsertQuery, SelectQuery, SqlValue, UpdateQuery},
    traits::{CustomerApiError, RewardsDatabaseError, StoreError},
};

/// A code dies after this many checks, right or wrong.
pub const MAX_ATTEMPTS: i64 = 3;
/// The resend throttle: no more than [`MAX_PER_WINDOW`] codes per phone in any trailing window of
/// this many seconds.
pub const RESEND_WINDOW_SECS: i64 = 60;
pub const MAX_PER_WINDOW: i64 = 3;

/// Kills every outstanding unverified code for the phone by flagging it `verified`, so only the
/// newest code can ever match a check. The rows stay behind and keep counting against the resend
/// throttle.
pub async fn invalidate_unverified(phone: &str, conn: &mut SqliteConnection) -> Result<u64, RewardsDatabaseError> {
    let q = UpdateQuery::new("customer_otps")
        .set("verified", true)
        .touch()
        .filter_eq("phone", phone)
        .filter_eq("verified", false)
        .build()?;
    let result = q.execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn insert_otp(otp: NewOtp, conn: &mut SqliteConnection) -> Result<CustomerOtp, RewardsDatabaseError> {
    let q = InsertQuery::new("customer_otps")
        .value("phone", otp.phone)
        .value("otp_code", otp.otp_code)
        .value("expires_at", otp.expires_at)
        .returning_all()
        .build()?;
    let otp = q.fetch_one(conn).await?;
    Ok(otp)
}

/// Charges an attempt against the outstanding code for this phone. Unconditional: the counter moves
/// whether or not the presented code turns out to match, so guessing is never free.
pub async fn bump_attempts(phone: &str, conn: &mut SqliteConnection) -> Result<u64, RewardsDatabaseError> {
    let q = UpdateQuery::new("customer_otps")
        .set_expr("attempts = attempts + {}", 1i64)
        .touch()
        .filter_eq("phone", phone)
        .filter_eq("verified", false)
        .build()?;
    let result = q.execute(conn).await?;
    Ok(result.rows_affected())
}

/// The newest code for the phone that still has every right to verify: matching, unverified,
/// unexpired and within the attempt budget.
///
/// `unixepoch` bridges the two timestamp texts in play (driver-bound RFC 3339 and the database's
/// own `CURRENT_TIMESTAMP` format), which do not compare correctly as strings.
pub async fn find_verifiable(
    phone: &str,
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerOtp>, RewardsDatabaseError> {
    let q = SelectQuery::new("customer_otps")
        .filter_eq("phone", phone)
        .filter_eq("otp_code", code)
        .filter_eq("verified", false)
        .filter_raw("unixepoch(expires_at) > unixepoch(CURRENT_TIMESTAMP)")
        .filter("attempts", Filter::Lte(SqlValue::Int(MAX_ATTEMPTS)))
        .order_by("created_at DESC")
        .limit(1)
        .build()?;
    let otp = q.fetch_optional(conn).await?;
    Ok(otp)
}

pub async fn mark_verified(id: i64, conn: &mut SqliteConnection) -> Result<CustomerOtp, RewardsDatabaseError> {
    let q = UpdateQuery::new("customer_otps")
        .set("verified", true)
        .touch()
        .filter_eq("id", id)
        .returning_all()
        .build()?;
    let otp = q.fetch_optional::<CustomerOtp>(conn).await?;
    otp.ok_or_else(|| StoreError::other(format!("One-time code {id} vanished while being verified")).into())
}

/// How many codes were issued for this phone inside the trailing resend window. Invalidated codes
/// count too.
pub async fn issued_in_window(phone: &str, conn: &mut SqliteConnection) -> Result<i64, CustomerApiError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM customer_otps
           WHERE phone = $1 AND unixepoch(created_at) > unixepoch(CURRENT_TIMESTAMP) - $2"#,
    )
    .bind(phone)
    .bind(RESEND_WINDOW_SECS)
    .fetch_one(conn)
    .await
    .map_err(StoreError::from)?;
    Ok(count)
}
