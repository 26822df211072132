use std::fmt::Debug;

use futures_util::future::BoxFuture;
use log::{debug, info, warn};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::{
    db_types::{Customer, CustomerOtp, CustomerSubscription, NewCustomer, NewOrder, NewOrderItem, NewOtp,
        NewSubscription, Order, OrderItem, TierLevel},
    sqlbuild::BuiltQuery,
    sqlite::db,
    traits::{CustomerApiError, CustomerManagement, OrderManagement, RewardsDatabase, RewardsDatabaseError,
        StoreError},
};

/// The SQLite backend. Clones share one connection pool, so handing copies to every API object is
/// cheap.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `RWD_DATABASE_URL` environment variable, or the
    /// default URL if unset.
    pub async fn new(max_connections: u32) -> Result<Self, RewardsDatabaseError> {
        let url = db::db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, RewardsDatabaseError> {
        let pool = db::new_pool(url, max_connections).await.map_err(StoreError::from)?;
        info!("🗃️ Connected to database at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs a built query on a pooled connection and returns every row.
    pub async fn query<T>(&self, q: &BuiltQuery) -> Result<Vec<T>, StoreError>
    where T: for<'r> FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin {
        let mut conn = self.pool.acquire().await?;
        q.fetch_all(&mut conn).await
    }

    /// Runs a built query on a pooled connection and returns the first row, if any.
    pub async fn query_one<T>(&self, q: &BuiltQuery) -> Result<Option<T>, StoreError>
    where T: for<'r> FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin {
        let mut conn = self.pool.acquire().await?;
        q.fetch_optional(&mut conn).await
    }

    /// Runs `work` inside a database transaction. The transaction commits when `work` returns `Ok`
    /// and rolls back on `Err`, with the original error passed through untouched. Either way the
    /// connection goes back to the pool.
    pub async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>>,
    {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(StoreError::from)?;
                Ok(value)
            },
            Err(e) => {
                // The work's error wins; a failed rollback is logged, not returned.
                if let Err(re) = tx.rollback().await {
                    warn!("Error rolling back transaction: {re}");
                }
                Err(e)
            },
        }
    }

    /// A cheap liveness probe: true iff the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await.map(|one| one == 1).unwrap_or(false)
    }

    pub async fn fetch_customer_subscriptions(
        &self,
        customer_id: i64,
    ) -> Result<Vec<CustomerSubscription>, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::subscriptions::subscriptions_for_customer(customer_id, &mut conn).await
    }
}

//--------------------------------------  CustomerManagement   -------------------------------------------------------
impl CustomerManagement for SqliteDatabase {
    async fn fetch_customer_by_id(&self, id: i64) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::fetch_customer_by_id(id, &mut conn).await
    }

    async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::fetch_customer_by_phone(phone, &mut conn).await
    }

    async fn fetch_customer_by_referral_code(&self, code: &str) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::fetch_customer_by_referral_code(code, &mut conn).await
    }

    async fn update_points(&self, id: i64, delta: rwd_common::Points) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::adjust_points(id, delta, &mut conn).await
    }

    async fn update_monthly_spending(&self, id: i64, amount: rwd_common::Millime) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::add_monthly_spending(id, amount, &mut conn).await
    }

    async fn reset_monthly_spending(&self) -> Result<u64, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::reset_monthly_spending(&mut conn).await
    }

    async fn update_level(&self, id: i64, level: TierLevel) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::update_level(id, level, &mut conn).await
    }

    async fn mark_phone_verified(&self, phone: &str) -> Result<u64, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::mark_phone_verified(phone, &mut conn).await
    }

    async fn can_resend_otp(&self, phone: &str) -> Result<bool, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        let issued = db::otps::issued_in_window(phone, &mut conn).await?;
        Ok(issued < db::otps::MAX_PER_WINDOW)
    }
}

//--------------------------------------   OrderManagement     -------------------------------------------------------
impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::orders::fetch_order_by_id(id, &mut conn).await
    }

    async fn fetch_order_by_code(&self, order_qr_code: &str) -> Result<Option<Order>, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::orders::fetch_pending_by_qr_code(order_qr_code, &mut conn).await
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::orders::items_for_order(order_id, &mut conn).await
    }
}

//--------------------------------------   RewardsDatabase     -------------------------------------------------------
impl RewardsDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::customers::insert_customer(customer, &mut conn).await
    }

    async fn issue_otp(&self, otp: NewOtp) -> Result<CustomerOtp, RewardsDatabaseError> {
        let otp = self
            .transaction(move |conn| {
                Box::pin(async move {
                    db::otps::invalidate_unverified(&otp.phone, &mut *conn).await?;
                    let otp = db::otps::insert_otp(otp, &mut *conn).await?;
                    Ok::<_, RewardsDatabaseError>(otp)
                })
            })
            .await?;
        debug!("📨️ One-time code issued for phone {}", otp.phone);
        Ok(otp)
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<Option<CustomerOtp>, RewardsDatabaseError> {
        let phone = phone.to_string();
        let code = code.to_string();
        self.transaction(move |conn| {
            Box::pin(async move {
                db::otps::bump_attempts(&phone, &mut *conn).await?;
                let candidate = db::otps::find_verifiable(&phone, &code, &mut *conn).await?;
                match candidate {
                    Some(otp) => {
                        let verified = db::otps::mark_verified(otp.id, &mut *conn).await?;
                        debug!("📨️ One-time code verified for phone {phone}");
                        Ok(Some(verified))
                    },
                    None => Ok(None),
                }
            })
        })
        .await
    }

    async fn create_subscription(&self, sub: NewSubscription) -> Result<CustomerSubscription, RewardsDatabaseError> {
        let sub = self
            .transaction(move |conn| {
                Box::pin(async move {
                    let sub = db::subscriptions::insert_subscription(sub, &mut *conn).await?;
                    db::customers::update_level(sub.customer_id, sub.level, &mut *conn).await?;
                    Ok::<_, RewardsDatabaseError>(sub)
                })
            })
            .await?;
        debug!("🗃️ Customer {} subscribed to the {} tier", sub.customer_id, sub.level);
        Ok(sub)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::orders::insert_order(order, &mut conn).await
    }

    async fn confirm_order(
        &self,
        order_id: i64,
        total_amount: rwd_common::Millime,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, RewardsDatabaseError> {
        if items.is_empty() {
            return Err(RewardsDatabaseError::EmptyItemList);
        }
        let order = self
            .transaction(move |conn| {
                Box::pin(async move {
                    let order = db::orders::fetch_order_by_id(order_id, &mut *conn)
                        .await?
                        .ok_or(RewardsDatabaseError::OrderNotFound(order_id))?;
                    let order = db::orders::confirm_pending(order.id, total_amount, &mut *conn)
                        .await?
                        .ok_or(RewardsDatabaseError::OrderNotPending(order_id))?;
                    for item in items {
                        db::orders::insert_order_item(order.id, item, &mut *conn).await?;
                    }
                    Ok::<_, RewardsDatabaseError>(order)
                })
            })
            .await?;
        debug!("🗃️ Order #{} confirmed at {}", order.id, order.total_amount);
        Ok(order)
    }

    async fn expire_old_orders(&self) -> Result<Vec<Order>, RewardsDatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        db::orders::expire_overdue(&mut conn).await
    }

    async fn close(&mut self) -> Result<(), RewardsDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}
