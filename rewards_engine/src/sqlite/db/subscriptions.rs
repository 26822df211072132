use sqlx::SqliteConnection;

use crate::{
    db_types::{CustomerSubscription, NewSubscription, SubscriptionStatus},
    sqlbuild::{InsertQuery, SelectQuery},
    traits::RewardsDatabaseError,
};

pub async fn insert_subscription(
    sub: NewSubscription,
    conn: &mut SqliteConnection,
) -> Result<CustomerSubscription, RewardsDatabaseError> {
    let q = InsertQuery::new("customer_subscriptions")
        .value("customer_id", sub.customer_id)
        .value("level", sub.level)
        .value("billing_cycle", sub.billing_cycle)
        .value("price", sub.price)
        .value("started_at", sub.started_at)
        .value("expires_at", sub.expires_at)
        .value("payment_method", sub.payment_method)
        .value("status", SubscriptionStatus::Active)
        .returning_all()
        .build()?;
    let sub = q.fetch_one(conn).await?;
    Ok(sub)
}

pub async fn subscriptions_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CustomerSubscription>, RewardsDatabaseError> {
    let q = SelectQuery::new("customer_subscriptions")
        .filter_eq("customer_id", customer_id)
        .order_by("started_at DESC")
        .build()?;
    let subs = q.fetch_all(conn).await?;
    Ok(subs)
}
