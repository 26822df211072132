mod support;

use chrono::{Duration, Utc};
use rewards_engine::{
    db_types::{Customer, NewOrder, NewOrderItem, OrderStatusType},
    CustomerApi,
    OrderFlowApi,
    OrderManagement,
    RewardsDatabase,
    RewardsDatabaseError,
    SqliteDatabase,
    StoreError,
};
use rwd_common::Millime;
use support::new_test_db;

async fn customer(db: &SqliteDatabase, phone: &str) -> Customer {
    CustomerApi::new(db.clone())
        .register_customer(phone.to_string(), "Test".to_string(), "Customer".to_string(), None)
        .await
        .unwrap()
}

fn basket() -> Vec<NewOrderItem> {
    vec![
        NewOrderItem::new("Espresso", Millime::from(2_500), 2),
        NewOrderItem::new("Croissant", Millime::from(1_800), 1),
    ]
}

#[tokio::test]
async fn new_orders_open_pending_with_a_resolvable_code() {
    let db = new_test_db().await;
    let customer = customer(&db, "21650300300").await;
    let orders = OrderFlowApi::new(db.clone());

    let order = orders.new_order(customer.id, 7).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.total_amount, Millime::from(0));
    assert_eq!(order.currency, "TND");
    assert!(order.confirmed_at.is_none());
    assert!(order.expires_at > Utc::now());

    let resolved = orders.order_by_qr_code(&order.order_qr_code).await.unwrap().unwrap();
    assert_eq!(resolved.id, order.id);
    assert!(orders.order_by_qr_code("ORD-nope").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_orders_do_not_resolve_and_get_swept() {
    let db = new_test_db().await;
    let customer = customer(&db, "21650300301").await;
    let orders = OrderFlowApi::new(db.clone());

    let stale = NewOrder::new(customer.id, 7, "ORD-stale".to_string(), "MCH-stale".to_string())
        .with_expiry(Utc::now() - Duration::minutes(1));
    let stale = db.create_order(stale).await.unwrap();
    // Still `pending` in the data, but already invisible to the till.
    assert!(orders.order_by_qr_code("ORD-stale").await.unwrap().is_none());

    let live = orders.new_order(customer.id, 7).await.unwrap();
    let swept = orders.expire_old_orders().await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].id, stale.id);
    assert_eq!(swept[0].status, OrderStatusType::Expired);
    // The live order is untouched by the sweep.
    let live = db.fetch_order_by_id(live.id).await.unwrap().unwrap();
    assert_eq!(live.status, OrderStatusType::Pending);
}

#[tokio::test]
async fn confirmation_stamps_total_time_and_items() {
    let db = new_test_db().await;
    let customer = customer(&db, "21650300302").await;
    let orders = OrderFlowApi::new(db.clone());

    let order = orders.new_order(customer.id, 7).await.unwrap();
    let confirmed = orders.confirm_order(order.id, Millime::from(6_800), basket()).await.unwrap();
    assert_eq!(confirmed.status, OrderStatusType::Confirmed);
    assert_eq!(confirmed.total_amount, Millime::from(6_800));
    assert!(confirmed.confirmed_at.is_some());

    let items = orders.order_items(order.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Espresso");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].name, "Croissant");
    assert_eq!(items.iter().map(|i| i.price * i.quantity).sum::<Millime>(), Millime::from(6_800));

    // A confirmed order no longer resolves at the till.
    assert!(orders.order_by_qr_code(&order.order_qr_code).await.unwrap().is_none());
}

#[tokio::test]
async fn confirmation_inputs_are_validated_up_front() {
    let db = new_test_db().await;
    let customer = customer(&db, "21650300303").await;
    let orders = OrderFlowApi::new(db.clone());
    let order = orders.new_order(customer.id, 7).await.unwrap();

    let err = orders.confirm_order(order.id, Millime::from(0), basket()).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::InvalidAmount(_)));
    let err = orders.confirm_order(order.id, Millime::from(6_800), vec![]).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::EmptyItemList));
    let bad = vec![NewOrderItem::new("Espresso", Millime::from(2_500), 0)];
    let err = orders.confirm_order(order.id, Millime::from(2_500), bad).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::InvalidItem(name, _) if name == "Espresso"));

    // None of the rejected confirmations touched the order.
    let order = db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[tokio::test]
async fn a_failed_item_insert_rolls_the_whole_confirmation_back() {
    let db = new_test_db().await;
    let customer = customer(&db, "21650300304").await;
    let orders = OrderFlowApi::new(db.clone());
    let order = orders.new_order(customer.id, 7).await.unwrap();

    // Straight to the store layer, past the API validation: the third item violates the
    // quantity check constraint after two items have already been inserted.
    let mut items = basket();
    items.push(NewOrderItem::new("Phantom", Millime::from(1_000), 0));
    let err = db.confirm_order(order.id, Millime::from(7_800), items).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::StoreError(StoreError::ValidationFailed(_))), "got {err}");

    // All or nothing: the order is exactly as it was and no items survive.
    let order = db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.total_amount, Millime::from(0));
    assert!(order.confirmed_at.is_none());
    assert!(db.fetch_order_items(order.id).await.unwrap().is_empty());

    // The order is still confirmable afterwards.
    let confirmed = orders.confirm_order(order.id, Millime::from(6_800), basket()).await.unwrap();
    assert_eq!(confirmed.status, OrderStatusType::Confirmed);
}

#[tokio::test]
async fn only_pending_unexpired_orders_can_confirm() {
    let db = new_test_db().await;
    let customer = customer(&db, "21650300305").await;
    let orders = OrderFlowApi::new(db.clone());

    let order = orders.new_order(customer.id, 7).await.unwrap();
    orders.confirm_order(order.id, Millime::from(6_800), basket()).await.unwrap();
    let err = orders.confirm_order(order.id, Millime::from(6_800), basket()).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::OrderNotPending(id) if id == order.id));

    let stale = NewOrder::new(customer.id, 7, "ORD-stale".to_string(), "MCH-stale".to_string())
        .with_expiry(Utc::now() - Duration::minutes(1));
    let stale = db.create_order(stale).await.unwrap();
    let err = orders.confirm_order(stale.id, Millime::from(6_800), basket()).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::OrderNotPending(id) if id == stale.id));

    let err = orders.confirm_order(999_999, Millime::from(6_800), basket()).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::OrderNotFound(999_999)));
}
