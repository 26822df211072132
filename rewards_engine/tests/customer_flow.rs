mod support;

use rewards_engine::{
    db_types::{BillingCycle, SubscriptionStatus, TierLevel},
    helpers,
    CustomerApi,
    CustomerApiError,
    OrderFlowApi,
    RewardsDatabase,
    RewardsDatabaseError,
    StoreError,
    WELCOME_BONUS_POINTS,
};
use rwd_common::{Millime, Points};
use support::new_test_db;

#[tokio::test]
async fn registration_applies_welcome_bonus_and_referral_code() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    let customer = api
        .register_customer("21650111222".to_string(), "Amel".to_string(), "Ben Salah".to_string(), None)
        .await
        .unwrap();
    assert_eq!(customer.points, Points::from(WELCOME_BONUS_POINTS));
    assert_eq!(customer.level, TierLevel::Basic);
    assert_eq!(customer.monthly_limit, Millime::from_dinars(500));
    assert_eq!(customer.used_this_month, Millime::from(0));
    assert_eq!(customer.referral_code, helpers::referral_code_for_phone("21650111222"));
    assert!(!customer.phone_verified);
    assert!(customer.is_active);
    assert!(customer.referred_by.is_none());

    let found = api.customer_by_phone("21650111222").await.unwrap().unwrap();
    assert_eq!(found.id, customer.id);
    let found = api.customer_by_referral_code(&customer.referral_code).await.unwrap().unwrap();
    assert_eq!(found.id, customer.id);
    assert!(api.customer_by_phone("21699999999").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_phone_is_rejected() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    api.register_customer("21650333444".to_string(), "Sami".to_string(), "Trabelsi".to_string(), None).await.unwrap();
    let err = api
        .register_customer("21650333444".to_string(), "Samia".to_string(), "Trabelsi".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::StoreError(StoreError::DuplicateEntry(_))), "got {err}");
}

#[tokio::test]
async fn referrals_must_name_an_existing_customer() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    let referrer =
        api.register_customer("21650555666".to_string(), "Nour".to_string(), "Karoui".to_string(), None).await.unwrap();
    let referee = api
        .register_customer(
            "21650555667".to_string(),
            "Yassine".to_string(),
            "Karoui".to_string(),
            Some(referrer.referral_code.clone()),
        )
        .await
        .unwrap();
    assert_eq!(referee.referred_by.as_deref(), Some(referrer.referral_code.as_str()));

    let err = api
        .register_customer(
            "21650555668".to_string(),
            "Ghost".to_string(),
            "Referrer".to_string(),
            Some("DEADBEEF".to_string()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::ReferralCodeNotFound(code) if code == "DEADBEEF"));
}

#[tokio::test]
async fn points_can_be_earned_but_never_overdrawn() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    let customer =
        api.register_customer("21650777888".to_string(), "Rim".to_string(), "Jlassi".to_string(), None).await.unwrap();

    let customer = api.earn_points(customer.id, Points::from(50)).await.unwrap();
    assert_eq!(customer.points, Points::from(150));
    let customer = api.redeem_points(customer.id, Points::from(30)).await.unwrap();
    assert_eq!(customer.points, Points::from(120));

    let err = api.redeem_points(customer.id, Points::from(1_000)).await.unwrap_err();
    assert!(matches!(err, CustomerApiError::InsufficientPoints(id) if id == customer.id));
    // The failed redemption must not have moved the balance.
    let customer = api.customer_by_id(customer.id).await.unwrap().unwrap();
    assert_eq!(customer.points, Points::from(120));

    let err = api.earn_points(999_999, Points::from(10)).await.unwrap_err();
    assert!(matches!(err, CustomerApiError::CustomerNotFound(999_999)));
}

#[tokio::test]
async fn monthly_spending_accumulates_and_resets() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    let a = api.register_customer("21650100100".to_string(), "A".to_string(), "A".to_string(), None).await.unwrap();
    let b = api.register_customer("21650100101".to_string(), "B".to_string(), "B".to_string(), None).await.unwrap();

    api.record_spending(a.id, Millime::from_dinars(20)).await.unwrap();
    let a = api.record_spending(a.id, Millime::from(4_500)).await.unwrap();
    assert_eq!(a.used_this_month, Millime::from(24_500));
    let b = api.record_spending(b.id, Millime::from_dinars(3)).await.unwrap();
    assert_eq!(b.used_this_month, Millime::from_dinars(3));

    let affected = api.reset_monthly_spending().await.unwrap();
    assert_eq!(affected, 2);
    let a = api.customer_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(a.used_this_month, Millime::from(0));
}

#[tokio::test]
async fn subscribing_moves_the_customer_onto_the_paid_tier() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    let customer =
        api.register_customer("21650200200".to_string(), "Leila".to_string(), "Mansour".to_string(), None).await.unwrap();

    let sub = api
        .upgrade_to(customer.id, TierLevel::Silver, BillingCycle::Monthly, Millime::from_dinars(15), Some("card".to_string()))
        .await
        .unwrap();
    assert_eq!(sub.level, TierLevel::Silver);
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.payment_method.as_deref(), Some("card"));
    assert_eq!((sub.expires_at - sub.started_at).num_days(), 30);

    // The tier change and the higher cap land in the same transaction as the subscription row.
    let customer = api.customer_by_id(customer.id).await.unwrap().unwrap();
    assert_eq!(customer.level, TierLevel::Silver);
    assert_eq!(customer.monthly_limit, Millime::from_dinars(2_000));

    let subs = db.fetch_customer_subscriptions(customer.id).await.unwrap();
    assert_eq!(subs.len(), 1);
}

#[tokio::test]
async fn orders_for_unknown_customers_are_refused() {
    let db = new_test_db().await;
    let orders = OrderFlowApi::new(db.clone());
    let err = orders.new_order(424_242, 1).await.unwrap_err();
    assert!(matches!(err, RewardsDatabaseError::StoreError(StoreError::ReferenceNotFound(_))), "got {err}");
}

#[tokio::test]
async fn url_reports_the_connection_string() {
    let db = new_test_db().await;
    assert!(db.url().starts_with("sqlite://../data/test_store_"));
}
