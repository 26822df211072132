use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use log::error;
use rwd_common::{Millime, Points, TND_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::rwe_api::{ORDER_TTL_MINUTES, OTP_TTL_MINUTES};

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------     TierLevel       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TierLevel {
    /// The free tier every customer starts on.
    #[default]
    Basic,
    /// First paid tier.
    Silver,
    /// Top paid tier.
    Gold,
}

impl TierLevel {
    /// The monthly spending cap tracked against `used_this_month` for this tier.
    pub fn monthly_limit(&self) -> Millime {
        match self {
            TierLevel::Basic => Millime::from_dinars(500),
            TierLevel::Silver => Millime::from_dinars(2_000),
            TierLevel::Gold => Millime::from_dinars(5_000),
        }
    }
}

impl Display for TierLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierLevel::Basic => write!(f, "basic"),
            TierLevel::Silver => write!(f, "silver"),
            TierLevel::Gold => write!(f, "gold"),
        }
    }
}

impl FromStr for TierLevel {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            s => Err(ConversionError(format!("Invalid tier level: {s}"))),
        }
    }
}

impl From<String> for TierLevel {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid tier level: {value}. But this conversion cannot fail. Defaulting to Basic");
            TierLevel::Basic
        })
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the merchant-side confirmation.
    Pending,
    /// The merchant scanned the customer code and the line items have been recorded.
    Confirmed,
    /// The order passed its hard expiry without being confirmed.
    Expired,
    /// The order was cancelled by the customer or the merchant.
    Cancelled,
}

impl OrderStatusType {
    /// Terminal states are final; only `Pending` orders may transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Confirmed => write!(f, "confirmed"),
            OrderStatusType::Expired => write!(f, "expired"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    BillingCycle       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn period(&self) -> Duration {
        match self {
            BillingCycle::Monthly => Duration::days(30),
            BillingCycle::Yearly => Duration::days(365),
        }
    }
}

impl Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingCycle::Monthly => write!(f, "monthly"),
            BillingCycle::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            s => Err(ConversionError(format!("Invalid billing cycle: {s}"))),
        }
    }
}

//-------------------------------------- SubscriptionStatus    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Expired => write!(f, "expired"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------      Customer         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub level: TierLevel,
    pub points: Points,
    pub monthly_limit: Millime,
    pub used_this_month: Millime,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub phone_verified: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewCustomer       -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    /// The customer's own referral code, unique across all customers.
    pub referral_code: String,
    /// The referral code of the customer who referred this one, if any.
    pub referred_by: Option<String>,
    /// The starting point balance (the welcome bonus).
    pub points: Points,
    pub monthly_limit: Millime,
}

impl NewCustomer {
    pub fn new(phone: String, first_name: String, last_name: String, referral_code: String) -> Self {
        Self {
            phone,
            first_name,
            last_name,
            referral_code,
            referred_by: None,
            points: Points::default(),
            monthly_limit: TierLevel::Basic.monthly_limit(),
        }
    }

    pub fn with_referred_by(mut self, code: String) -> Self {
        self.referred_by = Some(code);
        self
    }

    pub fn with_points(mut self, points: Points) -> Self {
        self.points = points;
        self
    }
}

//--------------------------------------     CustomerOtp       -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomerOtp {
    pub id: i64,
    pub phone: String,
    pub otp_code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOtp         -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOtp {
    pub phone: String,
    pub otp_code: String,
    pub expires_at: DateTime<Utc>,
}

impl NewOtp {
    /// A new code with the default lifetime ([`OTP_TTL_MINUTES`]).
    pub fn new(phone: String, otp_code: String) -> Self {
        Self { phone, otp_code, expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES) }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub merchant_id: i64,
    /// The code the customer presents, unique across all orders.
    pub order_qr_code: String,
    /// The code the merchant scans back to bind the sale.
    pub merchant_qr_code: String,
    pub status: OrderStatusType,
    pub total_amount: Millime,
    pub currency: String,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub merchant_id: i64,
    pub order_qr_code: String,
    pub merchant_qr_code: String,
    pub currency: String,
    pub expires_at: DateTime<Utc>,
}

impl NewOrder {
    /// A new handshake record with the default expiry ([`ORDER_TTL_MINUTES`]).
    pub fn new(customer_id: i64, merchant_id: i64, order_qr_code: String, merchant_qr_code: String) -> Self {
        Self {
            customer_id,
            merchant_id,
            order_qr_code,
            merchant_qr_code,
            currency: TND_CURRENCY_CODE.to_string(),
            expires_at: Utc::now() + Duration::minutes(ORDER_TTL_MINUTES),
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }
}

//--------------------------------------      OrderItem        -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
    pub price: Millime,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     NewOrderItem      -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub name: String,
    pub price: Millime,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(name: S, price: Millime, quantity: i64) -> Self {
        Self { name: name.into(), price, quantity }
    }
}

//-------------------------------------- CustomerSubscription  -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomerSubscription {
    pub id: i64,
    pub customer_id: i64,
    pub level: TierLevel,
    pub billing_cycle: BillingCycle,
    pub price: Millime,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub status: SubscriptionStatus,
    pub otp_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   NewSubscription     -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub customer_id: i64,
    pub level: TierLevel,
    pub billing_cycle: BillingCycle,
    pub price: Millime,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_method: Option<String>,
}

impl NewSubscription {
    pub fn new(customer_id: i64, level: TierLevel, billing_cycle: BillingCycle, price: Millime) -> Self {
        let started_at = Utc::now();
        Self {
            customer_id,
            level,
            billing_cycle,
            price,
            started_at,
            expires_at: started_at + billing_cycle.period(),
            payment_method: None,
        }
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in ["pending", "confirmed", "expired", "cancelled"] {
            assert_eq!(s.parse::<OrderStatusType>().unwrap().to_string(), s);
        }
        assert!("paid".parse::<OrderStatusType>().is_err());
        assert!(OrderStatusType::Confirmed.is_terminal());
        assert!(!OrderStatusType::Pending.is_terminal());
    }

    #[test]
    fn tier_levels_are_ordered() {
        assert!(TierLevel::Basic < TierLevel::Silver);
        assert!(TierLevel::Silver < TierLevel::Gold);
        assert_eq!(TierLevel::from("gold".to_string()), TierLevel::Gold);
        // An unknown level degrades to the free tier rather than failing the row decode.
        assert_eq!(TierLevel::from("platinum".to_string()), TierLevel::Basic);
    }

    #[test]
    fn subscription_expiry_follows_cycle() {
        let sub = NewSubscription::new(1, TierLevel::Silver, BillingCycle::Monthly, Millime::from_dinars(15));
        assert_eq!(sub.expires_at - sub.started_at, Duration::days(30));
    }
}
