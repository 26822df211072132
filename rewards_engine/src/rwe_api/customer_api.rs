use log::info;
use rwd_common::{Millime, Points};

use crate::{
    db_types::{BillingCycle, Customer, CustomerSubscription, NewCustomer, NewSubscription, TierLevel},
    helpers,
    rwe_api::WELCOME_BONUS_POINTS,
    traits::{CustomerApiError, RewardsDatabase, RewardsDatabaseError},
};

/// Customer onboarding and account bookkeeping.
#[derive(Debug, Clone)]
pub struct CustomerApi<B> {
    db: B,
}

impl<B> CustomerApi<B>
where B: RewardsDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new customer. The welcome bonus is part of the initial record rather than a
    /// follow-up update, so a customer is never observable with a zero balance. When a referral
    /// code is supplied it must belong to an existing customer.
    pub async fn register_customer(
        &self,
        phone: String,
        first_name: String,
        last_name: String,
        referred_by: Option<String>,
    ) -> Result<Customer, RewardsDatabaseError> {
        let referred_by = match referred_by {
            Some(code) => {
                let referrer = self.db.fetch_customer_by_referral_code(&code).await?;
                match referrer {
                    Some(_) => Some(code),
                    None => return Err(RewardsDatabaseError::ReferralCodeNotFound(code)),
                }
            },
            None => None,
        };
        let referral_code = helpers::referral_code_for_phone(&phone);
        let mut customer =
            NewCustomer::new(phone, first_name, last_name, referral_code).with_points(Points::from(WELCOME_BONUS_POINTS));
        if let Some(code) = referred_by {
            customer = customer.with_referred_by(code);
        }
        let customer = self.db.create_customer(customer).await?;
        info!("🚀️ Customer #{} joined with a {} welcome bonus", customer.id, customer.points);
        Ok(customer)
    }

    pub async fn customer_by_id(&self, id: i64) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer_by_id(id).await
    }

    pub async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer_by_phone(phone).await
    }

    pub async fn customer_by_referral_code(&self, code: &str) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer_by_referral_code(code).await
    }

    /// Credits points to the customer's balance.
    pub async fn earn_points(&self, id: i64, points: Points) -> Result<Customer, CustomerApiError> {
        self.db.update_points(id, points).await
    }

    /// Deducts points. A redemption larger than the balance fails with
    /// [`CustomerApiError::InsufficientPoints`] and leaves the balance untouched.
    pub async fn redeem_points(&self, id: i64, points: Points) -> Result<Customer, CustomerApiError> {
        self.db.update_points(id, -points).await
    }

    pub async fn record_spending(&self, id: i64, amount: Millime) -> Result<Customer, CustomerApiError> {
        self.db.update_monthly_spending(id, amount).await
    }

    /// The start-of-month sweep over every customer's spending counter.
    pub async fn reset_monthly_spending(&self) -> Result<u64, CustomerApiError> {
        self.db.reset_monthly_spending().await
    }

    /// Subscribes the customer to a paid tier. The store applies the tier change in the same
    /// transaction as the subscription record.
    pub async fn upgrade_to(
        &self,
        customer_id: i64,
        level: TierLevel,
        billing_cycle: BillingCycle,
        price: Millime,
        payment_method: Option<String>,
    ) -> Result<CustomerSubscription, RewardsDatabaseError> {
        let mut sub = NewSubscription::new(customer_id, level, billing_cycle, price);
        if let Some(method) = payment_method {
            sub = sub.with_payment_method(method);
        }
        self.db.create_subscription(sub).await
    }
}
