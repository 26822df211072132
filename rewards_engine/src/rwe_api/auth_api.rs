use log::info;

use crate::{
    db_types::{CustomerOtp, NewOtp},
    helpers,
    rwe_api::AuthApiError,
    traits::RewardsDatabase,
};

/// Phone verification via one-time codes.
#[derive(Debug, Clone)]
pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B>
where B: RewardsDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Issues a fresh code for the phone, invalidating any outstanding one. Subject to the resend
    /// throttle.
    pub async fn request_otp(&self, phone: &str) -> Result<CustomerOtp, AuthApiError> {
        if !self.db.can_resend_otp(phone).await? {
            return Err(AuthApiError::RateLimited(phone.to_string()));
        }
        let otp = NewOtp::new(phone.to_string(), helpers::otp_code());
        let otp = self.db.issue_otp(otp).await?;
        Ok(otp)
    }

    /// Checks a presented code. On success the matching customer record, if one exists, has its
    /// phone flagged as verified. `None` means the code did not verify; the caller learns nothing
    /// about why.
    pub async fn verify(&self, phone: &str, code: &str) -> Result<Option<CustomerOtp>, AuthApiError> {
        let verified = self.db.verify_otp(phone, code).await?;
        if verified.is_some() {
            let updated = self.db.mark_phone_verified(phone).await?;
            if updated > 0 {
                info!("🚀️ Phone {phone} verified");
            }
        }
        Ok(verified)
    }
}
