use thiserror::Error;

use crate::traits::{CustomerApiError, RewardsDatabaseError};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Too many codes requested for phone {0}. Try again shortly")]
    RateLimited(String),
    #[error("{0}")]
    Database(#[from] RewardsDatabaseError),
    #[error("{0}")]
    Customer(#[from] CustomerApiError),
}
