//! # Database management and control.
//!
//! This module defines the interface contracts that storage *backends* of the rewards engine must
//! implement.
//!
//! ## Customers
//! A customer record carries the loyalty state: point balance, membership tier, monthly spending
//! counters and the referral linkage. The [`CustomerManagement`] trait covers the single-statement
//! queries and bookkeeping updates over these records.
//!
//! ## Orders
//! An order is a short-lived QR-code handshake between a customer and a merchant. The
//! [`OrderManagement`] trait provides the read side; the confirmation flow (the one genuinely
//! multi-statement operation in the engine) lives on [`RewardsDatabase`].
//!
//! ## Traits
//! * [`RewardsDatabase`] defines the highest level of behaviour for backends: customer onboarding,
//!   the OTP lifecycle, subscription upgrades and the order handshake.
//! * [`CustomerManagement`] provides customer queries and single-statement updates.
//! * [`OrderManagement`] provides order and line-item queries.
mod customer_management;
mod order_management;
mod rewards_database;
mod store_error;

pub use customer_management::{CustomerApiError, CustomerManagement};
pub use order_management::OrderManagement;
pub use rewards_database::{RewardsDatabase, RewardsDatabaseError};
pub use store_error::StoreError;
