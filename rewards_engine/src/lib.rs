//! Rewards Engine
//!
//! The Rewards Engine is the storage core of a mobile loyalty platform: customers earn and redeem points,
//! verify their phone numbers with one-time codes, upgrade their membership tier via subscriptions, and
//! settle in-store purchases through a short-lived QR-code order handshake.
//!
//! The library is divided into three main sections:
//! 1. Query construction ([`mod@sqlbuild`]). A pure, I/O-free builder that turns tables, column maps and
//!    filters into parameterized SQL plus an ordered parameter list. All repository code funnels its SQL
//!    through this module.
//! 2. Database management and control ([`mod@sqlite`]). SQLite is the currently supported backend. You
//!    should never need to access the database directly; use the public API instead. The exception is the
//!    data types used in the database, which are defined in the `db_types` module and are public.
//! 3. The engine public API ([`mod@rwe_api`]). Thin flow objects (customers, phone authentication, order
//!    handshake) that apply the product rules on top of any backend implementing the traits in
//!    [`mod@traits`].
pub mod db_types;
pub mod helpers;
pub mod rwe_api;
pub mod sqlbuild;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use rwe_api::{
    AuthApi,
    AuthApiError,
    CustomerApi,
    OrderFlowApi,
    OTP_TTL_MINUTES,
    ORDER_TTL_MINUTES,
    WELCOME_BONUS_POINTS,
};
pub use traits::{
    CustomerApiError,
    CustomerManagement,
    OrderManagement,
    RewardsDatabase,
    RewardsDatabaseError,
    StoreError,
};
