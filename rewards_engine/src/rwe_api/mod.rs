//! The flow layer: orchestration of the store primitives into the user-facing journeys
//! (sign-in codes, onboarding, points, subscriptions, the QR order handshake).

mod auth_api;
mod customer_api;
mod errors;
mod order_flow_api;

pub use auth_api::AuthApi;
pub use customer_api::CustomerApi;
pub use errors::AuthApiError;
pub use order_flow_api::OrderFlowApi;

/// Points credited to every freshly registered customer.
pub const WELCOME_BONUS_POINTS: i64 = 100;
/// One-time codes live this long.
pub const OTP_TTL_MINUTES: i64 = 5;
/// A pending order must be confirmed within this window.
pub const ORDER_TTL_MINUTES: i64 = 10;
