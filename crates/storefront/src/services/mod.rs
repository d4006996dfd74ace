//! Business logic.
//!
//! The security-sensitive decisions (resend throttling, OTP checking, login
//! lockout) are pure functions over timestamps and counters. The services
//! load state, call the decision function, then apply the transition it
//! names. Keeping the decisions pure keeps them testable without a database.

pub mod auth;
pub mod email;
pub mod orders;
pub mod throttle;
pub mod verification;

pub use email::EmailService;
pub use orders::OrderService;
