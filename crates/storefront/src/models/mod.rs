//! Domain models for the storefront.
//!
//! Row-mapped types live here; request/response shapes live with their routes.

pub mod order;
pub mod session;
pub mod user;

pub use order::{Order, OrderItem, Product};
pub use session::CurrentUser;
pub use session::keys as session_keys;
pub use user::{LoginAttempt, PendingVerification, User};
