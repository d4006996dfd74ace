//! Razorpay integration.
//!
//! Order creation against the REST API, plus signature verification for the
//! two confirmation paths (checkout callback and webhook).

pub mod client;
pub mod signature;
pub mod webhook;

pub use client::{GatewayError, RazorpayClient, RazorpayOrder};
pub use webhook::WebhookEvent;
