//! Razorpay webhook payload types.
//!
//! Only the payment events the storefront reacts to are modelled; everything
//! else is acknowledged and dropped so the gateway stops retrying.

use serde::Deserialize;

/// Events this service acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PaymentCaptured,
    PaymentFailed,
    /// Anything else. Acknowledged without side effects.
    Other,
}

/// A webhook delivery, parsed after signature verification.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<PaymentWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentWrapper {
    pub entity: PaymentEntity,
}

/// The payment entity fields the storefront uses.
#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    /// Payment reference, e.g. `pay_29QQoUBi66xm2f`.
    pub id: String,
    /// Gateway order reference the payment belongs to.
    pub order_id: Option<String>,
}

impl WebhookEvent {
    /// Classify the event name.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self.event.as_str() {
            "payment.captured" => EventKind::PaymentCaptured,
            "payment.failed" => EventKind::PaymentFailed,
            _ => EventKind::Other,
        }
    }

    /// The payment entity, if the payload carries one.
    #[must_use]
    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|w| &w.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_event_parses() {
        let json = r#"{
            "entity": "event",
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "status": "captured",
                        "amount": 49900
                    }
                }
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), EventKind::PaymentCaptured);
        let payment = event.payment().unwrap();
        assert_eq!(payment.id, "pay_29QQoUBi66xm2f");
        assert_eq!(payment.order_id.as_deref(), Some("order_9A33XWu170gUtm"));
    }

    #[test]
    fn failed_event_parses() {
        let json = r#"{
            "event": "payment.failed",
            "payload": {
                "payment": {
                    "entity": { "id": "pay_x", "order_id": "order_y" }
                }
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), EventKind::PaymentFailed);
    }

    #[test]
    fn unknown_event_is_other() {
        let json = r#"{ "event": "refund.processed", "payload": {} }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), EventKind::Other);
        assert!(event.payment().is_none());
    }

    #[test]
    fn missing_payload_defaults_to_empty() {
        let json = r#"{ "event": "order.paid" }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), EventKind::Other);
        assert!(event.payment().is_none());
    }
}
