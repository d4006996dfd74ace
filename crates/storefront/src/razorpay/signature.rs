//! HMAC-SHA256 signature verification.
//!
//! Razorpay signs the checkout callback over `"{order_id}|{payment_id}"` and
//! the webhook over the raw request body, both with hex-encoded digests. The
//! comparison goes through `Mac::verify_slice`, which is constant-time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex-encoded HMAC-SHA256 signature over `message`.
///
/// Returns `false` for signatures that are not valid hex as well as for
/// digest mismatches.
#[must_use]
pub fn verify(secret: &SecretString, message: &[u8], supplied_hex: &str) -> bool {
    let Ok(supplied) = hex::decode(supplied_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&supplied).is_ok()
}

/// Verify a checkout-callback signature over `"{order_id}|{payment_id}"`.
#[must_use]
pub fn verify_checkout(
    secret: &SecretString,
    order_id: &str,
    payment_id: &str,
    supplied_hex: &str,
) -> bool {
    let message = format!("{order_id}|{payment_id}");
    verify(secret, message.as_bytes(), supplied_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    // RFC 4231 test case 2.
    const RFC4231_KEY: &str = "Jefe";
    const RFC4231_MSG: &[u8] = b"what do ya want for nothing?";
    const RFC4231_MAC: &str = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";

    #[test]
    fn accepts_known_good_signature() {
        assert!(verify(&secret(RFC4231_KEY), RFC4231_MSG, RFC4231_MAC));
    }

    #[test]
    fn rejects_wrong_digest() {
        let flipped = format!("0{}", &RFC4231_MAC[1..]);
        assert!(!verify(&secret(RFC4231_KEY), RFC4231_MSG, &flipped));
    }

    #[test]
    fn rejects_wrong_key() {
        assert!(!verify(&secret("JefeX"), RFC4231_MSG, RFC4231_MAC));
    }

    #[test]
    fn rejects_non_hex_signature() {
        assert!(!verify(&secret(RFC4231_KEY), RFC4231_MSG, "not-hex-at-all"));
    }

    #[test]
    fn rejects_truncated_signature() {
        assert!(!verify(&secret(RFC4231_KEY), RFC4231_MSG, &RFC4231_MAC[..32]));
    }

    #[test]
    fn checkout_signature_joins_ids_with_pipe() {
        let key = secret("test_webhook_secret");
        let mut mac = HmacSha256::new_from_slice(b"test_webhook_secret").unwrap();
        mac.update(b"order_abc|pay_def");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert!(verify_checkout(&key, "order_abc", "pay_def", &expected));
        assert!(!verify_checkout(&key, "order_abc", "pay_other", &expected));
    }
}
