use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Checks a gateway checkout signature: HMAC-SHA256 over
/// "{order_id}|{payment_id}" keyed with the gateway secret, hex-encoded.
/// The comparison runs inside `verify_slice`, which is constant-time.
/// Malformed input is simply a failed check, never a panic.
pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    key_secret: &str,
) -> bool {
    let supplied = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(key_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());

    mac.verify_slice(&supplied).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(order_id: &str, payment_id: &str, key_secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes()).unwrap();
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_signature_made_with_the_same_secret() {
        let sig = sign("order_123", "pay_456", "topsecret");
        assert!(verify_payment_signature("order_123", "pay_456", &sig, "topsecret"));
    }

    #[test]
    fn rejects_tampered_ids() {
        let sig = sign("order_123", "pay_456", "topsecret");
        assert!(!verify_payment_signature("order_123", "pay_999", &sig, "topsecret"));
        assert!(!verify_payment_signature("order_999", "pay_456", &sig, "topsecret"));
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let sig = sign("order_123", "pay_456", "topsecret");
        assert!(!verify_payment_signature("order_123", "pay_456", &sig, "othersecret"));
    }

    #[test]
    fn rejects_garbage_signatures_without_panicking() {
        assert!(!verify_payment_signature("order_123", "pay_456", "", "topsecret"));
        assert!(!verify_payment_signature("order_123", "pay_456", "not hex at all", "topsecret"));
        assert!(!verify_payment_signature("order_123", "pay_456", "deadbeef", "topsecret"));
    }
}
