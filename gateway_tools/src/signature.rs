//! Gateway signature checks.
//!
//! * Client callback: `hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`
//! * Webhook: `hex(HMAC-SHA256(webhook_secret, raw_body))`
//!
//! Verification decodes the hex signature and compares MACs in constant time.
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, message: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(mac)
}

fn sign(secret: &str, message: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never fails
    mac_for(secret, message).map(|m| hex::encode(m.finalize().into_bytes())).unwrap_or_default()
}

fn verify(secret: &str, message: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        warn!("🔏️ Refusing to verify a signature against an empty secret");
        return false;
    }
    let Ok(expected) = hex::decode(signature.trim()) else {
        debug!("🔏️ Signature is not valid hex");
        return false;
    };
    match mac_for(secret, message) {
        Some(mac) => mac.verify_slice(&expected).is_ok(),
        None => false,
    }
}

fn payment_message(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

pub fn sign_payment(order_id: &str, payment_id: &str, key_secret: &str) -> String {
    sign(key_secret, payment_message(order_id, payment_id).as_bytes())
}

pub fn verify_payment_signature(order_id: &str, payment_id: &str, signature: &str, key_secret: &str) -> bool {
    verify(key_secret, payment_message(order_id, payment_id).as_bytes(), signature)
}

pub fn sign_webhook(payload: &[u8], webhook_secret: &str) -> String {
    sign(webhook_secret, payload)
}

pub fn verify_webhook_signature(payload: &[u8], signature: &str, webhook_secret: &str) -> bool {
    verify(webhook_secret, payload, signature)
}
