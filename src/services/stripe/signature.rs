//! Stripe webhook signature scheme.
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 keyed by the
//! endpoint secret and sends `Stripe-Signature: t=<ts>,v1=<hex>[,v1=...]`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

/// Replay window, in seconds, on either side of the signing timestamp.
/// Fixed at the Stripe SDK default.
pub const TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("signature verification failed: {0}")]
    Verification(String),
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        SignatureError::Verification("unable to extract timestamp from header".into())
    })?;
    if signatures.is_empty() {
        return Err(SignatureError::Verification(
            "no v1 signatures found in header".into(),
        ));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify_header(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header)?;
    let expected = compute_signature(secret, parsed.timestamp, payload);
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
    if !matched {
        return Err(SignatureError::Verification(
            "no signature matches the expected signature for payload".into(),
        ));
    }
    if (now - parsed.timestamp).abs() > TOLERANCE_SECS {
        return Err(SignatureError::Verification(
            "timestamp outside the tolerance zone".into(),
        ));
    }
    Ok(())
}

/// Verifies the signature, then parses the event envelope.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<StripeEvent, SignatureError> {
    std::str::from_utf8(payload).map_err(|e| SignatureError::InvalidPayload(e.to_string()))?;
    verify_header(payload, header, secret, now)?;

    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| SignatureError::InvalidPayload(e.to_string()))?;
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SignatureError::InvalidPayload("event is missing an id".into()))?
        .to_string();
    let ty = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SignatureError::InvalidPayload("event is missing a type".into()))?
        .to_string();
    let created = value.get("created").and_then(|v| v.as_i64());

    Ok(StripeEvent {
        id,
        r#type: ty,
        created,
        payload: value,
    })
}

/// Builds a header the way Stripe would for `payload` at `timestamp`.
#[cfg(test)]
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, payload)
    )
}
