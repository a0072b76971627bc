//! Stripe webhook verification and the events we act on.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Maximum clock skew accepted between the signature timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompleted {
    pub session_id: String,
    pub escola_id: String,
    pub plano_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    CheckoutCompleted(CheckoutCompleted),
    /// Acknowledged without side effects.
    Ignored { event_type: String },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct RawCheckoutSession {
    id: String,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Default, Deserialize)]
struct RawMetadata {
    escola_id: Option<String>,
    plano_id: Option<String>,
}

/// Checks a `Stripe-Signature` header (`t=<ts>,v1=<hex>[,v1=...]`) against the raw body.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        if let Some((key, value)) = part.trim().split_once('=') {
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        warn!("webhook signature without timestamp");
        Error::Unauthorized
    })?;
    if signatures.is_empty() {
        warn!("webhook signature without v1 entry");
        return Err(Error::Unauthorized);
    }

    let ts: i64 = timestamp.parse().map_err(|_| Error::Unauthorized)?;
    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS {
        warn!(timestamp = ts, now, "webhook timestamp outside tolerance");
        return Err(Error::Unauthorized);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("webhook secret: {e}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });

    if !matched {
        warn!("webhook signature verification failed");
        return Err(Error::Unauthorized);
    }

    Ok(())
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent> {
    let raw: RawEvent = serde_json::from_slice(payload)?;
    debug!(event_type = %raw.event_type, "parsed webhook event");

    if raw.event_type != "checkout.session.completed" {
        return Ok(WebhookEvent::Ignored {
            event_type: raw.event_type,
        });
    }

    let session: RawCheckoutSession = serde_json::from_value(raw.data.object)?;
    match (session.metadata.escola_id, session.metadata.plano_id) {
        (Some(escola_id), Some(plano_id)) => Ok(WebhookEvent::CheckoutCompleted(CheckoutCompleted {
            session_id: session.id,
            escola_id,
            plano_id,
        })),
        _ => {
            warn!(session_id = %session.id, "checkout session without escola/plano metadata");
            Ok(WebhookEvent::Ignored {
                event_type: raw.event_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(payload: &str, ts: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{ts}.{payload}").as_bytes());
        format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn checkout_payload() -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_1",
                "metadata": { "escola_id": "e1", "plano_id": "p1" }
            }}
        })
        .to_string()
    }

    #[test]
    fn test_valid_signature() {
        let payload = checkout_payload();
        let header = sign(&payload, 1_700_000_000);
        assert!(verify_signature(payload.as_bytes(), &header, SECRET, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = checkout_payload();
        let header = sign(&payload, 1_700_000_000);
        let tampered = payload.replace("p1", "p2");
        assert!(matches!(
            verify_signature(tampered.as_bytes(), &header, SECRET, 1_700_000_000),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = checkout_payload();
        let header = sign(&payload, 1_700_000_000);
        assert!(verify_signature(payload.as_bytes(), &header, "other", 1_700_000_000).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = checkout_payload();
        let header = sign(&payload, 1_700_000_000);
        assert!(verify_signature(payload.as_bytes(), &header, SECRET, 1_700_000_301).is_err());
        assert!(verify_signature(payload.as_bytes(), &header, SECRET, 1_700_000_300).is_ok());
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        let payload = checkout_payload();
        for ts in [i64::MIN, i64::MAX] {
            let header = sign(&payload, ts);
            assert!(verify_signature(payload.as_bytes(), &header, SECRET, 1_700_000_000).is_err());
        }
        let header = sign(&payload, 0);
        assert!(verify_signature(payload.as_bytes(), &header, SECRET, i64::MAX).is_err());
    }

    #[test]
    fn test_malformed_header_rejected() {
        let payload = checkout_payload();
        for header in ["", "t=abc,v1=00", "v1=00", "t=1700000000", "t=1700000000,v1=zz"] {
            assert!(
                verify_signature(payload.as_bytes(), header, SECRET, 1_700_000_000).is_err(),
                "{header}"
            );
        }
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let payload = checkout_payload();
        let good = sign(&payload, 1_700_000_000);
        let header = good.replace("v1=", "v1=deadbeef,v1=");
        assert!(verify_signature(payload.as_bytes(), &header, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_parse_checkout_completed() {
        let event = parse_event(checkout_payload().as_bytes()).unwrap();
        assert_eq!(
            event,
            WebhookEvent::CheckoutCompleted(CheckoutCompleted {
                session_id: "cs_1".to_string(),
                escola_id: "e1".to_string(),
                plano_id: "p1".to_string(),
            })
        );
    }

    #[test]
    fn test_other_events_ignored() {
        let payload = serde_json::json!({
            "type": "invoice.paid",
            "data": { "object": { "id": "in_1" } }
        })
        .to_string();
        assert_eq!(
            parse_event(payload.as_bytes()).unwrap(),
            WebhookEvent::Ignored {
                event_type: "invoice.paid".to_string()
            }
        );

        let no_metadata = serde_json::json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_2" } }
        })
        .to_string();
        assert!(matches!(
            parse_event(no_metadata.as_bytes()).unwrap(),
            WebhookEvent::Ignored { .. }
        ));
    }
}
