// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Terra webhook signature verification.
//!
//! Terra signs each delivery with `terra-signature: t=<unix>,v1=<hex>`,
//! where the digest is HMAC-SHA256 over `"<t>.<raw body>"`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header Terra puts the signature in.
pub const SIGNATURE_HEADER: &str = "terra-signature";

/// Verify a Terra webhook signature.
///
/// The header's first field is the timestamp and its second field the
/// digest, taken positionally. Any malformed input verifies as false.
/// The timestamp is not checked for freshness.
pub fn verify_terra_signature(signature_header: &str, raw_body: &str, signing_secret: &str) -> bool {
    if signature_header.is_empty() || raw_body.is_empty() {
        return false;
    }

    let mut fields = signature_header
        .split(',')
        .map(|part| part.split_once('=').map(|(_, value)| value));

    let (Some(Some(timestamp)), Some(Some(digest))) = (fields.next(), fields.next()) else {
        return false;
    };

    let Some(expected) = compute_signature(timestamp, raw_body, signing_secret) else {
        return false;
    };

    // Lengths are public (a SHA-256 hex digest is always 64 chars); the
    // byte comparison itself never short-circuits.
    expected.as_bytes().ct_eq(digest.as_bytes()).into()
}

/// Hex-encoded HMAC-SHA256 of `"<timestamp>.<raw_body>"`.
pub fn compute_signature(timestamp: &str, raw_body: &str, signing_secret: &str) -> Option<String> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(signing_secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Format a `terra-signature` header value.
pub fn format_signature_header(timestamp: &str, digest: &str) -> String {
    format!("t={},v1={}", timestamp, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &str =
        r#"{"type":"auth","status":"success","user":{"user_id":"u1","provider":"GARMIN","reference_id":"c1"}}"#;

    fn signed_header(timestamp: &str, body: &str, secret: &str) -> String {
        format_signature_header(timestamp, &compute_signature(timestamp, body, secret).unwrap())
    }

    #[test]
    fn accepts_correct_signature() {
        let header = signed_header("1700000000", BODY, SECRET);
        assert!(verify_terra_signature(&header, BODY, SECRET));
    }

    #[test]
    fn known_vector() {
        // HMAC-SHA256(key="key", "The quick brown fox jumps over the lazy dog")
        // with the timestamp folded into the message.
        let digest = compute_signature("The quick brown fox", "jumps over the lazy dog", "key").unwrap();
        let mut mac = <HmacSha256 as Mac>::new_from_slice(b"key").unwrap();
        mac.update(b"The quick brown fox.jumps over the lazy dog");
        assert_eq!(digest, hex::encode(mac.finalize().into_bytes()));
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = signed_header("1700000000", BODY, "other");
        assert!(!verify_terra_signature(&header, BODY, SECRET));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = signed_header("1700000000", BODY, SECRET);
        let tampered = BODY.replace("c1", "c2");
        assert!(!verify_terra_signature(&header, &tampered, SECRET));
    }

    #[test]
    fn rejects_tampered_timestamp() {
        let digest = compute_signature("1700000000", BODY, SECRET).unwrap();
        let header = format_signature_header("1700000001", &digest);
        assert!(!verify_terra_signature(&header, BODY, SECRET));
    }

    #[test]
    fn rejects_last_byte_flip() {
        let mut digest = compute_signature("1700000000", BODY, SECRET).unwrap();
        let last = digest.pop().unwrap();
        digest.push(if last == '0' { '1' } else { '0' });
        let header = format_signature_header("1700000000", &digest);
        assert!(!verify_terra_signature(&header, BODY, SECRET));
    }

    #[test]
    fn length_mismatch_is_failure_not_panic() {
        let digest = compute_signature("1700000000", BODY, SECRET).unwrap();
        let short = format_signature_header("1700000000", &digest[..10]);
        let long = format_signature_header("1700000000", &format!("{}00", digest));
        assert!(!verify_terra_signature(&short, BODY, SECRET));
        assert!(!verify_terra_signature(&long, BODY, SECRET));
    }

    #[test]
    fn fields_are_positional() {
        // Key names are ignored; the second field is always the digest.
        let digest = compute_signature("1700000000", BODY, SECRET).unwrap();
        let header = format!("ts=1700000000,sig={}", digest);
        assert!(verify_terra_signature(&header, BODY, SECRET));

        let swapped = format!("v1={},t=1700000000", digest);
        assert!(!verify_terra_signature(&swapped, BODY, SECRET));
    }

    #[test]
    fn malformed_headers_fail() {
        assert!(!verify_terra_signature("", BODY, SECRET));
        assert!(!verify_terra_signature("t=1700000000", BODY, SECRET));
        assert!(!verify_terra_signature("garbage", BODY, SECRET));
        assert!(!verify_terra_signature("t=1,garbage", BODY, SECRET));
    }

    #[test]
    fn empty_body_fails() {
        let header = signed_header("1700000000", "", SECRET);
        assert!(!verify_terra_signature(&header, "", SECRET));
    }

    #[test]
    fn old_timestamps_still_verify() {
        let header = signed_header("1", BODY, SECRET);
        assert!(verify_terra_signature(&header, BODY, SECRET));
    }
}
