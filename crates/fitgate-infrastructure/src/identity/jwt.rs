//! JWT payload decoding.
//!
//! Reads the claims section of a compact JWS the way the browser identity
//! library does: base64url-decode the middle part and parse it as JSON. The
//! signature is not checked; the token was obtained from the provider over
//! the PKCE exchange and is only inspected, never trusted for authorization.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use fitgate_core::error::{FitgateError, Result};
use serde_json::Value;

/// Decodes the payload of `header.payload.signature`.
pub fn decode_claims(token: &str) -> Result<Value> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => {
            return Err(FitgateError::invalid_claims(
                "token is not a compact JWT (expected three dot-separated parts)",
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| FitgateError::Serialization {
            format: "base64".to_string(),
            message: e.to_string(),
        })?;

    let claims: Value = serde_json::from_slice(&bytes)?;
    if !claims.is_object() {
        return Err(FitgateError::invalid_claims("JWT payload is not a JSON object"));
    }
    Ok(claims)
}

/// Builds an unsigned token around `claims`; used by tests and local tooling.
pub fn encode_unsigned(claims: &Value) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{}.{}.", header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_payload() {
        let token = encode_unsigned(&json!({ "sub": "u1", "email": "a@b.c" })).unwrap();
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims["sub"], "u1");
        assert_eq!(claims["email"], "a@b.c");
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"sub":"u22"}"#);
        assert!(payload.ends_with('='));
        let token = format!("h.{}.s", payload);
        assert_eq!(decode_claims(&token).unwrap()["sub"], "u22");
    }

    #[test]
    fn test_rejects_opaque_tokens() {
        assert!(decode_claims("abc").is_err());
        assert!(decode_claims("a.b").is_err());
        assert!(decode_claims("a..c").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
    }

    #[test]
    fn test_rejects_non_object_payload() {
        let payload = URL_SAFE_NO_PAD.encode(b"[1,2]");
        let err = decode_claims(&format!("h.{}.s", payload)).unwrap_err();
        assert!(matches!(err, FitgateError::InvalidClaims(_)));
    }
}
