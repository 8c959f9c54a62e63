//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Parsing for the JWT-shaped security tokens returned by the federation and
//! OKE workload-identity endpoints: `header.claims.signature`, of which only
//! the middle (claims) segment is ever decoded by this client.
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::key_utils::base64url_decode;
use crate::error::{ia_error, NoSQLError};

/// A parsed session/resource-principal security token: the raw JWT string
/// plus the claims this client cares about.
#[derive(Debug, Clone)]
pub(crate) struct SecurityToken {
    pub(crate) raw: String,
    pub(crate) expiration: SystemTime,
    pub(crate) tenant_id: Option<String>,
    pub(crate) compartment_id: Option<String>,
}

impl SecurityToken {
    /// Parses `raw`, a dot-delimited JWT of at least 3 segments. Only the claims segment is
    /// base64url-decoded and interpreted; the header and signature segments
    /// are not validated, matching the existing trust model where the
    /// session token's authenticity is established by the channel it was
    /// retrieved over (IMDS, a federation TLS endpoint, or the Kubernetes
    /// API server), not by verifying its signature locally.
    pub(crate) fn parse(raw: &str) -> Result<SecurityToken, NoSQLError> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() < 3 {
            return Err(ia_error!(
                "malformed security token: expected at least 3 dot-delimited segments, got {}",
                parts.len()
            ));
        }
        let claims_bytes = base64url_decode(parts[1])?;
        let claims: Value = serde_json::from_slice(&claims_bytes)
            .map_err(|e| ia_error!("malformed security token claims: {}", e))?;

        let exp = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| ia_error!("security token claims missing 'exp'"))?;
        let expiration = UNIX_EPOCH + Duration::from_secs(exp.max(0) as u64);

        let tenant_id = claims
            .get("res_tenant")
            .and_then(Value::as_str)
            .map(str::to_string);
        let compartment_id = claims
            .get("res_compartment")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(SecurityToken {
            raw: raw.to_string(),
            expiration,
            tenant_id,
            compartment_id,
        })
    }

    /// True if the token's `exp` claim is still `skew` in the future of now.
    pub(crate) fn is_valid(&self, skew: Duration) -> bool {
        match self.expiration.checked_sub(skew) {
            Some(deadline) => deadline > SystemTime::now(),
            None => false,
        }
    }

    pub(crate) fn expires_in(&self) -> Duration {
        self.expiration
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth_common::key_utils::base64url_decode as b64dec;
    use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};

    fn make_token(claims_json: &str) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(b"{}");
        let claims = BASE64_URL_SAFE_NO_PAD.encode(claims_json.as_bytes());
        format!("{}.{}.sig", header, claims)
    }

    #[test]
    fn test_parse_valid_token() {
        let tok = make_token(r#"{"exp":4102444800,"res_tenant":"ocid1.tenancy.oc1..aaa","res_compartment":"ocid1.compartment.oc1..bbb"}"#);
        let parsed = SecurityToken::parse(&tok).unwrap();
        assert_eq!(parsed.tenant_id.as_deref(), Some("ocid1.tenancy.oc1..aaa"));
        assert_eq!(
            parsed.compartment_id.as_deref(),
            Some("ocid1.compartment.oc1..bbb")
        );
        assert!(parsed.is_valid(Duration::from_secs(0)));
    }

    #[test]
    fn test_parse_expired_token() {
        let tok = make_token(r#"{"exp":1}"#);
        let parsed = SecurityToken::parse(&tok).unwrap();
        assert!(!parsed.is_valid(Duration::from_secs(0)));
    }

    #[test]
    fn test_parse_rejects_wrong_segment_count() {
        assert!(SecurityToken::parse("a.b").is_err());
        assert!(SecurityToken::parse("a.b.c.d").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_exp() {
        let tok = make_token(r#"{"res_tenant":"ocid1.tenancy.oc1..aaa"}"#);
        assert!(SecurityToken::parse(&tok).is_err());
    }

    #[test]
    fn test_base64url_roundtrip_sanity() {
        let encoded = BASE64_URL_SAFE_NO_PAD.encode(b"hello world");
        assert_eq!(b64dec(&encoded).unwrap(), b"hello world");
    }
}
