//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! OKE workload-identity profile provider (§4.1.6): exchanges a Kubernetes
//! service-account token for a resource principal session token via the
//! cluster-local `resourcePrincipalSessionTokens` endpoint.
use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::Client;
use rsa::RsaPrivateKey;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use super::http_auth_client::{build_client, execute_text};
use super::profile::{AuthenticationProfile, ProfileProvider};
use super::security_token::SecurityToken;
use crate::error::{ap_error, ia_error, NoSQLError};

const DEFAULT_SA_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const DEFAULT_CA_CERT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
const CA_CERT_ENV: &str = "OCI_KUBERNETES_SERVICE_ACCOUNT_CERT_PATH";
const K8S_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
const OKE_TOKEN_PORT: u16 = 12250;

/// Where the pod's service-account bearer token comes from.
pub(crate) enum SaTokenSource {
    Literal(String),
    File(PathBuf),
    Callback(Box<dyn Fn() -> Result<String, NoSQLError> + Send + Sync>),
}

impl std::fmt::Debug for SaTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaTokenSource::Literal(_) => write!(f, "SaTokenSource::Literal(***)"),
            SaTokenSource::File(p) => write!(f, "SaTokenSource::File({})", p.display()),
            SaTokenSource::Callback(_) => write!(f, "SaTokenSource::Callback(<fn>)"),
        }
    }
}

impl Default for SaTokenSource {
    fn default() -> Self {
        SaTokenSource::File(PathBuf::from(DEFAULT_SA_TOKEN_PATH))
    }
}

impl SaTokenSource {
    fn resolve(&self) -> Result<String, NoSQLError> {
        match self {
            SaTokenSource::Literal(s) => Ok(s.clone()),
            SaTokenSource::File(p) => std::fs::read_to_string(p)
                .map(|s| s.trim().to_string())
                .map_err(|e| ap_error!("failed to read service account token {}: {}", p.display(), e)),
            SaTokenSource::Callback(f) => f(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct OkeWorkloadIdentityProvider {
    client: Client,
    token_endpoint: String,
    sa_token_source: SaTokenSource,
    token: Mutex<Option<SecurityToken>>,
}

impl OkeWorkloadIdentityProvider {
    pub(crate) fn new(
        sa_token_source: SaTokenSource,
        request_timeout: Duration,
    ) -> Result<Self, NoSQLError> {
        let host = std::env::var(K8S_HOST_ENV)
            .map_err(|_| ia_error!("{} must be set to use OKE workload identity", K8S_HOST_ENV))?;
        let ca_cert_path = std::env::var(CA_CERT_ENV)
            .unwrap_or_else(|_| DEFAULT_CA_CERT_PATH.to_string());
        let ca_cert = std::fs::read(&ca_cert_path).ok();
        let client = build_client(request_timeout, ca_cert.as_deref(), true)?;
        let token_endpoint = format!(
            "https://{}:{}/resourcePrincipalSessionTokens",
            host, OKE_TOKEN_PORT
        );
        Ok(OkeWorkloadIdentityProvider {
            client,
            token_endpoint,
            sa_token_source,
            token: Mutex::new(None),
        })
    }

    /// Strips the duplicated `ST$` prefix from the wrapper's token field, per
    /// §4.1.6: the response contains `{"token":"ST$ST$<jwt>"}`; this returns
    /// the bare `<jwt>` with both copies removed, so the caller can re-add a
    /// single `ST$` when building the key id.
    fn strip_duplicated_prefix(raw: &str) -> &str {
        let once = raw.strip_prefix("ST$").unwrap_or(raw);
        once.strip_prefix("ST$").unwrap_or(once)
    }
}

#[async_trait]
impl ProfileProvider for OkeWorkloadIdentityProvider {
    async fn get_profile(&self, _force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        let sa_token = self.sa_token_source.resolve()?;
        // Validate the SA token parses as a well-formed JWT before using it.
        SecurityToken::parse(&sa_token)?;

        let session_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .map_err(|e| ap_error!("failed to generate session key pair: {}", e))?;
        let spki = rsa::pkcs8::EncodePublicKey::to_public_key_der(&session_key.to_public_key())
            .map_err(|e| ap_error!("failed to encode session public key: {}", e))?;
        let pod_key_b64 = BASE64_STANDARD.encode(spki.as_bytes());

        let req = self
            .client
            .post(&self.token_endpoint)
            .header("Authorization", format!("Bearer {}", sa_token))
            .header("opc-request-id", uuid_like_request_id())
            .json(&serde_json::json!({ "podKey": pod_key_b64 }));

        let (status, body) = execute_text(&self.client, req).await?;
        if status >= 300 {
            return Err(ap_error!("OKE token endpoint returned status {}", status));
        }
        let wrapper_bytes = BASE64_STANDARD
            .decode(body.trim().as_bytes())
            .map_err(|e| ap_error!("malformed base64 OKE token wrapper: {}", e))?;
        let wrapper: serde_json::Value = serde_json::from_slice(&wrapper_bytes)
            .map_err(|e| ap_error!("malformed OKE token wrapper JSON: {}", e))?;
        let raw_token = wrapper
            .get("token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ap_error!("OKE token wrapper missing 'token'"))?;

        let trimmed = Self::strip_duplicated_prefix(raw_token);
        let token = SecurityToken::parse(trimmed)?;
        *self.token.lock().unwrap() = Some(token.clone());

        Ok(AuthenticationProfile {
            key_id: format!("ST${}", trimmed),
            private_key: session_key,
            tenant_id: None,
        })
    }

    async fn is_profile_valid(&self) -> bool {
        let guard = self.token.lock().unwrap();
        match guard.as_ref() {
            Some(tok) => tok.is_valid(Duration::from_secs(10)),
            None => false,
        }
    }

    async fn profile_ttl(&self) -> Duration {
        let guard = self.token.lock().unwrap();
        guard
            .as_ref()
            .map(SecurityToken::expires_in)
            .unwrap_or(Duration::ZERO)
    }

    async fn dispose(&self) {
        *self.token.lock().unwrap() = None;
    }
}

// OKE does not require a globally-unique request id, only a present one for
// server-side log correlation; a per-call random hex string is sufficient.
fn uuid_like_request_id() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strip_duplicated_prefix() {
        assert_eq!(
            OkeWorkloadIdentityProvider::strip_duplicated_prefix("ST$ST$abc.def.ghi"),
            "abc.def.ghi"
        );
    }

    #[test]
    fn test_strip_no_prefix_present() {
        assert_eq!(
            OkeWorkloadIdentityProvider::strip_duplicated_prefix("abc.def.ghi"),
            "abc.def.ghi"
        );
    }

    #[test]
    fn test_missing_k8s_host_env_errors() {
        std::env::remove_var(K8S_HOST_ENV);
        let result = OkeWorkloadIdentityProvider::new(SaTokenSource::default(), Duration::from_secs(120));
        assert!(result.is_err());
    }
}
