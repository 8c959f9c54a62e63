//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Instance-principal profile provider (§4.1.5): exchanges the instance's
//! IMDS-issued X.509 identity for a short-lived security token via the IAM
//! federation endpoint.
use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::Client;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use sha2::{Digest as _, Sha256};
use std::sync::Mutex;
use std::time::Duration;

use super::http_auth_client::{build_client, execute_json, execute_text};
use super::key_utils::{format_fingerprint, parse_rsa_private_key};
use super::profile::{AuthenticationProfile, ProfileProvider};
use super::security_token::SecurityToken;
use crate::error::{ap_error, NoSQLError};

const IMDS_V2_BASE: &str = "http://169.254.169.254/opc/v2/";
const IMDS_V1_BASE: &str = "http://169.254.169.254/opc/v1/";
const IMDS_BEARER: &str = "Oracle";
const FED_KEYID_PURPOSE: &str = "fed-x509";

#[derive(Debug)]
struct Pinned {
    tenant_id: String,
    region: String,
    token: SecurityToken,
}

#[derive(Debug)]
pub(crate) struct InstancePrincipalProvider {
    client: Client,
    federation_endpoint: Option<String>,
    state: Mutex<Option<Pinned>>,
}

impl InstancePrincipalProvider {
    pub(crate) fn new(
        federation_endpoint: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, NoSQLError> {
        let client = build_client(request_timeout, None, false)?;
        Ok(InstancePrincipalProvider {
            client,
            federation_endpoint,
            state: Mutex::new(None),
        })
    }

    async fn imds_get(&self, path: &str) -> Result<String, NoSQLError> {
        let v2_url = format!("{}{}", IMDS_V2_BASE, path);
        let req = self
            .client
            .get(&v2_url)
            .header("Authorization", format!("Bearer {}", IMDS_BEARER));
        let (status, body) = execute_text(&self.client, req).await?;
        if status == 404 {
            tracing::debug!(path, "IMDS v2 returned 404, falling back to v1");
            let v1_url = format!("{}{}", IMDS_V1_BASE, path);
            let req = self.client.get(&v1_url);
            let (status, body) = execute_text(&self.client, req).await?;
            if status >= 300 {
                return Err(ap_error!("IMDS v1 {} returned status {}", path, status));
            }
            return Ok(body);
        }
        if status >= 300 {
            return Err(ap_error!("IMDS v2 {} returned status {}", path, status));
        }
        Ok(body)
    }

    async fn resolve_region_and_federation_endpoint(&self) -> Result<(String, String), NoSQLError> {
        let region = self.imds_get("instance/region").await?.trim().to_string();
        let endpoint = match &self.federation_endpoint {
            Some(e) => e.clone(),
            None => format!("https://auth.{}.oraclecloud.com", region),
        };
        Ok((region, endpoint))
    }

    fn extract_tenant_id(leaf_cert_pem: &str) -> Result<String, NoSQLError> {
        let body: String = leaf_cert_pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();
        let der = BASE64_STANDARD
            .decode(body.as_bytes())
            .map_err(|e| ap_error!("malformed leaf certificate: {}", e))?;
        let text = String::from_utf8_lossy(&der);
        for marker in ["opc-tenant:", "opc-identity:"] {
            if let Some(idx) = text.find(marker) {
                let rest = &text[idx + marker.len()..];
                let end = rest
                    .find(|c: char| c == ',' || c == ' ' || c == '\n' || c == '\r' || c == '\0')
                    .unwrap_or(rest.len());
                return Ok(rest[..end].to_string());
            }
        }
        Err(ap_error!(
            "instance leaf certificate subject has no opc-tenant/opc-identity field"
        ))
    }

    async fn federate(
        &self,
        tenant_id: &str,
        region: &str,
        endpoint: &str,
    ) -> Result<SecurityToken, NoSQLError> {
        let leaf_pem = self.imds_get("identity/cert.pem").await?;
        let instance_key_pem = self.imds_get("identity/key.pem").await?;
        let intermediate_pem = self.imds_get("identity/intermediate.pem").await?;
        let instance_key = parse_rsa_private_key(&instance_key_pem, None)?;

        let session_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .map_err(|e| ap_error!("failed to generate session key pair: {}", e))?;
        let session_public_der = rsa::pkcs8::EncodePublicKey::to_public_key_der(
            &session_key.to_public_key(),
        )
        .map_err(|e| ap_error!("failed to encode session public key: {}", e))?;
        let session_public_b64 = BASE64_STANDARD.encode(session_public_der.as_bytes());

        let leaf_strip: String = leaf_pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();
        let intermediate_strip: String = intermediate_pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();

        let body = serde_json::json!({
            "publicKey": session_public_b64,
            "certificate": leaf_strip,
            "purpose": "DEFAULT",
            "intermediateCertificates": [intermediate_strip],
        });
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| ap_error!("failed to encode federation request body: {}", e))?;

        let fingerprint = format_fingerprint(&Sha256::digest(
            BASE64_STANDARD
                .decode(leaf_strip.as_bytes())
                .unwrap_or_default(),
        ));
        let key_id = format!("{}/{}/{}", tenant_id, FED_KEYID_PURPOSE, fingerprint);

        let url = format!("{}/v1/x509", endpoint);
        let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let host = url::Url::parse(&url)
            .map_err(|e| ap_error!("invalid federation endpoint url: {}", e))?
            .host_str()
            .unwrap_or_default()
            .to_string();
        let content_sha256 = BASE64_STANDARD.encode(Sha256::digest(&body_bytes));

        let signing_string = format!(
            "date: {}\n(request-target): post /v1/x509\ncontent-length: {}\ncontent-type: application/json\nx-content-sha256: {}",
            date,
            body_bytes.len(),
            content_sha256
        );
        let signing_key = SigningKey::<Sha256>::new(instance_key);
        let signature = signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), signing_string.as_bytes())
            .map_err(|e| ap_error!("failed to sign federation request: {}", e))?;
        let signature_b64 = BASE64_STANDARD.encode(signature.to_bytes());

        let authorization = format!(
            "Signature headers=\"date (request-target) content-length content-type x-content-sha256\",keyId=\"{}\",algorithm=\"rsa-sha256\",signature=\"{}\",version=\"1\"",
            key_id, signature_b64
        );

        let req = self
            .client
            .post(&url)
            .header("date", date)
            .header("host", host)
            .header("content-type", "application/json")
            .header("content-length", body_bytes.len().to_string())
            .header("x-content-sha256", content_sha256)
            .header("Authorization", authorization)
            .body(body_bytes);

        let resp = execute_json(&self.client, req).await?;
        let token_str = resp
            .get("token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ap_error!("federation response missing 'token'"))?;
        SecurityToken::parse(token_str).map(|t| {
            let _ = region;
            t
        })
    }
}

#[async_trait]
impl ProfileProvider for InstancePrincipalProvider {
    async fn get_profile(&self, force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        let cached_raw = {
            let guard = self.state.lock().unwrap();
            if force_refresh {
                None
            } else {
                guard
                    .as_ref()
                    .filter(|p| p.token.is_valid(Duration::from_secs(10)))
                    .map(|p| p.token.raw.clone())
            }
        };
        if let Some(raw) = cached_raw {
            let private_key = parse_rsa_private_key(&self.imds_get("identity/key.pem").await?, None)?;
            return Ok(AuthenticationProfile {
                key_id: format!("ST${}", raw),
                private_key,
                tenant_id: None,
            });
        }

        let (region, endpoint) = self.resolve_region_and_federation_endpoint().await?;
        let leaf_pem = self.imds_get("identity/cert.pem").await?;
        let tenant_id = Self::extract_tenant_id(&leaf_pem)?;

        {
            let guard = self.state.lock().unwrap();
            if let Some(prev) = guard.as_ref() {
                if prev.tenant_id != tenant_id {
                    return Err(ap_error!(
                        "instance tenant id changed across refreshes: was '{}', now '{}'",
                        prev.tenant_id,
                        tenant_id
                    ));
                }
            }
        }

        let token = self.federate(&tenant_id, &region, &endpoint).await?;
        let instance_key_pem = self.imds_get("identity/key.pem").await?;
        let instance_key = parse_rsa_private_key(&instance_key_pem, None)?;

        *self.state.lock().unwrap() = Some(Pinned {
            tenant_id,
            region,
            token: token.clone(),
        });

        Ok(AuthenticationProfile {
            key_id: format!("ST${}", token.raw),
            private_key: instance_key,
            tenant_id: None,
        })
    }

    fn region_id(&self) -> Option<String> {
        self.state.lock().unwrap().as_ref().map(|p| p.region.clone())
    }

    async fn is_profile_valid(&self) -> bool {
        let guard = self.state.lock().unwrap();
        match guard.as_ref() {
            Some(p) => p.token.is_valid(Duration::from_secs(10)),
            None => false,
        }
    }

    async fn profile_ttl(&self) -> Duration {
        let guard = self.state.lock().unwrap();
        guard
            .as_ref()
            .map(|p| p.token.expires_in())
            .unwrap_or(Duration::ZERO)
    }

    async fn dispose(&self) {
        *self.state.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extract_tenant_id_from_marker() {
        let mut der = Vec::new();
        der.extend_from_slice(b"junkbytes=opc-tenant:ocid1.tenancy.oc1..aaaa, restofsubject");
        let b64 = BASE64_STANDARD.encode(&der);
        let pem = format!("-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n", b64);
        let tenant = InstancePrincipalProvider::extract_tenant_id(&pem).unwrap();
        assert_eq!(tenant, "ocid1.tenancy.oc1..aaaa");
    }

    #[test]
    fn test_extract_tenant_id_missing_marker() {
        let b64 = BASE64_STANDARD.encode(b"nothing interesting here");
        let pem = format!("-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n", b64);
        assert!(InstancePrincipalProvider::extract_tenant_id(&pem).is_err());
    }
}
