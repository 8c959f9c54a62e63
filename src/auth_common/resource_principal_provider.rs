//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Resource-principal profile provider (§4.1.4): reads
//! `OCI_RESOURCE_PRINCIPAL_*` environment variables. The RPST and PEM may
//! each be supplied as a literal value or as an absolute file path; path-
//! sourced values are re-read on every refresh to observe rotation.
use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use super::key_utils::parse_rsa_private_key;
use super::profile::{AuthenticationProfile, ProfileProvider};
use super::security_token::SecurityToken;
use crate::error::{ap_error, ia_error, NoSQLError};

const VERSION_VAR: &str = "OCI_RESOURCE_PRINCIPAL_VERSION";
const RPST_VAR: &str = "OCI_RESOURCE_PRINCIPAL_RPST";
const PEM_VAR: &str = "OCI_RESOURCE_PRINCIPAL_PRIVATE_PEM";
const PEM_PASSPHRASE_VAR: &str = "OCI_RESOURCE_PRINCIPAL_PRIVATE_PEM_PASSPHRASE";
const REGION_VAR: &str = "OCI_RESOURCE_PRINCIPAL_REGION";
const REQUIRED_VERSION: &str = "2.2";

#[derive(Debug, Clone)]
enum ValueSource {
    Literal(String),
    Path(std::path::PathBuf),
}

impl ValueSource {
    fn classify(raw: &str) -> ValueSource {
        let p = Path::new(raw);
        if p.is_absolute() {
            ValueSource::Path(p.to_path_buf())
        } else {
            ValueSource::Literal(raw.to_string())
        }
    }

    fn resolve(&self) -> Result<String, NoSQLError> {
        match self {
            ValueSource::Literal(s) => Ok(s.clone()),
            ValueSource::Path(p) => std::fs::read_to_string(p)
                .map(|s| s.trim().to_string())
                .map_err(|e| ap_error!("failed to read {}: {}", p.display(), e)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ResourcePrincipalProvider {
    rpst_source: ValueSource,
    pem_source: ValueSource,
    passphrase: Option<Vec<u8>>,
    region: String,
    token: Mutex<Option<SecurityToken>>,
}

impl ResourcePrincipalProvider {
    /// Reads the `OCI_RESOURCE_PRINCIPAL_*` environment variables, per §4.1.4.
    pub(crate) fn from_env() -> Result<Self, NoSQLError> {
        let version = std::env::var(VERSION_VAR)
            .map_err(|_| ia_error!("{} must be set", VERSION_VAR))?;
        if version != REQUIRED_VERSION {
            return Err(ia_error!(
                "unsupported {}='{}': only '{}' is supported",
                VERSION_VAR,
                version,
                REQUIRED_VERSION
            ));
        }
        let rpst = std::env::var(RPST_VAR).map_err(|_| ia_error!("{} must be set", RPST_VAR))?;
        let pem = std::env::var(PEM_VAR).map_err(|_| ia_error!("{} must be set", PEM_VAR))?;
        let passphrase = std::env::var(PEM_PASSPHRASE_VAR).ok().map(String::into_bytes);
        let region =
            std::env::var(REGION_VAR).map_err(|_| ia_error!("{} must be set", REGION_VAR))?;

        Ok(ResourcePrincipalProvider {
            rpst_source: ValueSource::classify(&rpst),
            pem_source: ValueSource::classify(&pem),
            passphrase,
            region,
            token: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ProfileProvider for ResourcePrincipalProvider {
    async fn get_profile(&self, _force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        let rpst = self.rpst_source.resolve()?;
        let pem = self.pem_source.resolve()?;
        let token = SecurityToken::parse(&rpst)?;
        let private_key = parse_rsa_private_key(&pem, self.passphrase.as_deref())?;
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(AuthenticationProfile {
            key_id: format!("ST${}", token.raw),
            private_key,
            tenant_id: None,
        })
    }

    fn region_id(&self) -> Option<String> {
        Some(self.region.clone())
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

#[cfg(test)]
mod test {
    use super::*;
    use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
    use std::sync::Mutex as StdMutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: StdMutex<()> = StdMutex::new(());

    fn make_jwt(exp: i64) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(b"{}");
        let claims = BASE64_URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp).as_bytes());
        format!("{}.{}.sig", header, claims)
    }

    fn clear_env() {
        for v in [VERSION_VAR, RPST_VAR, PEM_VAR, PEM_PASSPHRASE_VAR, REGION_VAR] {
            std::env::remove_var(v);
        }
    }

    #[tokio::test]
    async fn test_literal_happy_path() {
        let _g = ENV_LOCK.lock().unwrap();
        clear_env();
        let rsa = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem =
            rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&rsa, rsa::pkcs8::LineEnding::LF)
                .unwrap();
        let jwt = make_jwt(4102444800);

        std::env::set_var(VERSION_VAR, "2.2");
        std::env::set_var(RPST_VAR, &jwt);
        std::env::set_var(PEM_VAR, pem.as_str());
        std::env::set_var(REGION_VAR, "us-phoenix-1");

        let provider = ResourcePrincipalProvider::from_env().unwrap();
        let profile = provider.get_profile(false).await.unwrap();
        assert_eq!(profile.key_id, format!("ST${}", jwt));
        assert!(profile.tenant_id.is_none());
        assert_eq!(provider.region_id().as_deref(), Some("us-phoenix-1"));
        clear_env();
    }

    #[tokio::test]
    async fn test_wrong_version_rejected() {
        let _g = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(VERSION_VAR, "1.0");
        assert!(ResourcePrincipalProvider::from_env().is_err());
        clear_env();
    }

    #[tokio::test]
    async fn test_missing_version_rejected() {
        let _g = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(ResourcePrincipalProvider::from_env().is_err());
    }
}
