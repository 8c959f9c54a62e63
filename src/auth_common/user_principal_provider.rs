//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Static user-principal profile provider (§4.1.1): loads the RSA key lazily
//! from one of `{RSA object, PEM string, PEM file}`, decrypting with an
//! optional passphrase, and produces an effectively immortal profile.
use async_trait::async_trait;
use rsa::RsaPrivateKey;
use std::sync::Mutex;
use std::time::Duration;
use zeroize::Zeroize;

use super::key_utils::{parse_rsa_private_key, validate_ocid};
use super::profile::{AuthenticationProfile, Credentials, PrivateKeySource, ProfileProvider, IMMORTAL_TTL};
use crate::error::{ia_error, NoSQLError};

#[derive(Debug)]
pub(crate) struct UserPrincipalProvider {
    credentials: Credentials,
    key_id: String,
    region: Option<String>,
    // Taken out of `credentials` at construction so `dispose()` can zero it;
    // `None` once disposed (or if no passphrase was ever supplied).
    passphrase: Mutex<Option<Vec<u8>>>,
    // Lazily populated on first `get_profile`; `None` until then.
    key: Mutex<Option<RsaPrivateKey>>,
}

impl UserPrincipalProvider {
    pub(crate) fn new(mut credentials: Credentials, region: Option<String>) -> Result<Self, NoSQLError> {
        validate_ocid("tenancy_id", &credentials.tenancy_id)?;
        validate_ocid("user_id", &credentials.user_id)?;
        if credentials.fingerprint.is_empty() {
            return Err(ia_error!("fingerprint must not be empty"));
        }
        let key_id = credentials.key_id();
        let passphrase = credentials.passphrase.take();
        Ok(UserPrincipalProvider {
            credentials,
            key_id,
            region,
            passphrase: Mutex::new(passphrase),
            key: Mutex::new(None),
        })
    }

    fn load_key(&self) -> Result<RsaPrivateKey, NoSQLError> {
        let mut guard = self.key.lock().unwrap();
        if let Some(key) = guard.as_ref() {
            return Ok(key.clone());
        }
        let passphrase_guard = self.passphrase.lock().unwrap();
        let passphrase = passphrase_guard.as_deref();
        let key = match &self.credentials.private_key {
            PrivateKeySource::Rsa(rsa) => (**rsa).clone(),
            PrivateKeySource::Pem(pem) => parse_rsa_private_key(pem, passphrase)?,
            PrivateKeySource::PemFile(path) => {
                let pem = std::fs::read_to_string(path).map_err(|e| {
                    ia_error!("failed to read private key file {}: {}", path.display(), e)
                })?;
                parse_rsa_private_key(&pem, passphrase)?
            }
        };
        drop(passphrase_guard);
        *guard = Some(key.clone());
        Ok(key)
    }
}

#[async_trait]
impl ProfileProvider for UserPrincipalProvider {
    async fn get_profile(&self, _force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        tracing::debug!(key_id = %self.key_id, "loading user-principal profile");
        let key = self.load_key()?;
        Ok(AuthenticationProfile {
            key_id: self.key_id.clone(),
            private_key: key,
            tenant_id: Some(self.credentials.tenancy_id.clone()),
        })
    }

    fn region_id(&self) -> Option<String> {
        self.region.clone()
    }

    async fn is_profile_valid(&self) -> bool {
        true
    }

    async fn profile_ttl(&self) -> Duration {
        IMMORTAL_TTL
    }

    async fn dispose(&self) {
        let mut guard = self.key.lock().unwrap();
        *guard = None;
        let mut pguard = self.passphrase.lock().unwrap();
        if let Some(bytes) = pguard.as_mut() {
            bytes.zeroize();
        }
        *pguard = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_credentials() -> Credentials {
        let rsa = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        Credentials {
            tenancy_id: "ocid1.tenancy.oc1..aaaaaaaattuxbj75pnn3nksvzyidshdbrfmmeflv4kkemajroz2thvca4kba".to_string(),
            user_id: "ocid1.user.oc1..bbbbbbbbttuxbj75pnn3nksvzyidshdbrfmmeflv4kkemajroz2thvca4kba".to_string(),
            fingerprint: "aa:bb:cc:dd".to_string(),
            private_key: PrivateKeySource::Rsa(Box::new(rsa)),
            passphrase: None,
        }
    }

    #[tokio::test]
    async fn test_get_profile_key_id_format() {
        let creds = test_credentials();
        let expected_key_id = format!(
            "{}/{}/{}",
            creds.tenancy_id, creds.user_id, creds.fingerprint
        );
        let provider = UserPrincipalProvider::new(creds, Some("us-ashburn-1".to_string())).unwrap();
        let profile = provider.get_profile(false).await.unwrap();
        assert_eq!(profile.key_id, expected_key_id);
        assert!(profile.tenant_id.is_some());
        assert!(provider.is_profile_valid().await);
        assert_eq!(provider.profile_ttl().await, IMMORTAL_TTL);
    }

    #[tokio::test]
    async fn test_invalid_ocid_rejected() {
        let mut creds = test_credentials();
        creds.tenancy_id = "not-an-ocid".to_string();
        assert!(UserPrincipalProvider::new(creds, None).is_err());
    }

    #[tokio::test]
    async fn test_key_loaded_lazily_and_cached() {
        let creds = test_credentials();
        let provider = UserPrincipalProvider::new(creds, None).unwrap();
        assert!(provider.key.lock().unwrap().is_none());
        provider.get_profile(false).await.unwrap();
        assert!(provider.key.lock().unwrap().is_some());
    }
}
