//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Session-token profile provider (§4.1.3): wraps the OCI config-file
//! provider, additionally reading the file named by `security_token_file`
//! and parsing it as a JWT. The outer request is still signed with the RSA
//! key from the config profile, but keyed by the session token rather than
//! the raw user/tenancy/fingerprint triple.
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::config_file_provider::read_section;
use super::file_utils::expand_user_home;
use super::profile::{AuthenticationProfile, Credentials, PrivateKeySource, ProfileProvider};
use super::security_token::SecurityToken;
use super::user_principal_provider::UserPrincipalProvider;
use crate::error::{ia_error, NoSQLError};

const PROFILE_EXPIRE_BEFORE: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub(crate) struct SessionTokenProvider {
    inner: UserPrincipalProvider,
    token_file: String,
    token: Mutex<Option<SecurityToken>>,
}

impl SessionTokenProvider {
    pub(crate) fn new(path: &str, profile_name: &str) -> Result<Self, NoSQLError> {
        let section = read_section(path, profile_name)?;
        let token_file = section.security_token_file.clone().ok_or_else(|| {
            ia_error!(
                "OCI config profile '{}' is missing 'security_token_file' required for session-token auth",
                profile_name
            )
        })?;
        let key_path = std::path::Path::new(&expand_user_home(&section.key_file)).to_path_buf();
        let credentials = Credentials {
            tenancy_id: section.tenancy,
            user_id: section.user,
            fingerprint: section.fingerprint,
            private_key: PrivateKeySource::PemFile(key_path),
            passphrase: section.pass_phrase.map(String::into_bytes),
        };
        let inner = UserPrincipalProvider::new(credentials, section.region)?;
        Ok(SessionTokenProvider {
            inner,
            token_file,
            token: Mutex::new(None),
        })
    }

    fn read_token(&self) -> Result<SecurityToken, NoSQLError> {
        let path = expand_user_home(&self.token_file);
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ia_error!("failed to read security token file {}: {}", path, e))?;
        SecurityToken::parse(&raw)
    }

    fn cached_or_reload(&self, force_refresh: bool) -> Result<SecurityToken, NoSQLError> {
        let mut guard = self.token.lock().unwrap();
        if !force_refresh {
            if let Some(tok) = guard.as_ref() {
                if tok.is_valid(PROFILE_EXPIRE_BEFORE) {
                    return Ok(tok.clone());
                }
            }
        }
        let tok = self.read_token()?;
        *guard = Some(tok.clone());
        Ok(tok)
    }
}

#[async_trait]
impl ProfileProvider for SessionTokenProvider {
    async fn get_profile(&self, force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        let token = self.cached_or_reload(force_refresh)?;
        let mut profile = self.inner.get_profile(force_refresh).await?;
        profile.key_id = format!("ST${}", token.raw);
        profile.tenant_id = None;
        Ok(profile)
    }

    fn region_id(&self) -> Option<String> {
        self.inner.region_id()
    }

    async fn is_profile_valid(&self) -> bool {
        let guard = self.token.lock().unwrap();
        match guard.as_ref() {
            Some(tok) => tok.is_valid(PROFILE_EXPIRE_BEFORE),
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
        self.inner.dispose().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
    use std::io::Write;

    fn write_key_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let rsa = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem =
            rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&rsa, rsa::pkcs8::LineEnding::LF)
                .unwrap();
        let path = dir.path().join("oci_api_key.pem");
        std::fs::write(&path, pem.as_bytes()).unwrap();
        path
    }

    fn make_jwt(exp: i64) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(b"{}");
        let claims = BASE64_URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp).as_bytes());
        format!("{}.{}.sig", header, claims)
    }

    #[tokio::test]
    async fn test_key_id_prefixed_with_st_dollar() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = write_key_file(&dir);
        let token_path = dir.path().join("token");
        let token = make_jwt(4102444800);
        std::fs::write(&token_path, &token).unwrap();

        let config_path = dir.path().join("config");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(
            f,
            "[DEFAULT]\ntenancy=ocid1.tenancy.oc1..aaaa\nuser=ocid1.user.oc1..bbbb\nfingerprint=aa:bb\nkey_file={}\nsecurity_token_file={}\n",
            key_path.display(),
            token_path.display()
        )
        .unwrap();

        let provider = SessionTokenProvider::new(config_path.to_str().unwrap(), "DEFAULT").unwrap();
        let profile = provider.get_profile(false).await.unwrap();
        assert_eq!(profile.key_id, format!("ST${}", token));
        assert!(profile.tenant_id.is_none());
        assert!(provider.is_profile_valid().await);
    }

    #[tokio::test]
    async fn test_missing_security_token_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = write_key_file(&dir);
        let config_path = dir.path().join("config");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(
            f,
            "[DEFAULT]\ntenancy=ocid1.tenancy.oc1..aaaa\nuser=ocid1.user.oc1..bbbb\nfingerprint=aa:bb\nkey_file={}\n",
            key_path.display()
        )
        .unwrap();
        assert!(SessionTokenProvider::new(config_path.to_str().unwrap(), "DEFAULT").is_err());
    }
}
