//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! OCI config-file profile provider (§4.1.2): parses an INI-like file
//! (default `~/.oci/config`, default section `DEFAULT`) and delegates signing
//! to a `UserPrincipalProvider` built from the assembled credentials.
use async_trait::async_trait;
use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::file_utils::expand_user_home;
use super::profile::{AuthenticationProfile, Credentials, PrivateKeySource, ProfileProvider};
use super::user_principal_provider::UserPrincipalProvider;
use crate::error::{ia_error, NoSQLError};

pub(crate) const DEFAULT_CONFIG_PATH: &str = "~/.oci/config";
pub(crate) const DEFAULT_PROFILE_NAME: &str = "DEFAULT";

/// The raw fields read from one `[profile]` section, before credential
/// validation. Also used by the session-token provider, which adds its own
/// `security_token_file` handling on top.
pub(crate) struct ConfigFileSection {
    pub(crate) tenancy: String,
    pub(crate) user: String,
    pub(crate) fingerprint: String,
    pub(crate) key_file: String,
    pub(crate) pass_phrase: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) security_token_file: Option<String>,
}

pub(crate) fn read_section(
    path: &str,
    profile_name: &str,
) -> Result<ConfigFileSection, NoSQLError> {
    let expanded = expand_user_home(path);
    let ini = Ini::load_from_file(&expanded)
        .map_err(|e| ia_error!("failed to read OCI config file {}: {}", expanded, e))?;
    let section = ini.section(Some(profile_name)).ok_or_else(|| {
        ia_error!(
            "OCI config file {} has no '[{}]' section",
            expanded,
            profile_name
        )
    })?;

    let get = |key: &str| -> Result<String, NoSQLError> {
        section
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| ia_error!("OCI config profile '{}' missing key '{}'", profile_name, key))
    };

    Ok(ConfigFileSection {
        tenancy: get("tenancy")?,
        user: get("user")?,
        fingerprint: get("fingerprint")?,
        key_file: get("key_file")?,
        pass_phrase: section.get("pass_phrase").map(str::to_string),
        region: section.get("region").map(str::to_string),
        security_token_file: section.get("security_token_file").map(str::to_string),
    })
}

#[derive(Debug)]
pub(crate) struct ConfigFileProvider {
    inner: UserPrincipalProvider,
}

impl ConfigFileProvider {
    pub(crate) fn new(path: &str, profile_name: &str) -> Result<Self, NoSQLError> {
        let section = read_section(path, profile_name)?;
        let key_path: PathBuf = Path::new(&expand_user_home(&section.key_file)).to_path_buf();
        let credentials = Credentials {
            tenancy_id: section.tenancy,
            user_id: section.user,
            fingerprint: section.fingerprint,
            private_key: PrivateKeySource::PemFile(key_path),
            passphrase: section.pass_phrase.map(String::into_bytes),
        };
        let inner = UserPrincipalProvider::new(credentials, section.region)?;
        Ok(ConfigFileProvider { inner })
    }

    pub(crate) fn default_path_default_profile() -> Result<Self, NoSQLError> {
        Self::new(DEFAULT_CONFIG_PATH, DEFAULT_PROFILE_NAME)
    }
}

#[async_trait]
impl ProfileProvider for ConfigFileProvider {
    async fn get_profile(&self, force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        self.inner.get_profile(force_refresh).await
    }

    fn region_id(&self) -> Option<String> {
        self.inner.region_id()
    }

    async fn is_profile_valid(&self) -> bool {
        self.inner.is_profile_valid().await
    }

    async fn profile_ttl(&self) -> Duration {
        self.inner.profile_ttl().await
    }

    async fn dispose(&self) {
        self.inner.dispose().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_key_file(dir: &tempfile::TempDir) -> PathBuf {
        let rsa = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem =
            rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&rsa, rsa::pkcs8::LineEnding::LF)
                .unwrap();
        let path = dir.path().join("oci_api_key.pem");
        std::fs::write(&path, pem.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_parses_default_section() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = write_key_file(&dir);
        let config_path = dir.path().join("config");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(
            f,
            "[DEFAULT]\ntenancy=ocid1.tenancy.oc1..aaaa\nuser=ocid1.user.oc1..bbbb\nfingerprint=aa:bb\nkey_file={}\nregion=us-ashburn-1\n",
            key_path.display()
        )
        .unwrap();

        let provider =
            ConfigFileProvider::new(config_path.to_str().unwrap(), "DEFAULT").unwrap();
        let profile = provider.get_profile(false).await.unwrap();
        assert_eq!(profile.key_id, "ocid1.tenancy.oc1..aaaa/ocid1.user.oc1..bbbb/aa:bb");
        assert_eq!(provider.region_id().as_deref(), Some("us-ashburn-1"));
    }

    #[tokio::test]
    async fn test_missing_section_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config");
        std::fs::write(&config_path, "[OTHER]\ntenancy=x\n").unwrap();
        assert!(ConfigFileProvider::new(config_path.to_str().unwrap(), "DEFAULT").is_err());
    }
}
