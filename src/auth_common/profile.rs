//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! The `AuthenticationProfile` produced by a profile provider, and the
//! `ProfileProvider` trait implemented by each of the five credential
//! sources. A profile is the runtime tuple `(keyId, privateKey, tenantId?)`
//! used to sign one or more outbound requests; see `signature_engine` for how
//! it is consumed.
use async_trait::async_trait;
use rsa::RsaPrivateKey;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::NoSQLError;

/// The runtime tuple used to sign requests: a key id, the RSA private key it
/// names, and (for static user principals) the tenant OCID used for
/// compartment defaulting. Token-based principals leave `tenant_id` `None`.
#[derive(Clone)]
pub(crate) struct AuthenticationProfile {
    pub(crate) key_id: String,
    pub(crate) private_key: RsaPrivateKey,
    pub(crate) tenant_id: Option<String>,
}

impl Debug for AuthenticationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationProfile")
            .field("key_id", &self.key_id)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Where a provider's RSA private key material comes from.
#[derive(Clone, Debug)]
pub(crate) enum PrivateKeySource {
    /// The caller already parsed/constructed the key; the provider never
    /// zeros its own copy since it does not own the underlying bytes.
    Rsa(Box<RsaPrivateKey>),
    /// A PEM string in memory, optionally passphrase-protected.
    Pem(String),
    /// A PEM file path, read lazily (and re-read on every refresh for
    /// sources that expect the file to rotate).
    PemFile(PathBuf),
}

/// Validated, immutable-after-construction credentials for a static user
/// principal (directly supplied or loaded via an OCI config file section).
#[derive(Clone)]
pub(crate) struct Credentials {
    pub(crate) tenancy_id: String,
    pub(crate) user_id: String,
    pub(crate) fingerprint: String,
    pub(crate) private_key: PrivateKeySource,
    pub(crate) passphrase: Option<Vec<u8>>,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenancy_id", &self.tenancy_id)
            .field("user_id", &self.user_id)
            .field("fingerprint", &self.fingerprint)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// The `keyId` for a static user principal: `{tenancy}/{user}/{fingerprint}`.
    pub(crate) fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy_id, self.user_id, self.fingerprint)
    }
}

/// Capability set shared by all five profile providers. Implementations are
/// not required to be internally thread-safe: the signature engine serializes
/// all calls into a given provider through a single-permit semaphore, so at
/// most one `get_profile` call is ever in flight per provider.
#[async_trait]
pub(crate) trait ProfileProvider: Send + Sync + Debug {
    /// Produces the current profile, loading/refreshing credentials as
    /// needed. `force_refresh` is set by the engine after the server has
    /// rejected the previous signature as `InvalidAuthorization`.
    async fn get_profile(&self, force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError>;

    /// The OCI region id this provider is associated with, if known.
    fn region_id(&self) -> Option<String> {
        None
    }

    /// True if the last-produced profile is still usable (modulo the
    /// engine's `profileExpireBefore` skew, applied by the caller).
    async fn is_profile_valid(&self) -> bool;

    /// How long the current profile remains valid. `Duration::MAX` denotes
    /// an effectively immortal profile (e.g. a static user principal).
    async fn profile_ttl(&self) -> Duration;

    /// Releases owned resources: RSA key material, HTTP clients, and zeroes
    /// any retained passphrase/token buffers. Idempotent.
    async fn dispose(&self);
}

pub(crate) const IMMORTAL_TTL: Duration = Duration::from_secs(u64::MAX / 2);
