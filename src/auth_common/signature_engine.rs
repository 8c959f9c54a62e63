//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! The signature engine (C4): builds the canonical signing string for a
//! request, signs it, caches the result for a bounded window, proactively
//! refreshes it in the background, and forces a profile refresh when the
//! server rejects a signature as invalid.
use base64::prelude::{Engine as _, BASE64_STANDARD};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use sha2::{Digest as _, Sha256};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, SystemTime};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::profile::{AuthenticationProfile, ProfileProvider};
use crate::error::{ia_error, NoSQLError, NoSQLErrorCode};

/// Timing knobs from §3/§6. Validated once at construction.
#[derive(Debug, Clone)]
pub(crate) struct SignatureEngineConfig {
    pub(crate) cache_duration: Duration,
    pub(crate) refresh_ahead: Duration,
    pub(crate) max_profile_refresh_ahead: Duration,
    pub(crate) profile_expire_before: Duration,
}

impl Default for SignatureEngineConfig {
    fn default() -> Self {
        SignatureEngineConfig {
            cache_duration: Duration::from_secs(300),
            refresh_ahead: Duration::from_secs(10),
            max_profile_refresh_ahead: Duration::from_secs(60),
            profile_expire_before: Duration::from_secs(10),
        }
    }
}

impl SignatureEngineConfig {
    pub(crate) fn validate(mut self) -> Result<Self, NoSQLError> {
        if self.cache_duration.is_zero() || self.cache_duration > Duration::from_secs(300) {
            return Err(ia_error!(
                "cacheDuration must be in (0, 5min], got {:?}",
                self.cache_duration
            ));
        }
        if self.refresh_ahead >= self.cache_duration {
            tracing::debug!("refreshAhead >= cacheDuration: background refresh disabled");
        }
        if self.max_profile_refresh_ahead < self.refresh_ahead {
            self.max_profile_refresh_ahead = self.refresh_ahead;
        }
        Ok(self)
    }

    fn background_refresh_enabled(&self) -> bool {
        !self.refresh_ahead.is_zero() && self.refresh_ahead < self.cache_duration
    }
}

/// What the engine needs to know about one outbound request to sign it.
pub(crate) struct SignRequest<'a> {
    pub(crate) method: &'a str,
    pub(crate) path: &'a str,
    pub(crate) host: &'a str,
    pub(crate) media_type: Option<&'a str>,
    pub(crate) body: Option<&'a [u8]>,
    pub(crate) needs_content_signed: bool,
    pub(crate) compartment_override: Option<String>,
    pub(crate) delegation_token: Option<String>,
    /// Set by the retry layer above the engine when the previous attempt on
    /// this logical request returned `InvalidAuthorization`.
    pub(crate) last_exception_was_invalid_authorization: bool,
}

/// Headers the engine produces for one request.
pub(crate) struct SignedHeaders {
    pub(crate) authorization: String,
    pub(crate) date: String,
    pub(crate) content_sha256: Option<String>,
    pub(crate) obo_token: Option<String>,
    pub(crate) compartment_id: Option<String>,
}

#[derive(Clone)]
struct SignatureDetails {
    created_at: SystemTime,
    date_str: String,
    authorization_header: String,
    tenant_id: Option<String>,
    delegation_token: Option<String>,
    content_digest: Option<String>,
}

struct EngineState {
    cache: Option<SignatureDetails>,
    refresh_task: Option<JoinHandle<()>>,
    disposed: bool,
}

pub(crate) struct SignatureEngine {
    provider: Arc<dyn ProfileProvider>,
    provider_gate: Semaphore,
    config: SignatureEngineConfig,
    state: Mutex<EngineState>,
}

impl SignatureEngine {
    pub(crate) fn new(
        provider: Arc<dyn ProfileProvider>,
        config: SignatureEngineConfig,
    ) -> Result<Arc<Self>, NoSQLError> {
        let config = config.validate()?;
        Ok(Arc::new(SignatureEngine {
            provider,
            provider_gate: Semaphore::new(1),
            config,
            state: Mutex::new(EngineState {
                cache: None,
                refresh_task: None,
                disposed: false,
            }),
        }))
    }

    async fn load_profile(&self, force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        let _permit = self
            .provider_gate
            .acquire()
            .await
            .map_err(|_| ia_error!("signature engine is shutting down"))?;
        self.provider.get_profile(force_refresh).await
    }

    fn sign_string(profile: &AuthenticationProfile, signing_string: &str) -> Result<String, NoSQLError> {
        let signing_key = SigningKey::<Sha256>::new(profile.private_key.clone());
        let signature = signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), signing_string.as_bytes())
            .map_err(|e| ia_error!("failed to sign request: {}", e))?;
        Ok(BASE64_STANDARD.encode(signature.to_bytes()))
    }

    fn build_signing_string(
        req: &SignRequest,
        profile: &AuthenticationProfile,
        date_str: &str,
    ) -> (String, Vec<&'static str>, Option<String>) {
        let mut lines = vec![format!(
            "(request-target): {} {}",
            req.method.to_lowercase(),
            req.path
        )];
        lines.push(format!("host: {}", req.host));
        lines.push(format!("date: {}", date_str));
        let mut header_names = vec!["(request-target)", "host", "date"];

        let content_digest = if req.needs_content_signed {
            let body = req.body.unwrap_or(&[]);
            let digest = BASE64_STANDARD.encode(Sha256::digest(body));
            lines.push(format!("content-length: {}", body.len()));
            lines.push(format!(
                "content-type: {}",
                req.media_type.unwrap_or("application/json")
            ));
            lines.push(format!("x-content-sha256: {}", digest));
            header_names.push("content-length");
            header_names.push("content-type");
            header_names.push("x-content-sha256");
            Some(digest)
        } else {
            None
        };

        if req.delegation_token.is_some() {
            lines.push(format!(
                "opc-obo-token: {}",
                req.delegation_token.as_deref().unwrap()
            ));
            header_names.push("opc-obo-token");
        }

        let _ = &profile;
        (lines.join("\n"), header_names, content_digest)
    }

    fn build_authorization_header(
        header_names: &[&str],
        key_id: &str,
        signature_b64: &str,
    ) -> String {
        format!(
            "Signature headers=\"{}\",keyId=\"{}\",algorithm=\"rsa-sha256\",signature=\"{}\",version=\"1\"",
            header_names.join(" "),
            key_id,
            signature_b64
        )
    }

    async fn create_signature(
        &self,
        req: &SignRequest<'_>,
        force_profile_refresh: bool,
    ) -> Result<(SignatureDetails, AuthenticationProfile), NoSQLError> {
        let profile = self.load_profile(force_profile_refresh).await?;
        let date_str = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let (signing_string, header_names, content_digest) =
            Self::build_signing_string(req, &profile, &date_str);
        let signature_b64 = Self::sign_string(&profile, &signing_string)?;
        let authorization_header =
            Self::build_authorization_header(&header_names, &profile.key_id, &signature_b64);

        let details = SignatureDetails {
            created_at: SystemTime::now(),
            date_str,
            authorization_header,
            tenant_id: profile.tenant_id.clone(),
            delegation_token: req.delegation_token.clone(),
            content_digest,
        };
        Ok((details, profile))
    }

    /// Produces the headers for one outbound request, applying the cache
    /// decision table from §4.2.
    pub(crate) async fn apply_authorization(
        self: &Arc<Self>,
        req: SignRequest<'_>,
    ) -> Result<SignedHeaders, NoSQLError> {
        {
            let guard = self.state.lock().unwrap();
            if guard.disposed {
                return Err(NoSQLError::new(
                    NoSQLErrorCode::IllegalState,
                    "signature engine has been disposed",
                ));
            }
        }

        let cached = {
            let guard = self.state.lock().unwrap();
            guard.cache.clone()
        };

        let force_profile_refresh = req.last_exception_was_invalid_authorization;
        let skip_cache_write = req.needs_content_signed;

        let reuse = !force_profile_refresh
            && !req.needs_content_signed
            && match &cached {
                Some(d) => {
                    let profile_valid = self.provider.is_profile_valid().await;
                    profile_valid
                        && SystemTime::now()
                            .duration_since(d.created_at)
                            .unwrap_or(Duration::MAX)
                            <= self.config.cache_duration
                }
                None => false,
            };

        let details = if reuse {
            cached.unwrap()
        } else {
            let (details, _profile) = self.create_signature(&req, force_profile_refresh).await?;
            if !skip_cache_write {
                self.cache_and_reschedule(details.clone());
            }
            details
        };

        let compartment_id = req.compartment_override.clone().or_else(|| details.tenant_id.clone());

        Ok(SignedHeaders {
            authorization: details.authorization_header,
            date: details.date_str,
            content_sha256: details.content_digest,
            obo_token: details.delegation_token,
            compartment_id,
        })
    }

    fn cache_and_reschedule(self: &Arc<Self>, details: SignatureDetails) {
        let mut guard = self.state.lock().unwrap();
        guard.cache = Some(details);
        if let Some(handle) = guard.refresh_task.take() {
            handle.abort();
        }
        if self.config.background_refresh_enabled() {
            let weak: Weak<SignatureEngine> = Arc::downgrade(self);
            let delay = self.config.cache_duration.saturating_sub(self.config.refresh_ahead);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(engine) = weak.upgrade() {
                    engine.background_refresh().await;
                }
            });
            guard.refresh_task = Some(handle);
        }
    }

    async fn background_refresh(self: Arc<Self>) {
        let profile_ttl = self.provider.profile_ttl().await;
        let coalesce = profile_ttl.saturating_sub(
            self.config
                .cache_duration
                .saturating_sub(self.config.refresh_ahead),
        ) <= self.config.max_profile_refresh_ahead;

        let req = SignRequest {
            method: "post",
            path: "",
            host: "",
            media_type: None,
            body: None,
            needs_content_signed: false,
            compartment_override: None,
            delegation_token: None,
            last_exception_was_invalid_authorization: false,
        };
        match self.create_signature(&req, coalesce).await {
            Ok((details, _)) => {
                tracing::debug!("background signature refresh succeeded");
                let mut guard = self.state.lock().unwrap();
                if !guard.disposed {
                    guard.cache = Some(details);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "background signature refresh failed, will retry on next request");
            }
        }
    }

    /// Resolves the region this engine's provider is associated with,
    /// triggering a profile load if the provider does not know its region
    /// until credentials are first fetched (instance principal via IMDS).
    pub(crate) async fn resolve_region(&self) -> Result<Option<String>, NoSQLError> {
        if let Some(r) = self.provider.region_id() {
            return Ok(Some(r));
        }
        self.load_profile(false).await?;
        Ok(self.provider.region_id())
    }

    pub(crate) async fn dispose(&self) {
        let handle = {
            let mut guard = self.state.lock().unwrap();
            guard.disposed = true;
            guard.cache = None;
            guard.refresh_task.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        self.provider.dispose().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use rsa::RsaPrivateKey;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FakeProvider {
        tenant_id: Option<String>,
        calls: AtomicU32,
        key: RsaPrivateKey,
    }

    #[async_trait]
    impl ProfileProvider for FakeProvider {
        async fn get_profile(&self, _force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthenticationProfile {
                key_id: "ocid1.tenancy.oc1..aaa/ocid1.user.oc1..bbb/aa:bb:cc:dd".to_string(),
                private_key: self.key.clone(),
                tenant_id: self.tenant_id.clone(),
            })
        }
        async fn is_profile_valid(&self) -> bool {
            true
        }
        async fn profile_ttl(&self) -> Duration {
            Duration::from_secs(3600)
        }
        async fn dispose(&self) {}
    }

    fn make_request(needs_content_signed: bool, last_invalid: bool) -> SignRequest<'static> {
        SignRequest {
            method: "post",
            path: "/V2/nosql/data",
            host: "nosql.us-ashburn-1.oci.oraclecloud.com",
            media_type: None,
            body: None,
            needs_content_signed,
            compartment_override: None,
            delegation_token: None,
            last_exception_was_invalid_authorization: last_invalid,
        }
    }

    #[tokio::test]
    async fn test_cache_hit_reuses_authorization() {
        let provider = Arc::new(FakeProvider {
            tenant_id: Some("ocid1.tenancy.oc1..aaa".to_string()),
            calls: AtomicU32::new(0),
            key: RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        });
        let engine = SignatureEngine::new(provider, SignatureEngineConfig::default()).unwrap();
        let first = engine.apply_authorization(make_request(false, false)).await.unwrap();
        let second = engine.apply_authorization(make_request(false, false)).await.unwrap();
        assert_eq!(first.authorization, second.authorization);
    }

    #[tokio::test]
    async fn test_invalid_authorization_forces_new_signature() {
        let provider = Arc::new(FakeProvider {
            tenant_id: Some("ocid1.tenancy.oc1..aaa".to_string()),
            calls: AtomicU32::new(0),
            key: RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        });
        let engine = SignatureEngine::new(provider, SignatureEngineConfig::default()).unwrap();
        let first = engine.apply_authorization(make_request(false, false)).await.unwrap();
        let second = engine.apply_authorization(make_request(false, true)).await.unwrap();
        // RSA PKCS1v15 signing is randomized, so a freshly-created signature
        // over the same bytes still differs from the cached one.
        assert_ne!(first.authorization, second.authorization);
    }

    #[tokio::test]
    async fn test_content_signed_request_not_cached() {
        let provider = Arc::new(FakeProvider {
            tenant_id: Some("ocid1.tenancy.oc1..aaa".to_string()),
            calls: AtomicU32::new(0),
            key: RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        });
        let engine = SignatureEngine::new(provider, SignatureEngineConfig::default()).unwrap();
        let signed = engine.apply_authorization(make_request(true, false)).await.unwrap();
        assert!(signed.content_sha256.is_some());
        let guard = engine.state.lock().unwrap();
        assert!(guard.cache.is_none());
    }

    #[tokio::test]
    async fn test_compartment_defaults_to_tenant_id() {
        let provider = Arc::new(FakeProvider {
            tenant_id: Some("ocid1.tenancy.oc1..aaa".to_string()),
            calls: AtomicU32::new(0),
            key: RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        });
        let engine = SignatureEngine::new(provider, SignatureEngineConfig::default()).unwrap();
        let signed = engine.apply_authorization(make_request(false, false)).await.unwrap();
        assert_eq!(signed.compartment_id.as_deref(), Some("ocid1.tenancy.oc1..aaa"));
    }

    #[tokio::test]
    async fn test_token_based_profile_has_no_compartment_header() {
        let provider = Arc::new(FakeProvider {
            tenant_id: None,
            calls: AtomicU32::new(0),
            key: RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        });
        let engine = SignatureEngine::new(provider, SignatureEngineConfig::default()).unwrap();
        let signed = engine.apply_authorization(make_request(false, false)).await.unwrap();
        assert!(signed.compartment_id.is_none());
    }

    #[test]
    fn test_cache_duration_bounds_validated() {
        let mut config = SignatureEngineConfig::default();
        config.cache_duration = Duration::from_secs(301);
        assert!(config.validate().is_err());
        let mut config = SignatureEngineConfig::default();
        config.cache_duration = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signing_string_header_order_matches_authorization_header() {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let profile = AuthenticationProfile {
            key_id: "kid".to_string(),
            private_key: key,
            tenant_id: None,
        };
        let req = make_request(true, false);
        let (signing_string, header_names, _) =
            SignatureEngine::build_signing_string(&req, &profile, "Mon, 01 Jan 2024 00:00:00 GMT");
        for name in &header_names {
            assert!(signing_string.contains(&format!("{}:", name)));
        }
        assert_eq!(
            header_names,
            vec!["(request-target)", "host", "date", "content-length", "content-type", "x-content-sha256"]
        );
    }
}
