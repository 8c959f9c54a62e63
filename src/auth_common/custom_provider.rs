//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Adapts a user-supplied `AuthenticationProvider` callback (the
//! `credentialsProvider` config option of §6) onto the `ProfileProvider`
//! capability set the signature engine drives. This is the extensibility
//! seam for credential sources this crate does not implement natively.
use async_trait::async_trait;
use std::time::Duration;

use super::authentication_provider::AuthenticationProvider;
use super::profile::{AuthenticationProfile, ProfileProvider, IMMORTAL_TTL};
use crate::error::{ia_error, NoSQLError};

#[derive(Debug)]
pub(crate) struct CustomProvider {
    inner: Box<dyn AuthenticationProvider>,
}

impl CustomProvider {
    pub(crate) fn new(inner: Box<dyn AuthenticationProvider>) -> Self {
        CustomProvider { inner }
    }
}

#[async_trait]
impl ProfileProvider for CustomProvider {
    async fn get_profile(&self, _force_refresh: bool) -> Result<AuthenticationProfile, NoSQLError> {
        let private_key = self
            .inner
            .private_key()
            .map_err(|e| ia_error!("credentialsProvider callback failed: {}", e))?;
        Ok(AuthenticationProfile {
            key_id: self.inner.key_id(),
            private_key,
            tenant_id: Some(self.inner.tenancy_id().to_string()),
        })
    }

    fn region_id(&self) -> Option<String> {
        let region = self.inner.region_id();
        if region.is_empty() {
            None
        } else {
            Some(region.to_string())
        }
    }

    async fn is_profile_valid(&self) -> bool {
        true
    }

    async fn profile_ttl(&self) -> Duration {
        IMMORTAL_TTL
    }

    async fn dispose(&self) {}
}
