//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Thin typed HTTP client (C5) used by the instance-principal and
//! OKE-workload-identity providers to talk to IMDS, the X.509 federation
//! endpoint, and the Kubernetes token endpoint. Built once per provider with
//! an immutable trust/timeout policy; every call is one-shot.
use reqwest::{Certificate, Client, ClientBuilder};
use std::time::Duration;

use crate::error::{ap_error, NoSQLError};

/// A non-2xx HTTP response, translated from the raw status/body.
#[derive(Debug, Clone)]
pub(crate) struct ServiceResponseException {
    pub(crate) status_code: u16,
    pub(crate) body: String,
}

impl std::fmt::Display for ServiceResponseException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "service responded with status {}: {}",
            self.status_code, self.body
        )
    }
}

impl std::error::Error for ServiceResponseException {}

/// Constructs a `reqwest::Client` bound to this auth client's trust/timeout
/// policy. `extra_trust_root_pem` adds a PEM-encoded CA to the default trust
/// store; `danger_disable_hostname_verification` is used only for the OKE
/// Kubernetes API server, whose certificate commonly has no SAN matching the
/// pod's view of the host.
pub(crate) fn build_client(
    request_timeout: Duration,
    extra_trust_root_pem: Option<&[u8]>,
    danger_disable_hostname_verification: bool,
) -> Result<Client, NoSQLError> {
    let mut builder = ClientBuilder::new()
        .timeout(request_timeout)
        .use_rustls_tls();
    if let Some(pem) = extra_trust_root_pem {
        let cert = Certificate::from_pem(pem)
            .map_err(|e| ap_error!("invalid trust root certificate: {}", e))?;
        builder = builder.add_root_certificate(cert);
    }
    if danger_disable_hostname_verification {
        builder = builder.danger_accept_invalid_hostnames(true);
    }
    builder
        .build()
        .map_err(|e| ap_error!("failed to construct auth HTTP client: {}", e))
}

/// Executes `request`, translating non-2xx responses into a
/// `ServiceResponseException` and network failures into an `AuthProviderError`.
pub(crate) async fn execute_json(
    client: &Client,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, NoSQLError> {
    let resp = request
        .send()
        .await
        .map_err(|e| ap_error!("auth HTTP call failed: {}", e))?;
    let status = resp.status();
    let opc_request_id = resp
        .headers()
        .get("opc-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .text()
        .await
        .map_err(|e| ap_error!("failed to read auth HTTP response body: {}", e))?;
    if !status.is_success() {
        let suffix = opc_request_id
            .map(|id| format!(" (opc-request-id={})", id))
            .unwrap_or_default();
        return Err(ap_error!(
            "{}{}",
            ServiceResponseException {
                status_code: status.as_u16(),
                body,
            },
            suffix
        ));
    }
    serde_json::from_str(&body).map_err(|e| ap_error!("malformed JSON auth response: {}", e))
}

/// Executes `request` and returns the raw response body text, translating
/// non-2xx responses the same way as `execute_json`. Used for IMDS endpoints
/// that return plain text (`instance/region`, `identity/cert.pem`, ...).
pub(crate) async fn execute_text(
    client: &Client,
    request: reqwest::RequestBuilder,
) -> Result<(u16, String), NoSQLError> {
    let resp = request
        .send()
        .await
        .map_err(|e| ap_error!("auth HTTP call failed: {}", e))?;
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .map_err(|e| ap_error!("failed to read auth HTTP response body: {}", e))?;
    let _ = client;
    Ok((status, body))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_client_defaults() {
        let client = build_client(Duration::from_secs(120), None, false);
        assert!(client.is_ok());
    }

    #[test]
    fn test_service_response_exception_display() {
        let e = ServiceResponseException {
            status_code: 404,
            body: "not found".to_string(),
        };
        assert_eq!(e.to_string(), "service responded with status 404: not found");
    }
}
