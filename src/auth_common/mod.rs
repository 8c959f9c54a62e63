//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
pub mod authentication_provider;
pub(crate) mod config_file_provider;
pub(crate) mod custom_provider;
pub(crate) mod file_utils;
pub(crate) mod http_auth_client;
pub(crate) mod instance_principal_provider;
pub(crate) mod key_utils;
pub(crate) mod oke_workload_identity_provider;
pub(crate) mod profile;
pub(crate) mod resource_principal_provider;
pub(crate) mod security_token;
pub(crate) mod session_token_provider;
pub(crate) mod signature_engine;
pub(crate) mod user_principal_provider;
