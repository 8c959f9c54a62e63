//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! OCI region identifiers and their NoSQL Cloud Service endpoints.
//!
//! The built-in table below covers the regions in common use; a region not
//! found there is resolved against `OCI_REGION_METADATA` and, failing that,
//! `~/.oci/regions-config.json`, exactly as described for
//! [`HandleBuilder::cloud_region()`](crate::HandleBuilder::cloud_region).
use serde_derive::Deserialize;
use std::fmt;

use crate::auth_common::file_utils::expand_user_home;
use crate::error::{ia_error, NoSQLError};

/// A validated OCI region: its identifier (e.g. `us-ashburn-1`) and the
/// second-level domain of the realm it belongs to (e.g. `oraclecloud.com`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Region {
    id: String,
    second_level_domain: String,
}

impl Region {
    /// The NoSQL Cloud Service endpoint host for this region, with no scheme.
    pub(crate) fn nosql_endpoint(&self) -> String {
        format!("nosql.{}.{}", self.id, self.second_level_domain)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

// (region identifier, realm second-level domain)
const KNOWN_REGIONS: &[(&str, &str)] = &[
    ("us-ashburn-1", "oraclecloud.com"),
    ("us-phoenix-1", "oraclecloud.com"),
    ("us-sanjose-1", "oraclecloud.com"),
    ("us-chicago-1", "oraclecloud.com"),
    ("ca-toronto-1", "oraclecloud.com"),
    ("ca-montreal-1", "oraclecloud.com"),
    ("sa-saopaulo-1", "oraclecloud.com"),
    ("sa-santiago-1", "oraclecloud.com"),
    ("sa-vinhedo-1", "oraclecloud.com"),
    ("sa-bogota-1", "oraclecloud.com"),
    ("uk-london-1", "oraclecloud.com"),
    ("uk-cardiff-1", "oraclecloud.com"),
    ("eu-frankfurt-1", "oraclecloud.com"),
    ("eu-amsterdam-1", "oraclecloud.com"),
    ("eu-zurich-1", "oraclecloud.com"),
    ("eu-madrid-1", "oraclecloud.com"),
    ("eu-milan-1", "oraclecloud.com"),
    ("eu-marseille-1", "oraclecloud.com"),
    ("eu-paris-1", "oraclecloud.com"),
    ("eu-stockholm-1", "oraclecloud.com"),
    ("me-jeddah-1", "oraclecloud.com"),
    ("me-dubai-1", "oraclecloud.com"),
    ("me-abudhabi-1", "oraclecloud.com"),
    ("af-johannesburg-1", "oraclecloud.com"),
    ("ap-mumbai-1", "oraclecloud.com"),
    ("ap-hyderabad-1", "oraclecloud.com"),
    ("ap-tokyo-1", "oraclecloud.com"),
    ("ap-osaka-1", "oraclecloud.com"),
    ("ap-seoul-1", "oraclecloud.com"),
    ("ap-chuncheon-1", "oraclecloud.com"),
    ("ap-singapore-1", "oraclecloud.com"),
    ("ap-singapore-2", "oraclecloud.com"),
    ("ap-sydney-1", "oraclecloud.com"),
    ("ap-melbourne-1", "oraclecloud.com"),
    ("il-jerusalem-1", "oraclecloud.com"),
    ("us-langley-1", "oraclegovcloud.com"),
    ("us-luke-1", "oraclegovcloud.com"),
    ("us-gov-ashburn-1", "oraclegovcloud.com"),
    ("us-gov-chicago-1", "oraclegovcloud.com"),
    ("us-gov-phoenix-1", "oraclegovcloud.com"),
    ("uk-gov-london-1", "oraclegovcloud.uk"),
    ("uk-gov-cardiff-1", "oraclegovcloud.uk"),
];

#[derive(Deserialize)]
struct RegionMetadataEntry {
    #[serde(rename = "regionIdentifier")]
    region_identifier: String,
    #[serde(rename = "realmDomainComponent")]
    realm_domain_component: String,
}

/// Reads an entire file's contents as a `String`, expanding a leading `~`.
pub(crate) fn file_to_string(path: &str) -> Result<String, NoSQLError> {
    let expanded = expand_user_home(path);
    std::fs::read_to_string(&expanded)
        .map_err(|e| ia_error!("error reading file {}: {}", expanded, e))
}

fn lookup_in_metadata_json(json: &str, region_id: &str) -> Option<Region> {
    let entries: Vec<RegionMetadataEntry> = serde_json::from_str(json).ok()?;
    entries
        .into_iter()
        .find(|e| e.region_identifier == region_id)
        .map(|e| Region {
            id: e.region_identifier,
            second_level_domain: e.realm_domain_component,
        })
}

/// Resolves a region identifier (e.g. `us-ashburn-1`) to a [`Region`].
///
/// The built-in table is checked first. If not found there, the
/// `OCI_REGION_METADATA` environment variable (a JSON array of
/// `{regionIdentifier, realmDomainComponent}` objects) is checked, followed by
/// `~/.oci/regions-config.json` in the same format. See [Adding Regions](https://docs.oracle.com/en-us/iaas/Content/API/Concepts/sdk_adding_new_region_endpoints.htm).
pub(crate) fn string_to_region(region_id: &str) -> Result<Region, NoSQLError> {
    let region_id = region_id.trim();
    if let Some((id, domain)) = KNOWN_REGIONS.iter().find(|(id, _)| *id == region_id) {
        return Ok(Region {
            id: id.to_string(),
            second_level_domain: domain.to_string(),
        });
    }
    if let Ok(metadata) = std::env::var("OCI_REGION_METADATA") {
        if let Some(region) = lookup_in_metadata_json(&metadata, region_id) {
            return Ok(region);
        }
    }
    if let Ok(contents) = file_to_string("~/.oci/regions-config.json") {
        if let Some(region) = lookup_in_metadata_json(&contents, region_id) {
            return Ok(region);
        }
    }
    Err(ia_error!(
        "region '{}' is not recognized; set OCI_REGION_METADATA or add it to ~/.oci/regions-config.json, or use HandleBuilder::endpoint() directly",
        region_id
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_region_endpoint() {
        let r = string_to_region("us-ashburn-1").unwrap();
        assert_eq!(r.nosql_endpoint(), "nosql.us-ashburn-1.oraclecloud.com");
    }

    #[test]
    fn test_unknown_region_without_metadata_errors() {
        std::env::remove_var("OCI_REGION_METADATA");
        assert!(string_to_region("xx-nonexistent-1").is_err());
    }

    #[test]
    fn test_region_metadata_env_fallback() {
        std::env::set_var(
            "OCI_REGION_METADATA",
            r#"[{"regionIdentifier":"xx-newregion-1","regionKey":"xxx","realmDomainComponent":"oraclecloud.com"}]"#,
        );
        let r = string_to_region("xx-newregion-1").unwrap();
        assert_eq!(r.nosql_endpoint(), "nosql.xx-newregion-1.oraclecloud.com");
        std::env::remove_var("OCI_REGION_METADATA");
    }
}
