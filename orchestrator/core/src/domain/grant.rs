// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Grant Request / Grant
//!
//! Read-only snapshots of the grant negotiated with the NFVO before an
//! operation. The grant request lists the resources the operation wants to
//! add or remove; the grant carries the approved VIM assets, placement zones
//! and network overrides.

use super::ext_link::{ExtManagedVirtualLinkData, ExtVirtualLinkData, ResourceHandle};
use super::lcm_request::LcmOperationType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Compute,
    Linkport,
    Storage,
    Vl,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Compute => "COMPUTE",
            ResourceType::Linkport => "LINKPORT",
            ResourceType::Storage => "STORAGE",
            ResourceType::Vl => "VL",
        };
        write!(f, "{s}")
    }
}

/// Resource to add or remove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdu_id: Option<String>,
    pub resource_template_id: String,
    /// Present on resources being removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceHandle>,
}

impl ResourceDefinition {
    pub fn is_compute(&self) -> bool {
        self.resource_type == ResourceType::Compute
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource.as_ref().map(|r| r.resource_id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    #[serde(default)]
    pub vnf_instance_id: String,
    #[serde(default)]
    pub vnfd_id: String,
    /// Target descriptor of a change-package operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_vnfd_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavour_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<LcmOperationType>,
    #[serde(default)]
    pub add_resources: Vec<ResourceDefinition>,
    #[serde(default)]
    pub remove_resources: Vec<ResourceDefinition>,
    #[serde(default)]
    pub update_resources: Vec<ResourceDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiation_level_id: Option<String>,
}

impl GrantRequest {
    pub fn compute_adds(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.add_resources.iter().filter(|r| r.is_compute())
    }

    pub fn compute_removes(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.remove_resources.iter().filter(|r| r.is_compute())
    }

    pub fn add_resource(&self, id: &str) -> Option<&ResourceDefinition> {
        self.add_resources.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInfo {
    pub id: String,
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vim_connection_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantInfo {
    pub resource_definition_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vim_connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VimComputeResourceFlavour {
    pub vnfd_virtual_compute_desc_id: String,
    pub vim_flavour_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VimSoftwareImage {
    pub vnfd_software_image_id: String,
    pub vim_software_image_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VimAssets {
    #[serde(default)]
    pub compute_resource_flavours: Vec<VimComputeResourceFlavour>,
    #[serde(default)]
    pub software_images: Vec<VimSoftwareImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    #[serde(default)]
    pub id: String,
    /// `None` when the NFVO returned no zone catalogue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneInfo>>,
    /// `None` when the NFVO returned no per-resource decisions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_resources: Option<Vec<GrantInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vim_assets: Option<VimAssets>,
    #[serde(default)]
    pub ext_virtual_links: Vec<ExtVirtualLinkData>,
    #[serde(default)]
    pub ext_managed_virtual_links: Vec<ExtManagedVirtualLinkData>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

impl Grant {
    /// Placement zone catalogue entry by grant-local zone id
    pub fn zone(&self, id: &str) -> Option<&ZoneInfo> {
        self.zones.as_ref()?.iter().find(|z| z.id == id)
    }
}
