// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VNF Instance Snapshot
//!
//! Read-only view of the persisted VNF instance at the start of an operation.
//! Indexed deployments record the identity of every VNFC in
//! `metadata.vdu_idx` together with the flavor, images and zone it was
//! created with; `instantiatedVnfInfo.metadata.nfv` holds the parameter map
//! last applied to the stack.

use super::ext_link::{ExtManagedVirtualLinkInfo, ExtVirtualLinkInfo, ResourceHandle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnfInstance {
    pub id: String,
    pub vnfd_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiation_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiated_vnf_info: Option<InstantiatedVnfInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiatedVnfInfo {
    pub flavour_id: String,
    #[serde(default)]
    pub vnfc_resource_info: Vec<VnfcResourceInfo>,
    #[serde(default)]
    pub ext_virtual_link_info: Vec<ExtVirtualLinkInfo>,
    #[serde(default)]
    pub ext_managed_virtual_link_info: Vec<ExtManagedVirtualLinkInfo>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnfcResourceInfo {
    pub id: String,
    pub vdu_id: String,
    pub compute_resource: ResourceHandle,
    #[serde(default)]
    pub storage_resource_ids: Vec<String>,
    #[serde(default)]
    pub metadata: VnfcMetadata,
}

/// Per-VNFC metadata captured when the VNFC was created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VnfcMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdu_idx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// `image-<name>` entries and anything else the backend recorded
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VnfcMetadata {
    /// Captured image of a VDU or one of its storages
    pub fn image_for(&self, name: &str) -> Option<&str> {
        self.extra
            .get(&format!("image-{name}"))
            .and_then(Value::as_str)
    }

    /// True when nothing usable for re-rendering was captured
    pub fn lacks_captured_params(&self) -> bool {
        self.flavor.is_none()
            && self.zone.is_none()
            && !self.extra.keys().any(|k| k.starts_with("image-"))
    }
}

impl VnfInstance {
    pub fn flavour_id(&self) -> Option<&str> {
        self.instantiated_vnf_info
            .as_ref()
            .map(|info| info.flavour_id.as_str())
    }

    /// Live VNFCs; empty before instantiation
    pub fn vnfcs(&self) -> &[VnfcResourceInfo] {
        self.instantiated_vnf_info
            .as_ref()
            .map(|info| info.vnfc_resource_info.as_slice())
            .unwrap_or(&[])
    }

    pub fn ext_virtual_link_info(&self) -> &[ExtVirtualLinkInfo] {
        self.instantiated_vnf_info
            .as_ref()
            .map(|info| info.ext_virtual_link_info.as_slice())
            .unwrap_or(&[])
    }

    pub fn ext_managed_virtual_link_info(&self) -> &[ExtManagedVirtualLinkInfo] {
        self.instantiated_vnf_info
            .as_ref()
            .map(|info| info.ext_managed_virtual_link_info.as_slice())
            .unwrap_or(&[])
    }

    /// Parameter map last applied to the stack
    pub fn applied_nfv(&self) -> Option<&Value> {
        self.instantiated_vnf_info.as_ref()?.metadata.get("nfv")
    }

    /// VNFC whose compute resource is `resource_id`
    pub fn vnfc_by_resource_id(&self, resource_id: &str) -> Option<&VnfcResourceInfo> {
        self.vnfcs()
            .iter()
            .find(|vnfc| vnfc.compute_resource.resource_id == resource_id)
    }

    /// Number of live VNFCs of a VDU type
    pub fn vdu_count(&self, vdu_id: &str) -> usize {
        self.vnfcs().iter().filter(|vnfc| vnfc.vdu_id == vdu_id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> VnfInstance {
        serde_json::from_value(json!({
            "id": "inst-1",
            "vnfdId": "vnfd-1",
            "instantiationState": "INSTANTIATED",
            "instantiatedVnfInfo": {
                "flavourId": "simple",
                "vnfcResourceInfo": [
                    {
                        "id": "vnfc-1",
                        "vduId": "VDU1",
                        "computeResource": {"resourceId": "server-1"},
                        "metadata": {
                            "vdu_idx": 0,
                            "flavor": "m1.tiny",
                            "image-VDU1": "cirros",
                            "zone": "nova",
                            "creation_time": "2026-01-01T00:00:00Z"
                        }
                    },
                    {
                        "id": "vnfc-2",
                        "vduId": "VDU2",
                        "computeResource": {"resourceId": "server-2"}
                    }
                ],
                "metadata": {"nfv": {"VDU": {"VDU1-0": {"computeFlavourId": "m1.tiny"}}}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_snapshot_accessors() {
        let inst = sample();
        assert_eq!(inst.flavour_id(), Some("simple"));
        assert_eq!(inst.vnfcs().len(), 2);
        assert_eq!(inst.vdu_count("VDU1"), 1);
        assert_eq!(inst.vdu_count("VDU3"), 0);
        assert_eq!(
            inst.vnfc_by_resource_id("server-2").map(|v| v.id.as_str()),
            Some("vnfc-2")
        );
        assert!(inst.vnfc_by_resource_id("server-9").is_none());
        assert_eq!(
            inst.applied_nfv().unwrap()["VDU"]["VDU1-0"]["computeFlavourId"],
            json!("m1.tiny")
        );
    }

    #[test]
    fn test_vnfc_metadata_captured_values() {
        let inst = sample();
        let meta = &inst.vnfcs()[0].metadata;
        assert_eq!(meta.vdu_idx, Some(0));
        assert_eq!(meta.image_for("VDU1"), Some("cirros"));
        assert_eq!(meta.image_for("VirtualStorage"), None);
        assert!(!meta.lacks_captured_params());
        assert!(inst.vnfcs()[1].metadata.lacks_captured_params());
        assert_eq!(inst.vnfcs()[1].metadata.vdu_idx, None);
    }

    #[test]
    fn test_not_instantiated_instance() {
        let inst: VnfInstance =
            serde_json::from_value(json!({"id": "i", "vnfdId": "d"})).unwrap();
        assert!(inst.vnfcs().is_empty());
        assert!(inst.flavour_id().is_none());
        assert!(inst.applied_nfv().is_none());
    }
}
