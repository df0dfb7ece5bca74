// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! External Virtual Links
//!
//! External and externally-managed virtual link records shared by lifecycle
//! requests, grants and the instance snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// External virtual link as supplied by a request or grant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtVirtualLinkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub ext_cps: Vec<VnfExtCpData>,
}

/// External CP attached to an external virtual link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnfExtCpData {
    pub cpd_id: String,
    /// Keyed by cpConfig id, in document order
    #[serde(default)]
    pub cp_config: IndexMap<String, VnfExtCpConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnfExtCpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_port_id: Option<String>,
    #[serde(default)]
    pub cp_protocol_data: Vec<CpProtocolData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpProtocolData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_over_ethernet: Option<IpOverEthernet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpOverEthernet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddressData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddressData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ip_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_addresses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// One resolved fixed IP of a CP
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

impl FixedIp {
    pub fn is_empty(&self) -> bool {
        self.ip_address.is_none() && self.subnet.is_none()
    }
}

impl VnfExtCpData {
    /// Fixed IPs declared by this CP, in cpConfig order.
    ///
    /// Only the first fixed address of an entry is used; entries carrying
    /// neither an address nor a subnet are skipped.
    pub fn fixed_ips(&self) -> Vec<FixedIp> {
        self.cp_config
            .values()
            .flat_map(|config| config.cp_protocol_data.iter())
            .filter_map(|protocol| protocol.ip_over_ethernet.as_ref())
            .flat_map(|ipoe| ipoe.ip_addresses.iter())
            .map(|ip| FixedIp {
                ip_address: ip
                    .fixed_addresses
                    .as_ref()
                    .and_then(|addrs| addrs.first().cloned()),
                subnet: ip.subnet_id.clone(),
            })
            .filter(|fixed_ip| !fixed_ip.is_empty())
            .collect()
    }
}

/// Externally-managed virtual link supplied by a request or grant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtManagedVirtualLinkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub vnf_virtual_link_desc_id: String,
    pub resource_id: String,
}

/// Handle to a resource on the VIM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHandle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vim_connection_id: Option<String>,
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vim_level_resource_type: Option<String>,
}

/// Recorded external virtual link of an instantiated VNF
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtVirtualLinkInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub resource_handle: ResourceHandle,
    #[serde(default)]
    pub current_vnf_ext_cp_data: Vec<VnfExtCpData>,
}

/// Recorded externally-managed virtual link of an instantiated VNF
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtManagedVirtualLinkInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub vnf_virtual_link_desc_id: String,
    pub network_resource: ResourceHandle,
}
