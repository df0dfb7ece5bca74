// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VNF Descriptor View
//!
//! Immutable, already-loaded view over a VNF package: the TOSCA definitions
//! and the per-flavour base templates. Reading the package from disk is the
//! job of [`crate::infrastructure::vnfd_loader`]; everything here is pure
//! lookup.
//!
//! # Node Types
//!
//! | Node | TOSCA type |
//! |------|------------|
//! | VDU | `tosca.nodes.nfv.Vdu.Compute` |
//! | Storage | `tosca.nodes.nfv.Vdu.VirtualBlockStorage` |
//! | CP | `tosca.nodes.nfv.VduCp` |

use super::template::{BaseHot, TemplateError};
use super::tree::get_path;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const VDU_NODE_TYPE: &str = "tosca.nodes.nfv.Vdu.Compute";
pub const STORAGE_NODE_TYPE: &str = "tosca.nodes.nfv.Vdu.VirtualBlockStorage";
pub const VDU_CP_NODE_TYPE: &str = "tosca.nodes.nfv.VduCp";

#[derive(Debug, thiserror::Error)]
pub enum VnfdError {
    #[error("invalid VNF package format: {0}")]
    InvalidFormat(String),

    #[error("VNF package not found for VNFD {0}")]
    PackageNotFound(String),

    #[error("IO error reading {path}: {error}")]
    IoError { path: String, error: String },

    #[error("YAML parse error in {path}: {error}")]
    YamlError { path: String, error: String },

    #[error("flavour {flavour_id} not found in VNFD {vnfd_id}")]
    FlavourNotFound { vnfd_id: String, flavour_id: String },

    #[error("BaseHOT is not defined for flavour {flavour_id} of VNFD {vnfd_id}")]
    BaseHotNotDefined { vnfd_id: String, flavour_id: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Loaded VNF descriptor package
#[derive(Debug, Clone, Default)]
pub struct Vnfd {
    pub vnfd_id: String,
    /// Parsed `TOSCA-Metadata/TOSCA.meta`
    pub tosca_meta: Value,
    /// `Definitions/*.yaml` file name -> parsed content
    pub definitions: BTreeMap<String, Value>,
    /// Flavour id -> base template
    pub base_hots: BTreeMap<String, BaseHot>,
}

impl Vnfd {
    pub fn new(vnfd_id: impl Into<String>) -> Self {
        Self {
            vnfd_id: vnfd_id.into(),
            ..Default::default()
        }
    }

    /// Definition whose substitution mappings declare `flavour_id`
    pub fn flavour(&self, flavour_id: &str) -> Option<&Value> {
        self.definitions.values().find(|definition| {
            get_path(
                definition,
                &[
                    "topology_template",
                    "substitution_mappings",
                    "properties",
                    "flavour_id",
                ],
            )
            .and_then(Value::as_str)
                == Some(flavour_id)
        })
    }

    pub fn require_flavour(&self, flavour_id: &str) -> Result<&Value, VnfdError> {
        self.flavour(flavour_id)
            .ok_or_else(|| VnfdError::FlavourNotFound {
                vnfd_id: self.vnfd_id.clone(),
                flavour_id: flavour_id.to_string(),
            })
    }

    pub fn base_hot(&self, flavour_id: &str) -> Option<&BaseHot> {
        self.base_hots.get(flavour_id)
    }

    pub fn require_base_hot(&self, flavour_id: &str) -> Result<&BaseHot, VnfdError> {
        self.base_hot(flavour_id)
            .ok_or_else(|| VnfdError::BaseHotNotDefined {
                vnfd_id: self.vnfd_id.clone(),
                flavour_id: flavour_id.to_string(),
            })
    }

    fn node_templates(&self, flavour_id: &str) -> Option<&Map<String, Value>> {
        self.flavour(flavour_id)
            .and_then(|definition| get_path(definition, &["topology_template", "node_templates"]))
            .and_then(Value::as_object)
    }

    /// Nodes of one TOSCA type, keyed by node name
    pub fn nodes(&self, flavour_id: &str, node_type: &str) -> BTreeMap<&str, &Value> {
        self.node_templates(flavour_id)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter(|(_, node)| node.get("type").and_then(Value::as_str) == Some(node_type))
                    .map(|(name, node)| (name.as_str(), node))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn vdu_nodes(&self, flavour_id: &str) -> BTreeMap<&str, &Value> {
        self.nodes(flavour_id, VDU_NODE_TYPE)
    }

    pub fn vducp_nodes(&self, flavour_id: &str) -> BTreeMap<&str, &Value> {
        self.nodes(flavour_id, VDU_CP_NODE_TYPE)
    }

    /// CPs bound to a VDU through a `virtual_binding` requirement
    pub fn vdu_cps(&self, flavour_id: &str, vdu_name: &str) -> Vec<String> {
        self.vducp_nodes(flavour_id)
            .into_iter()
            .filter(|(_, node)| {
                requirements(node)
                    .any(|req| req.get("virtual_binding").and_then(Value::as_str) == Some(vdu_name))
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Storages attached to a VDU node via `virtual_storage` requirements
    pub fn vdu_storages(vdu_node: &Value) -> Vec<String> {
        requirements(vdu_node)
            .filter_map(|req| req.get("virtual_storage").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Flavor requested by a VDU's virtual compute capability
    pub fn compute_flavor(&self, flavour_id: &str, vdu_name: &str) -> Option<String> {
        let node = self.node_templates(flavour_id)?.get(vdu_name)?;
        get_path(
            node,
            &[
                "capabilities",
                "virtual_compute",
                "properties",
                "requested_additional_capabilities",
                "properties",
                "requested_additional_capability_name",
            ],
        )
        .and_then(Value::as_str)
        .filter(|flavor| !flavor.is_empty())
        .map(str::to_string)
    }

    /// Software image names of VDU and storage nodes
    pub fn sw_images(&self, flavour_id: &str) -> BTreeMap<String, String> {
        let Some(nodes) = self.node_templates(flavour_id) else {
            return BTreeMap::new();
        };
        nodes
            .iter()
            .filter(|(_, node)| {
                matches!(
                    node.get("type").and_then(Value::as_str),
                    Some(VDU_NODE_TYPE) | Some(STORAGE_NODE_TYPE)
                )
            })
            .filter_map(|(name, node)| {
                get_path(node, &["properties", "sw_image_data", "name"])
                    .and_then(Value::as_str)
                    .map(|image| (name.clone(), image.to_string()))
            })
            .collect()
    }

    pub fn sw_image(&self, flavour_id: &str, name: &str) -> Option<String> {
        self.sw_images(flavour_id).remove(name)
    }
}

/// Source of loaded descriptor packages, keyed by vnfd id.
///
/// Implemented in `crate::infrastructure::vnfd_loader` over a directory of
/// extracted packages and in memory for tests.
pub trait VnfdRepository: Send + Sync {
    fn load(&self, vnfd_id: &str) -> Result<Vnfd, VnfdError>;
}

fn requirements(node: &Value) -> impl Iterator<Item = &Value> {
    node.get("requirements")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}
