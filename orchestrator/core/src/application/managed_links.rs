// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Managed Virtual Link Rewriting
//!
//! A descriptor-declared internal network can be satisfied by a network that
//! already exists on the VIM. For every such link the template's
//! `{get_resource: <link>}` references are replaced by the concrete network
//! id, and the local network definition together with its subnets is
//! removed.
//!
//! Links are applied in order. Rewriting consumes the references, so when a
//! link name is listed twice only its first entry has any effect.

use crate::domain::grant::Grant;
use crate::domain::lcm_request::LcmParams;
use crate::domain::template::HotTemplate;
use crate::domain::tree::{get_path, replace_all};
use crate::domain::vnf_instance::VnfInstance;
use serde_json::{json, Value};
use tracing::debug;

const SUBNET_TYPE: &str = "OS::Neutron::Subnet";

/// One `(link name, network id)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedLink {
    pub link_name: String,
    pub resource_id: String,
}

impl ManagedLink {
    pub fn new(link_name: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            link_name: link_name.into(),
            resource_id: resource_id.into(),
        }
    }
}

/// Grant links followed by the request's, duplicates kept
pub fn links_from_request(grant: &Grant, req: &dyn LcmParams) -> Vec<ManagedLink> {
    grant
        .ext_managed_virtual_links
        .iter()
        .chain(req.ext_managed_virtual_links().iter())
        .map(|l| ManagedLink::new(&l.vnf_virtual_link_desc_id, &l.resource_id))
        .collect()
}

/// Links previously recorded on the instance
pub fn links_from_inst(inst: &VnfInstance) -> Vec<ManagedLink> {
    inst.ext_managed_virtual_link_info()
        .iter()
        .map(|l| ManagedLink::new(&l.vnf_virtual_link_desc_id, &l.network_resource.resource_id))
        .collect()
}

fn is_subnet_of(resource: &Value, link_name: &str) -> bool {
    resource.get("type").and_then(Value::as_str) == Some(SUBNET_TYPE)
        && get_path(resource, &["properties", "network", "get_resource"]).and_then(Value::as_str)
            == Some(link_name)
}

/// Rewrite one template for the given links
pub fn apply_managed_links(template: &mut HotTemplate, links: &[ManagedLink]) {
    for link in links {
        let reference = json!({ "get_resource": link.link_name });
        let network_id = Value::String(link.resource_id.clone());

        let doomed: Vec<String> = template
            .resources
            .iter()
            .filter(|(name, resource)| *name == &link.link_name || is_subnet_of(resource, &link.link_name))
            .map(|(name, _)| name.clone())
            .collect();

        let mut rewritten = 0;
        for resource in template.resources.values_mut() {
            rewritten += replace_all(resource, &reference, &network_id);
        }

        for name in &doomed {
            template.remove_resource(name);
        }

        debug!(
            link = %link.link_name,
            network = %link.resource_id,
            rewritten,
            removed = doomed.len(),
            "Applied managed virtual link"
        );
    }
}

pub fn apply_managed_links_from_request(template: &mut HotTemplate, grant: &Grant, req: &dyn LcmParams) {
    apply_managed_links(template, &links_from_request(grant, req));
}

pub fn apply_managed_links_from_inst(template: &mut HotTemplate, inst: &VnfInstance) {
    apply_managed_links(template, &links_from_inst(inst));
}
