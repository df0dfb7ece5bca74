// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Parameter Resolvers
//!
//! Pure lookups filling `nfv` skeleton entries. The grant is preferred, then
//! the request or instance snapshot, then the descriptor default. Nothing
//! here fails: an unresolvable value is `None` and ends up as `null` in the
//! parameter map, to be rejected by the backend if it matters.
//!
//! All resolvers take the descriptor name of a VDU or CP, never the indexed
//! name.

use crate::domain::ext_link::{ExtVirtualLinkData, FixedIp, VnfExtCpData};
use crate::domain::grant::{Grant, GrantRequest};
use crate::domain::lcm_request::LcmParams;
use crate::domain::vnf_instance::VnfInstance;
use crate::domain::vnfd::Vnfd;
use serde_json::{Map, Value};

pub const ATTR_FLAVOR: &str = "computeFlavourId";
pub const ATTR_IMAGE: &str = "vcImageId";
pub const ATTR_ZONE: &str = "locationConstraints";
pub const ATTR_CAPACITY: &str = "desired_capacity";
pub const ATTR_NETWORK: &str = "network";
pub const ATTR_FIXED_IPS: &str = "fixed_ips";
const ATTR_IP_ADDRESS: &str = "ip_address";
const ATTR_SUBNET: &str = "subnet";

// ============================================================================
// Compute
// ============================================================================

/// Flavor granted by the NFVO for a VDU
pub fn flavor_from_grant(vdu_name: &str, grant: &Grant) -> Option<String> {
    grant
        .vim_assets
        .as_ref()?
        .compute_resource_flavours
        .iter()
        .find(|f| f.vnfd_virtual_compute_desc_id == vdu_name)
        .map(|f| f.vim_flavour_id.clone())
}

/// Granted flavor, else the descriptor's requested flavor
pub fn flavor(vdu_name: &str, flavour_id: &str, vnfd: &Vnfd, grant: &Grant) -> Option<String> {
    flavor_from_grant(vdu_name, grant).or_else(|| vnfd.compute_flavor(flavour_id, vdu_name))
}

/// Image granted by the NFVO for a VDU or storage
pub fn image_from_grant(name: &str, grant: &Grant) -> Option<String> {
    grant
        .vim_assets
        .as_ref()?
        .software_images
        .iter()
        .find(|i| i.vnfd_software_image_id == name)
        .map(|i| i.vim_software_image_id.clone())
}

/// Granted image, else (when `fallback_vnfd`) the descriptor's image name
pub fn image(
    name: &str,
    flavour_id: &str,
    vnfd: &Vnfd,
    grant: &Grant,
    fallback_vnfd: bool,
) -> Option<String> {
    image_from_grant(name, grant).or_else(|| {
        if fallback_vnfd {
            vnfd.sw_image(flavour_id, name)
        } else {
            None
        }
    })
}

// ============================================================================
// Placement
// ============================================================================

/// Zone granted to any added resource of a VDU type.
///
/// Grant decisions reference the grant request's resources by id; the
/// request entry tells which VDU the decision is for.
pub fn zone(vdu_name: &str, grant_req: &GrantRequest, grant: &Grant) -> Option<String> {
    grant.zones.as_ref()?;
    let decisions = grant.add_resources.as_ref()?;

    for decision in decisions {
        let Some(zone_ref) = decision.zone_id.as_deref() else {
            continue;
        };
        let for_vdu = grant_req
            .add_resources
            .iter()
            .filter(|req_res| req_res.id == decision.resource_definition_id)
            .any(|req_res| req_res.resource_template_id == vdu_name);
        if !for_vdu {
            continue;
        }
        if let Some(zone) = grant.zone(zone_ref) {
            return Some(zone.zone_id.clone());
        }
    }
    None
}

/// Zone granted to one added resource, by its resource definition id
pub fn zone_by_instance(res_def_id: &str, grant: &Grant) -> Option<String> {
    grant.zones.as_ref()?;
    let decision = grant
        .add_resources
        .as_ref()?
        .iter()
        .find(|decision| decision.resource_definition_id == res_def_id)?;
    let zone_ref = decision.zone_id.as_deref()?;
    grant.zone(zone_ref).map(|zone| zone.zone_id.clone())
}

// ============================================================================
// Capacity
// ============================================================================

pub fn current_capacity(vdu_name: &str, inst: &VnfInstance) -> usize {
    inst.vdu_count(vdu_name)
}

/// Post-operation capacity: live VNFCs plus granted adds minus removes
pub fn capacity(vdu_name: &str, inst: &VnfInstance, grant_req: &GrantRequest) -> i64 {
    let current = current_capacity(vdu_name, inst) as i64;
    let added = grant_req
        .compute_adds()
        .filter(|res| res.resource_template_id == vdu_name)
        .count() as i64;
    let removed = grant_req
        .compute_removes()
        .filter(|res| res.resource_template_id == vdu_name)
        .count() as i64;
    current + added - removed
}

// ============================================================================
// External connectivity
// ============================================================================

/// First external CP with the given descriptor id, grant links before request
/// links
fn find_ext_cp<'a>(
    cp_name: &str,
    grant: &'a Grant,
    req: &'a dyn LcmParams,
) -> Option<(&'a ExtVirtualLinkData, &'a VnfExtCpData)> {
    grant
        .ext_virtual_links
        .iter()
        .chain(req.ext_virtual_links().iter())
        .find_map(|vl| {
            vl.ext_cps
                .iter()
                .find(|cp| cp.cpd_id == cp_name)
                .map(|cp| (vl, cp))
        })
}

pub fn network(cp_name: &str, grant: &Grant, req: &dyn LcmParams) -> Option<String> {
    find_ext_cp(cp_name, grant, req).and_then(|(vl, _)| vl.resource_id.clone())
}

/// `None` when no external CP matches, otherwise its (possibly empty) list
pub fn fixed_ips(cp_name: &str, grant: &Grant, req: &dyn LcmParams) -> Option<Vec<FixedIp>> {
    find_ext_cp(cp_name, grant, req).map(|(_, cp)| cp.fixed_ips())
}

pub fn network_from_inst(cp_name: &str, inst: &VnfInstance) -> Option<String> {
    inst.ext_virtual_link_info()
        .iter()
        .find(|vl| vl.current_vnf_ext_cp_data.iter().any(|cp| cp.cpd_id == cp_name))
        .map(|vl| vl.resource_handle.resource_id.clone())
}

pub fn fixed_ips_from_inst(cp_name: &str, inst: &VnfInstance) -> Option<Vec<FixedIp>> {
    inst.ext_virtual_link_info()
        .iter()
        .flat_map(|vl| vl.current_vnf_ext_cp_data.iter())
        .find(|cp| cp.cpd_id == cp_name)
        .map(VnfExtCpData::fixed_ips)
}

/// Fill the positional `fixed_ips` skeleton of a CP.
///
/// Walks the resolved list in order and stops at the first position the
/// skeleton does not request, so a gap drops every later address. Only the
/// `ip_address`/`subnet` attributes the skeleton asks for are filled.
pub fn fill_fixed_ips(skeleton: &Value, resolved: &[FixedIp]) -> Value {
    let positions = skeleton.as_object();
    let mut filled = Vec::new();

    for (i, fixed_ip) in resolved.iter().enumerate() {
        let Some(slot) = positions.and_then(|p| p.get(&i.to_string())) else {
            break;
        };
        let mut entry = slot.as_object().cloned().unwrap_or_default();
        if entry.contains_key(ATTR_SUBNET) {
            entry.insert(ATTR_SUBNET.to_string(), opt_to_value(fixed_ip.subnet.clone()));
        }
        if entry.contains_key(ATTR_IP_ADDRESS) {
            entry.insert(
                ATTR_IP_ADDRESS.to_string(),
                opt_to_value(fixed_ip.ip_address.clone()),
            );
        }
        filled.push(Value::Object(entry));
    }
    Value::Array(filled)
}

pub fn opt_to_value(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

/// Where CP network parameters come from
#[derive(Clone, Copy)]
pub enum CpSource<'a> {
    /// Grant external links, then the request's
    Request {
        grant: &'a Grant,
        req: &'a dyn LcmParams,
    },
    /// Links recorded on the instance snapshot
    Instance(&'a VnfInstance),
}

impl<'a> CpSource<'a> {
    pub fn network(&self, cp_name: &str) -> Option<String> {
        match self {
            CpSource::Request { grant, req } => network(cp_name, grant, *req),
            CpSource::Instance(inst) => network_from_inst(cp_name, inst),
        }
    }

    pub fn fixed_ips(&self, cp_name: &str) -> Option<Vec<FixedIp>> {
        match self {
            CpSource::Request { grant, req } => fixed_ips(cp_name, grant, *req),
            CpSource::Instance(inst) => fixed_ips_from_inst(cp_name, inst),
        }
    }

    /// Complete CP entry: every requested attribute is set, `null` when
    /// unresolved
    pub fn resolve_entry(&self, cp_name: &str, skeleton: &Value) -> Value {
        let mut entry = skeleton.as_object().cloned().unwrap_or_default();
        if entry.contains_key(ATTR_NETWORK) {
            entry.insert(ATTR_NETWORK.to_string(), opt_to_value(self.network(cp_name)));
        }
        if let Some(positions) = entry.get(ATTR_FIXED_IPS) {
            let resolved = self.fixed_ips(cp_name).unwrap_or_default();
            let filled = fill_fixed_ips(positions, &resolved);
            entry.insert(ATTR_FIXED_IPS.to_string(), filled);
        }
        Value::Object(entry)
    }

    /// CP delta entry for an update.
    ///
    /// A CP whose requested network does not resolve, or that no external
    /// CP matches, is left out entirely so the applied value stays in place.
    /// `None` when there is nothing to set.
    pub fn resolve_delta(&self, cp_name: &str, skeleton: &Value) -> Option<Value> {
        let mut delta = Map::new();
        if skeleton.get(ATTR_NETWORK).is_some() {
            let network = self.network(cp_name)?;
            delta.insert(ATTR_NETWORK.to_string(), Value::String(network));
        }
        if let Some(positions) = skeleton.get(ATTR_FIXED_IPS) {
            let resolved = self.fixed_ips(cp_name)?;
            delta.insert(ATTR_FIXED_IPS.to_string(), fill_fixed_ips(positions, &resolved));
        }
        if delta.is_empty() {
            None
        } else {
            Some(Value::Object(delta))
        }
    }
}
