// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Indexed Strategy
//!
//! Every VNFC is its own top-level resource `<vdu>-<idx>`, cut from the VDU
//! fragment of the base template. The index is allocated once (instantiate,
//! scale-out) and afterwards recovered from `metadata.vdu_idx` on the VNFC
//! record, so operations can address one VNFC without touching its siblings.
//!
//! ```text
//! base template            rendered template
//! ---------------          -----------------
//! VDU1: {...VDU1...}  ->   VDU1-0: {...VDU1-0...}
//!                          VDU1-1: {...VDU1-1...}
//! ```

use super::{fill_attr, merge_additional_params, LcmContext, UserData, UserDataError};
use crate::application::managed_links::{
    apply_managed_links_from_inst, apply_managed_links_from_request,
};
use crate::application::param_extractor::{category, init_nfv_dict};
use crate::application::param_resolver::{
    current_capacity, flavor, flavor_from_grant, image, opt_to_value, zone_by_instance, CpSource,
    ATTR_FLAVOR, ATTR_IMAGE, ATTR_ZONE,
};
use crate::domain::engine_config::STANDARD_USERDATA_CLASS;
use crate::domain::grant::GrantRequest;
use crate::domain::index::{index_vdu_fragment, strip_index, with_index};
use crate::domain::lcm_request::{
    ChangeCurrentVnfPkgRequest, ChangeExtVnfConnectivityRequest, HealVnfRequest,
    InstantiateVnfRequest, ScaleType, ScaleVnfRequest,
};
use crate::domain::stack::StackFields;
use crate::domain::template::HotTemplate;
use crate::domain::vnf_instance::{VnfInstance, VnfcResourceInfo};
use crate::domain::vnfd::Vnfd;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct StandardUserData;

// ============================================================================
// Template assembly
// ============================================================================

/// VDU fragments taken out of a base template
struct VduFragments {
    fragments: BTreeMap<String, Value>,
}

impl VduFragments {
    /// Remove every VDU resource of the flavour from `template`. VDUs the
    /// template does not define are skipped.
    fn pop(template: &mut HotTemplate, vnfd: &Vnfd, flavour_id: &str) -> Self {
        let fragments = vnfd
            .vdu_nodes(flavour_id)
            .into_keys()
            .filter_map(|name| {
                template
                    .remove_resource(name)
                    .map(|fragment| (name.to_string(), fragment))
            })
            .collect();
        Self { fragments }
    }

    fn contains(&self, vdu_name: &str) -> bool {
        self.fragments.contains_key(vdu_name)
    }

    /// `(<vdu>-<idx>, indexed fragment)`
    fn indexed(&self, vdu_name: &str, idx: u32) -> Option<(String, Value)> {
        self.fragments
            .get(vdu_name)
            .map(|fragment| (with_index(vdu_name, idx), index_vdu_fragment(fragment, idx)))
    }
}

/// One newly allocated VNFC
struct Allocation {
    vdu_name: String,
    idx: u32,
    /// Grant request resource definition id, the key of zone decisions
    res_def_id: String,
}

/// Walk the COMPUTE adds in order, handing out consecutive indices per VDU
/// type starting at `first_index(vdu)`.
fn allocate(
    grant_req: &GrantRequest,
    known: impl Fn(&str) -> bool,
    first_index: impl Fn(&str) -> u32,
) -> Vec<Allocation> {
    let mut next: HashMap<&str, u32> = HashMap::new();
    grant_req
        .compute_adds()
        .filter(|res| known(res.resource_template_id.as_str()))
        .map(|res| {
            let vdu_name = res.resource_template_id.as_str();
            let counter = next
                .entry(vdu_name)
                .or_insert_with(|| first_index(vdu_name));
            let idx = *counter;
            *counter += 1;
            Allocation {
                vdu_name: vdu_name.to_string(),
                idx,
                res_def_id: res.id.clone(),
            }
        })
        .collect()
}

fn capacity_index(vdu_name: &str, inst: &VnfInstance) -> u32 {
    u32::try_from(current_capacity(vdu_name, inst)).unwrap_or(u32::MAX)
}

/// Live VNFC with the skeleton of its own indexed fragment
struct LiveVnfc<'a> {
    vnfc: &'a VnfcResourceInfo,
    skeleton: Value,
}

/// Re-insert one indexed fragment per live VNFC. VNFCs without `vdu_idx`
/// or of a VDU the template does not define are left out.
fn assemble_live<'a>(
    template: &mut HotTemplate,
    fragments: &VduFragments,
    inst: &'a VnfInstance,
) -> Vec<LiveVnfc<'a>> {
    let mut live = Vec::new();
    for vnfc in inst.vnfcs() {
        let Some(idx) = vnfc.metadata.vdu_idx else {
            warn!(vnfc = %vnfc.id, "VNFC has no vdu_idx, skipped");
            continue;
        };
        let Some((name_idx, fragment)) = fragments.indexed(&vnfc.vdu_id, idx) else {
            continue;
        };
        let mut own = Map::new();
        own.insert(name_idx.clone(), fragment.clone());
        let skeleton = init_nfv_dict(&HotTemplate::from_resources(own));

        template.insert_resource(name_idx, fragment);
        live.push(LiveVnfc { vnfc, skeleton });
    }
    live
}

/// A VNFC addressed by a removed COMPUTE resource
struct Target<'a> {
    vdu_name: &'a str,
    vnfc: &'a VnfcResourceInfo,
    idx: u32,
}

/// Correlate every removed COMPUTE resource with its VNFC record
fn removed_vnfcs<'a>(ctx: &LcmContext<'a>) -> Result<Vec<Target<'a>>, UserDataError> {
    let inst = ctx.inst;
    ctx.grant_req
        .compute_removes()
        .map(|res| {
            let resource_id = res
                .resource_id()
                .ok_or_else(|| UserDataError::VnfcNotFound(res.id.clone()))?;
            let vnfc = inst
                .vnfc_by_resource_id(resource_id)
                .ok_or_else(|| UserDataError::VnfcNotFound(resource_id.to_string()))?;
            let idx = vnfc
                .metadata
                .vdu_idx
                .ok_or_else(|| UserDataError::MissingVduIndex(vnfc.id.clone()))?;
            Ok(Target {
                vdu_name: res.resource_template_id.as_str(),
                vnfc,
                idx,
            })
        })
        .collect()
}

// ============================================================================
// Parameter filling
// ============================================================================

fn fill_vdus(
    nfv: &mut Value,
    ctx: &LcmContext<'_>,
    flavour_id: &str,
    zones: &BTreeMap<String, Option<String>>,
) {
    let Some(Value::Object(vdus)) = nfv.get_mut("VDU") else {
        return;
    };
    for (name_idx, entry) in vdus.iter_mut() {
        let vdu_name = strip_index(name_idx);
        fill_attr(entry, ATTR_FLAVOR, || {
            opt_to_value(flavor(vdu_name, flavour_id, ctx.vnfd, ctx.grant))
        });
        fill_attr(entry, ATTR_IMAGE, || {
            opt_to_value(image(vdu_name, flavour_id, ctx.vnfd, ctx.grant, true))
        });
        fill_attr(entry, ATTR_ZONE, || {
            opt_to_value(zones.get(name_idx).cloned().flatten())
        });
    }
}

fn fill_cps(nfv: &mut Value, source: CpSource<'_>) {
    let Some(Value::Object(cps)) = nfv.get_mut("CP") else {
        return;
    };
    for (cp_idx, entry) in cps.iter_mut() {
        *entry = source.resolve_entry(strip_index(cp_idx), entry);
    }
}

/// CP deltas of a skeleton; CPs whose network does not resolve are left out
fn cp_deltas(nfv: &Value, source: CpSource<'_>) -> Map<String, Value> {
    category(nfv, "CP")
        .into_iter()
        .flatten()
        .filter_map(|(cp_idx, skeleton)| {
            source
                .resolve_delta(strip_index(cp_idx), skeleton)
                .map(|delta| (cp_idx.clone(), delta))
        })
        .collect()
}

/// Drop unresolved attributes so the merge keeps the applied values
fn prune_nulls(nfv: &mut Value) {
    for name in ["VDU", "CP"] {
        let Some(Value::Object(entries)) = nfv.get_mut(name) else {
            continue;
        };
        for entry in entries.values_mut() {
            if let Value::Object(attrs) = entry {
                attrs.retain(|_, value| !value.is_null());
            }
        }
    }
}

/// Parameters a VNFC was created with: the applied entry, else rebuilt from
/// the values captured on the VNFC record
fn captured_entry(
    name_idx: &str,
    skeleton: &Value,
    vnfc: &VnfcResourceInfo,
    applied_vdus: Option<&Map<String, Value>>,
) -> Option<Map<String, Value>> {
    if let Some(Value::Object(entry)) = applied_vdus.and_then(|vdus| vdus.get(name_idx)) {
        return Some(entry.clone());
    }
    if vnfc.metadata.lacks_captured_params() {
        return None;
    }

    let name = strip_index(name_idx);
    let mut entry = Map::new();
    for attr in skeleton.as_object().into_iter().flat_map(|attrs| attrs.keys()) {
        let value = match attr.as_str() {
            ATTR_FLAVOR => vnfc.metadata.flavor.clone(),
            ATTR_IMAGE => vnfc.metadata.image_for(name).map(str::to_string),
            ATTR_ZONE => vnfc.metadata.zone.clone(),
            _ => continue,
        };
        entry.insert(attr.clone(), opt_to_value(value));
    }
    Some(entry)
}

/// `{resources: {<vdu>-<idx>: null}}` with the VDU, storage and CP entries
/// of the same indices set to `null`
fn deletion_fields(
    ctx: &LcmContext<'_>,
    flavour_id: &str,
    doomed: impl IntoIterator<Item = (String, u32)>,
) -> Result<StackFields, UserDataError> {
    let vdu_nodes = ctx.vnfd.vdu_nodes(flavour_id);
    let mut resources = Map::new();
    let mut vdus = Map::new();
    let mut cps = Map::new();

    for (vdu_name, idx) in doomed {
        let name_idx = with_index(&vdu_name, idx);
        resources.insert(name_idx.clone(), Value::Null);
        vdus.insert(name_idx, Value::Null);

        if let Some(node) = vdu_nodes.get(vdu_name.as_str()) {
            for storage in Vnfd::vdu_storages(node) {
                vdus.insert(with_index(&storage, idx), Value::Null);
            }
        }
        for cp in ctx.vnfd.vdu_cps(flavour_id, &vdu_name) {
            cps.insert(with_index(&cp, idx), Value::Null);
        }
    }

    let template = HotTemplate::from_resources(resources);
    Ok(StackFields {
        template: Some(template.to_yaml()?),
        ..StackFields::with_nfv(json!({ "VDU": vdus, "CP": cps }))
    })
}

// ============================================================================
// Operations
// ============================================================================

impl StandardUserData {
    fn scale_out(&self, req: &ScaleVnfRequest, ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let mut template = ctx.base_hot(flavour_id)?.template.clone();
        let fragments = VduFragments::pop(&mut template, ctx.vnfd, flavour_id);
        assemble_live(&mut template, &fragments, ctx.inst);

        let allocations = allocate(
            ctx.grant_req,
            |vdu| fragments.contains(vdu),
            |vdu| capacity_index(vdu, ctx.inst),
        );

        let mut added = Map::new();
        let mut zones = BTreeMap::new();
        for alloc in &allocations {
            let Some((name_idx, fragment)) = fragments.indexed(&alloc.vdu_name, alloc.idx) else {
                continue;
            };
            zones.insert(name_idx.clone(), zone_by_instance(&alloc.res_def_id, ctx.grant));
            template.insert_resource(name_idx.clone(), fragment.clone());
            added.insert(name_idx, fragment);
        }

        // only the new VNFCs are parameterized; the caller merges the
        // result onto the applied map
        let mut nfv = init_nfv_dict(&HotTemplate::from_resources(added));
        fill_vdus(&mut nfv, ctx, flavour_id, &zones);
        fill_cps(&mut nfv, CpSource::Instance(ctx.inst));
        prune_nulls(&mut nfv);

        apply_managed_links_from_inst(&mut template, ctx.inst);
        let nfv = merge_additional_params(nfv, req, ctx.grant);

        debug!(
            allocated = ?zones.keys().collect::<Vec<_>>(),
            "Allocated VNFC indices for scale-out"
        );

        Ok(StackFields {
            template: Some(template.to_yaml()?),
            ..StackFields::with_nfv(nfv)
        })
    }

    fn scale_in(&self, ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let doomed: Vec<(String, u32)> = removed_vnfcs(ctx)?
            .into_iter()
            .map(|target| (target.vdu_name.to_string(), target.idx))
            .collect();
        debug!(count = doomed.len(), "Removing VNFCs for scale-in");
        deletion_fields(ctx, flavour_id, doomed)
    }
}

impl UserData for StandardUserData {
    fn class_name(&self) -> &'static str {
        STANDARD_USERDATA_CLASS
    }

    fn instantiate(
        &self,
        req: &InstantiateVnfRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = req.flavour_id.as_str();
        let base_hot = ctx.base_hot(flavour_id)?;
        let mut template = base_hot.template.clone();
        let fragments = VduFragments::pop(&mut template, ctx.vnfd, flavour_id);

        let mut zones = BTreeMap::new();
        for alloc in allocate(ctx.grant_req, |vdu| fragments.contains(vdu), |_| 0) {
            if let Some((name_idx, fragment)) = fragments.indexed(&alloc.vdu_name, alloc.idx) {
                zones.insert(name_idx.clone(), zone_by_instance(&alloc.res_def_id, ctx.grant));
                template.insert_resource(name_idx, fragment);
            }
        }

        let mut nfv = init_nfv_dict(&template);
        fill_vdus(&mut nfv, ctx, flavour_id, &zones);
        fill_cps(
            &mut nfv,
            CpSource::Request {
                grant: ctx.grant,
                req,
            },
        );

        apply_managed_links_from_request(&mut template, ctx.grant, req);
        let nfv = merge_additional_params(nfv, req, ctx.grant);

        debug!(flavour = flavour_id, vnfcs = zones.len(), "Rendered indexed instantiate");

        Ok(StackFields {
            template: Some(template.to_yaml()?),
            files: Some(base_hot.files_as_yaml()?),
            ..StackFields::with_nfv(nfv)
        })
    }

    fn scale(&self, req: &ScaleVnfRequest, ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        match req.scale_type {
            ScaleType::ScaleOut => self.scale_out(req, ctx),
            ScaleType::ScaleIn => self.scale_in(ctx),
        }
    }

    /// Undo a scale-out: delete the indices the forward operation allocated
    fn scale_rollback(
        &self,
        _req: &ScaleVnfRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let vdu_nodes = ctx.vnfd.vdu_nodes(flavour_id);
        let allocations = allocate(
            ctx.grant_req,
            |vdu| vdu_nodes.contains_key(vdu),
            |vdu| capacity_index(vdu, ctx.inst),
        );
        deletion_fields(
            ctx,
            flavour_id,
            allocations.into_iter().map(|alloc| (alloc.vdu_name, alloc.idx)),
        )
    }

    fn heal(&self, req: &HealVnfRequest, ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let applied_vdus = ctx.inst.applied_nfv().and_then(|nfv| category(nfv, "VDU"));

        let mut affected = Map::new();
        for target in removed_vnfcs(ctx)? {
            let vdu_name = target.vnfc.vdu_id.as_str();
            let name_idx = with_index(vdu_name, target.idx);
            let mut entry = applied_vdus
                .and_then(|vdus| vdus.get(&name_idx))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            // no descriptor fallback: keep the captured image unless the
            // grant names a new one
            if let Some(image) = image(vdu_name, flavour_id, ctx.vnfd, ctx.grant, false) {
                entry.insert(ATTR_IMAGE.to_string(), Value::String(image));
            }
            if let Some(flavor) = flavor_from_grant(vdu_name, ctx.grant) {
                entry.insert(ATTR_FLAVOR.to_string(), Value::String(flavor));
            }
            affected.insert(name_idx, Value::Object(entry));
        }

        let nfv = merge_additional_params(json!({ "VDU": affected }), req, ctx.grant);
        Ok(StackFields::with_nfv(nfv))
    }

    fn change_ext_conn(
        &self,
        req: &ChangeExtVnfConnectivityRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let mut template = ctx.base_hot(flavour_id)?.template.clone();
        let fragments = VduFragments::pop(&mut template, ctx.vnfd, flavour_id);
        assemble_live(&mut template, &fragments, ctx.inst);

        let nfv = init_nfv_dict(&template);
        let cps = cp_deltas(
            &nfv,
            CpSource::Request {
                grant: ctx.grant,
                req,
            },
        );
        let nfv = merge_additional_params(json!({ "CP": cps }), req, ctx.grant);
        Ok(StackFields::with_nfv(nfv))
    }

    fn change_ext_conn_rollback(
        &self,
        _req: &ChangeExtVnfConnectivityRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let mut template = ctx.base_hot(flavour_id)?.template.clone();
        let fragments = VduFragments::pop(&mut template, ctx.vnfd, flavour_id);
        assemble_live(&mut template, &fragments, ctx.inst);

        let nfv = init_nfv_dict(&template);
        let cps = cp_deltas(&nfv, CpSource::Instance(ctx.inst));
        Ok(StackFields::with_nfv(json!({ "CP": cps })))
    }

    /// Re-render every live VNFC against the target package. VNFCs named
    /// by the removed resources get parameters resolved from the new
    /// descriptor; all others keep what they were created with.
    fn change_vnfpkg(
        &self,
        req: &ChangeCurrentVnfPkgRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let base_hot = ctx.base_hot(flavour_id)?;
        let mut template = base_hot.template.clone();
        let fragments = VduFragments::pop(&mut template, ctx.vnfd, flavour_id);

        let replaced: BTreeSet<&str> = removed_vnfcs(ctx)?
            .into_iter()
            .map(|target| target.vnfc.id.as_str())
            .collect();
        let applied = ctx.inst.applied_nfv();
        let applied_vdus = applied.and_then(|nfv| category(nfv, "VDU"));
        let applied_cps = applied.and_then(|nfv| category(nfv, "CP"));

        let mut vdus = Map::new();
        let mut cp_skeletons = Map::new();
        for live in assemble_live(&mut template, &fragments, ctx.inst) {
            let is_replaced = replaced.contains(live.vnfc.id.as_str());
            for (name_idx, skeleton) in category(&live.skeleton, "VDU").into_iter().flatten() {
                let entry = if is_replaced {
                    let name = strip_index(name_idx);
                    let mut entry =
                        captured_entry(name_idx, skeleton, live.vnfc, applied_vdus).unwrap_or_default();
                    if skeleton.get(ATTR_FLAVOR).is_some() {
                        entry.insert(
                            ATTR_FLAVOR.to_string(),
                            opt_to_value(flavor(name, flavour_id, ctx.vnfd, ctx.grant)),
                        );
                    }
                    if skeleton.get(ATTR_IMAGE).is_some() {
                        entry.insert(
                            ATTR_IMAGE.to_string(),
                            opt_to_value(image(name, flavour_id, ctx.vnfd, ctx.grant, true)),
                        );
                    }
                    entry
                } else {
                    captured_entry(name_idx, skeleton, live.vnfc, applied_vdus)
                        .ok_or_else(|| UserDataError::MissingCapturedParams(name_idx.clone()))?
                };
                vdus.insert(name_idx.clone(), Value::Object(entry));
            }
            if let Some(cps) = category(&live.skeleton, "CP") {
                cp_skeletons.extend(cps.clone());
            }
        }

        // the request only carries what changes; every other CP keeps its
        // applied value
        let requested = CpSource::Request {
            grant: ctx.grant,
            req,
        };
        let recorded = CpSource::Instance(ctx.inst);
        let cps: Map<String, Value> = cp_skeletons
            .iter()
            .map(|(cp_idx, skeleton)| {
                let cp_name = strip_index(cp_idx);
                let value = requested
                    .resolve_delta(cp_name, skeleton)
                    .or_else(|| {
                        applied_cps
                            .and_then(|cps| cps.get(cp_idx))
                            .filter(|value| !value.is_null())
                            .cloned()
                    })
                    .unwrap_or_else(|| recorded.resolve_entry(cp_name, skeleton));
                (cp_idx.clone(), value)
            })
            .collect();

        apply_managed_links_from_request(&mut template, ctx.grant, req);
        let nfv = merge_additional_params(json!({ "VDU": vdus, "CP": cps }), req, ctx.grant);

        debug!(
            vnfd_id = %ctx.vnfd.vnfd_id,
            replaced = replaced.len(),
            "Rendered package change"
        );

        Ok(StackFields {
            template: Some(template.to_yaml()?),
            files: Some(base_hot.files_as_yaml()?),
            existing: Some(false),
            ..StackFields::with_nfv(nfv)
        })
    }

    /// Re-render every live VNFC against the original package with the
    /// parameters it was created with
    fn change_vnfpkg_rollback(
        &self,
        _req: &ChangeCurrentVnfPkgRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let base_hot = ctx.base_hot(flavour_id)?;
        let mut template = base_hot.template.clone();
        let fragments = VduFragments::pop(&mut template, ctx.vnfd, flavour_id);

        let applied = ctx.inst.applied_nfv();
        let applied_vdus = applied.and_then(|nfv| category(nfv, "VDU"));
        let applied_cps = applied.and_then(|nfv| category(nfv, "CP"));
        let recorded = CpSource::Instance(ctx.inst);

        let mut vdus = Map::new();
        let mut cps = Map::new();
        for live in assemble_live(&mut template, &fragments, ctx.inst) {
            for (name_idx, skeleton) in category(&live.skeleton, "VDU").into_iter().flatten() {
                let entry = captured_entry(name_idx, skeleton, live.vnfc, applied_vdus)
                    .ok_or_else(|| UserDataError::MissingCapturedParams(name_idx.clone()))?;
                vdus.insert(name_idx.clone(), Value::Object(entry));
            }
            for (cp_idx, skeleton) in category(&live.skeleton, "CP").into_iter().flatten() {
                let value = applied_cps
                    .and_then(|cps| cps.get(cp_idx))
                    .filter(|value| !value.is_null())
                    .cloned()
                    .unwrap_or_else(|| recorded.resolve_entry(strip_index(cp_idx), skeleton));
                cps.insert(cp_idx.clone(), value);
            }
        }

        apply_managed_links_from_inst(&mut template, ctx.inst);

        Ok(StackFields {
            template: Some(template.to_yaml()?),
            files: Some(base_hot.files_as_yaml()?),
            existing: Some(false),
            ..StackFields::with_nfv(json!({ "VDU": vdus, "CP": cps }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::userdata::test_support::{fixture, instantiated, Fixture};

    const INDEXED_HOT: &str = r#"
heat_template_version: 2013-05-23
resources:
  VDU1:
    type: VDU1.yaml
    properties:
      flavor: { get_param: [ nfv, VDU, VDU1, computeFlavourId ] }
      image-VDU1: { get_param: [ nfv, VDU, VDU1, vcImageId ] }
      zone: { get_param: [ nfv, VDU, VDU1, locationConstraints ] }
      image-VirtualStorage: { get_param: [ nfv, VDU, VirtualStorage, vcImageId ] }
      net1: { get_param: [ nfv, CP, VDU1_CP1, network ] }
      net2: { get_resource: internalVL1 }
  internalVL1:
    type: OS::Neutron::Net
  internalVL1_subnet:
    type: OS::Neutron::Subnet
    properties:
      network: { get_resource: internalVL1 }
"#;

    fn indexed_fixture() -> Fixture {
        fixture(HotTemplate::from_yaml(INDEXED_HOT).unwrap())
    }

    fn adds(ids: &[&str]) -> GrantRequest {
        let add_resources: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "type": "COMPUTE", "resourceTemplateId": "VDU1"}))
            .collect();
        serde_json::from_value(json!({
            "vnfInstanceId": "inst-1",
            "vnfdId": "vnfd-1",
            "addResources": add_resources
        }))
        .unwrap()
    }

    fn removes(resource_ids: &[&str]) -> GrantRequest {
        let remove_resources: Vec<Value> = resource_ids
            .iter()
            .enumerate()
            .map(|(i, rid)| {
                json!({"id": format!("rm-{i}"), "type": "COMPUTE", "resourceTemplateId": "VDU1",
                       "resource": {"resourceId": rid}})
            })
            .collect();
        serde_json::from_value(json!({
            "vnfInstanceId": "inst-1",
            "vnfdId": "vnfd-1",
            "removeResources": remove_resources
        }))
        .unwrap()
    }

    /// Two live VNFCs `VDU1-0`/`VDU1-1` with their applied parameters
    fn two_vnfcs() -> VnfInstance {
        instantiated(json!({
            "flavourId": "simple",
            "vnfcResourceInfo": [
                {"id": "c0", "vduId": "VDU1", "computeResource": {"resourceId": "server-0"},
                 "metadata": {"vdu_idx": 0, "flavor": "m1.tiny", "image-VDU1": "img-0", "zone": "az-1"}},
                {"id": "c1", "vduId": "VDU1", "computeResource": {"resourceId": "server-1"},
                 "metadata": {"vdu_idx": 1, "flavor": "m1.tiny", "image-VDU1": "img-0", "zone": "az-2"}}
            ],
            "extVirtualLinkInfo": [
                {"id": "ext1", "resourceHandle": {"resourceId": "ext-net"},
                 "currentVnfExtCpData": [{"cpdId": "VDU1_CP1"}]}
            ],
            "extManagedVirtualLinkInfo": [
                {"id": "m1", "vnfVirtualLinkDescId": "internalVL1",
                 "networkResource": {"resourceId": "mgd-net"}}
            ],
            "metadata": {"nfv": {
                "VDU": {
                    "VDU1-0": {"computeFlavourId": "m1.tiny", "vcImageId": "img-0", "locationConstraints": "az-1"},
                    "VirtualStorage-0": {"vcImageId": "vol-0"},
                    "VDU1-1": {"computeFlavourId": "m1.tiny", "vcImageId": "img-0", "locationConstraints": "az-2"},
                    "VirtualStorage-1": {"vcImageId": "vol-0"}
                },
                "CP": {
                    "VDU1_CP1-0": {"network": "ext-net"},
                    "VDU1_CP1-1": {"network": "ext-net"}
                }
            }}
        }))
    }

    fn rendered(fields: &StackFields) -> HotTemplate {
        HotTemplate::from_yaml(fields.template.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn test_instantiate_allocates_from_zero() {
        let mut fx = indexed_fixture();
        fx.grant_req = adds(&["res-1", "res-2"]);
        fx.grant = serde_json::from_value(json!({
            "zones": [{"id": "z1", "zoneId": "nova-az1"}],
            "addResources": [{"resourceDefinitionId": "res-1", "zoneId": "z1"}]
        }))
        .unwrap();
        let req: InstantiateVnfRequest = serde_json::from_value(json!({
            "flavourId": "simple",
            "extVirtualLinks": [{"id": "e", "resourceId": "ext-net", "extCps": [{"cpdId": "VDU1_CP1"}]}]
        }))
        .unwrap();

        let fields = StandardUserData.instantiate(&req, &fx.ctx()).unwrap();
        let template = rendered(&fields);
        assert!(template.resource("VDU1").is_none());
        assert_eq!(
            template.resources["VDU1-1"]["properties"]["flavor"],
            json!({"get_param": ["nfv", "VDU", "VDU1-1", "computeFlavourId"]})
        );
        assert_eq!(
            fields.nfv(),
            &json!({
                "VDU": {
                    "VDU1-0": {"computeFlavourId": "m1.tiny", "vcImageId": "cirros-0.5.2", "locationConstraints": "nova-az1"},
                    "VDU1-1": {"computeFlavourId": "m1.tiny", "vcImageId": "cirros-0.5.2", "locationConstraints": null},
                    "VirtualStorage-0": {"vcImageId": "cirros-volume"},
                    "VirtualStorage-1": {"vcImageId": "cirros-volume"}
                },
                "CP": {
                    "VDU1_CP1-0": {"network": "ext-net"},
                    "VDU1_CP1-1": {"network": "ext-net"}
                }
            })
        );
        assert!(fields.files.is_some());
    }

    #[test]
    fn test_scale_out_continues_from_capacity() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = adds(&["res-a", "res-b"]);
        let req: ScaleVnfRequest =
            serde_json::from_value(json!({"type": "SCALE_OUT", "aspectId": "VDU1_scale"})).unwrap();

        let fields = StandardUserData.scale(&req, &fx.ctx()).unwrap();
        let template = rendered(&fields);
        for name in ["VDU1-0", "VDU1-1", "VDU1-2", "VDU1-3"] {
            assert!(template.resource(name).is_some(), "{name} missing");
        }
        // managed link recorded on the instance
        assert!(template.resource("internalVL1").is_none());
        assert_eq!(template.resources["VDU1-2"]["properties"]["net2"], json!("mgd-net"));

        // unresolved zones are pruned, existing VNFCs untouched
        assert_eq!(
            fields.nfv(),
            &json!({
                "VDU": {
                    "VDU1-2": {"computeFlavourId": "m1.tiny", "vcImageId": "cirros-0.5.2"},
                    "VDU1-3": {"computeFlavourId": "m1.tiny", "vcImageId": "cirros-0.5.2"},
                    "VirtualStorage-2": {"vcImageId": "cirros-volume"},
                    "VirtualStorage-3": {"vcImageId": "cirros-volume"}
                },
                "CP": {
                    "VDU1_CP1-2": {"network": "ext-net"},
                    "VDU1_CP1-3": {"network": "ext-net"}
                }
            })
        );
        assert!(fields.files.is_none());
    }

    #[test]
    fn test_scale_rollback_mirrors_scale_out() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = adds(&["res-a", "res-b"]);
        let req: ScaleVnfRequest =
            serde_json::from_value(json!({"type": "SCALE_OUT", "aspectId": "VDU1_scale"})).unwrap();

        let fields = StandardUserData.scale_rollback(&req, &fx.ctx()).unwrap();
        let template = rendered(&fields);
        assert_eq!(template.resources.len(), 2);
        assert_eq!(template.resources["VDU1-2"], Value::Null);
        assert_eq!(template.resources["VDU1-3"], Value::Null);
        assert_eq!(
            fields.nfv(),
            &json!({
                "VDU": {"VDU1-2": null, "VirtualStorage-2": null, "VDU1-3": null, "VirtualStorage-3": null},
                "CP": {"VDU1_CP1-2": null, "VDU1_CP2-2": null, "VDU1_CP1-3": null, "VDU1_CP2-3": null}
            })
        );
    }

    #[test]
    fn test_scale_in_deletes_by_recorded_index() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = removes(&["server-1"]);
        let req: ScaleVnfRequest =
            serde_json::from_value(json!({"type": "SCALE_IN", "aspectId": "VDU1_scale"})).unwrap();

        let fields = StandardUserData.scale(&req, &fx.ctx()).unwrap();
        let template = rendered(&fields);
        assert_eq!(template.resources.keys().collect::<Vec<_>>(), vec!["VDU1-1"]);
        assert_eq!(
            fields.nfv(),
            &json!({
                "VDU": {"VDU1-1": null, "VirtualStorage-1": null},
                "CP": {"VDU1_CP1-1": null, "VDU1_CP2-1": null}
            })
        );
    }

    #[test]
    fn test_scale_in_fails_closed() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        let req: ScaleVnfRequest =
            serde_json::from_value(json!({"type": "SCALE_IN", "aspectId": "VDU1_scale"})).unwrap();

        fx.grant_req = removes(&["server-404"]);
        assert!(matches!(
            StandardUserData.scale(&req, &fx.ctx()),
            Err(UserDataError::VnfcNotFound(id)) if id == "server-404"
        ));

        fx.inst = instantiated(json!({
            "flavourId": "simple",
            "vnfcResourceInfo": [
                {"id": "c9", "vduId": "VDU1", "computeResource": {"resourceId": "server-9"}}
            ]
        }));
        fx.grant_req = removes(&["server-9"]);
        assert!(matches!(
            StandardUserData.scale(&req, &fx.ctx()),
            Err(UserDataError::MissingVduIndex(id)) if id == "c9"
        ));
    }

    #[test]
    fn test_heal_touches_affected_indices_only() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = removes(&["server-1"]);
        fx.grant = serde_json::from_value(json!({
            "vimAssets": {"softwareImages": [
                {"vnfdSoftwareImageId": "VDU1", "vimSoftwareImageId": "img-new"}
            ]}
        }))
        .unwrap();

        let fields = StandardUserData.heal(&HealVnfRequest::default(), &fx.ctx()).unwrap();
        assert_eq!(
            fields.nfv(),
            &json!({"VDU": {"VDU1-1": {
                "computeFlavourId": "m1.tiny", "vcImageId": "img-new", "locationConstraints": "az-2"
            }}})
        );

        // without a granted image the captured one stays
        fx.grant = Default::default();
        let fields = StandardUserData.heal(&HealVnfRequest::default(), &fx.ctx()).unwrap();
        assert_eq!(fields.nfv()["VDU"]["VDU1-1"]["vcImageId"], json!("img-0"));
    }

    #[test]
    fn test_heal_takes_flavor_from_grant_only() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = removes(&["server-1"]);
        fx.grant = serde_json::from_value(json!({
            "vimAssets": {"computeResourceFlavours": [
                {"vnfdVirtualComputeDescId": "VDU1", "vimFlavourId": "m1.large"}
            ]}
        }))
        .unwrap();

        let fields = StandardUserData.heal(&HealVnfRequest::default(), &fx.ctx()).unwrap();
        assert_eq!(
            fields.nfv(),
            &json!({"VDU": {"VDU1-1": {
                "computeFlavourId": "m1.large", "vcImageId": "img-0", "locationConstraints": "az-2"
            }}})
        );

        // the descriptor default is not consulted
        fx.inst.instantiated_vnf_info.as_mut().unwrap().metadata["nfv"]["VDU"]["VDU1-1"]
            ["computeFlavourId"] = json!("m1.medium");
        fx.grant = Default::default();
        let fields = StandardUserData.heal(&HealVnfRequest::default(), &fx.ctx()).unwrap();
        assert_eq!(fields.nfv()["VDU"]["VDU1-1"]["computeFlavourId"], json!("m1.medium"));
    }

    #[test]
    fn test_change_ext_conn_per_live_vnfc() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        let req: ChangeExtVnfConnectivityRequest = serde_json::from_value(json!({
            "extVirtualLinks": [{"id": "e2", "resourceId": "ext-net-2", "extCps": [{"cpdId": "VDU1_CP1"}]}]
        }))
        .unwrap();

        let fields = StandardUserData.change_ext_conn(&req, &fx.ctx()).unwrap();
        assert_eq!(
            fields.nfv(),
            &json!({"CP": {
                "VDU1_CP1-0": {"network": "ext-net-2"},
                "VDU1_CP1-1": {"network": "ext-net-2"}
            }})
        );

        let rollback = StandardUserData.change_ext_conn_rollback(&req, &fx.ctx()).unwrap();
        assert_eq!(
            rollback.nfv(),
            &json!({"CP": {
                "VDU1_CP1-0": {"network": "ext-net"},
                "VDU1_CP1-1": {"network": "ext-net"}
            }})
        );
    }

    #[test]
    fn test_change_vnfpkg_replaces_targets_only() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = removes(&["server-1"]);
        fx.grant = serde_json::from_value(json!({
            "vimAssets": {"computeResourceFlavours": [
                {"vnfdVirtualComputeDescId": "VDU1", "vimFlavourId": "m1.large"}
            ]}
        }))
        .unwrap();
        let req: ChangeCurrentVnfPkgRequest =
            serde_json::from_value(json!({"vnfdId": "vnfd-2"})).unwrap();

        let fields = StandardUserData.change_vnfpkg(&req, &fx.ctx()).unwrap();
        assert_eq!(fields.existing, Some(false));
        assert!(fields.files.is_some());

        let nfv = fields.nfv();
        assert_eq!(
            nfv["VDU"]["VDU1-0"],
            json!({"computeFlavourId": "m1.tiny", "vcImageId": "img-0", "locationConstraints": "az-1"})
        );
        assert_eq!(
            nfv["VDU"]["VDU1-1"],
            json!({"computeFlavourId": "m1.large", "vcImageId": "cirros-0.5.2", "locationConstraints": "az-2"})
        );
        assert_eq!(nfv["VDU"]["VirtualStorage-1"], json!({"vcImageId": "cirros-volume"}));
        assert_eq!(nfv["CP"]["VDU1_CP1-1"], json!({"network": "ext-net"}));

        let template = rendered(&fields);
        assert!(template.resource("VDU1-0").is_some());
        assert!(template.resource("VDU1-1").is_some());
    }

    #[test]
    fn test_change_vnfpkg_rollback_is_symmetric() {
        let mut fx = indexed_fixture();
        fx.inst = two_vnfcs();
        fx.grant_req = removes(&["server-1"]);
        let req: ChangeCurrentVnfPkgRequest =
            serde_json::from_value(json!({"vnfdId": "vnfd-2"})).unwrap();

        let forward = StandardUserData.change_vnfpkg(&req, &fx.ctx()).unwrap();
        let rollback = StandardUserData.change_vnfpkg_rollback(&req, &fx.ctx()).unwrap();

        for cat in ["VDU", "CP"] {
            let keys = |fields: &StackFields| {
                fields.nfv()[cat]
                    .as_object()
                    .unwrap()
                    .keys()
                    .cloned()
                    .collect::<BTreeSet<_>>()
            };
            assert_eq!(keys(&forward), keys(&rollback), "{cat} keys differ");
        }
        assert_eq!(rollback.existing, Some(false));
        assert_eq!(rollback.nfv()["VDU"], fx.inst.applied_nfv().unwrap()["VDU"]);
    }

    #[test]
    fn test_change_vnfpkg_kept_vnfc_needs_captured_params() {
        let mut fx = indexed_fixture();
        fx.inst = instantiated(json!({
            "flavourId": "simple",
            "vnfcResourceInfo": [
                {"id": "c0", "vduId": "VDU1", "computeResource": {"resourceId": "server-0"},
                 "metadata": {"vdu_idx": 0}},
                {"id": "c1", "vduId": "VDU1", "computeResource": {"resourceId": "server-1"},
                 "metadata": {"vdu_idx": 1, "flavor": "m1.small", "image-VDU1": "img-1",
                              "image-VirtualStorage": "vol-1", "zone": "az-9"}}
            ]
        }));
        let req: ChangeCurrentVnfPkgRequest =
            serde_json::from_value(json!({"vnfdId": "vnfd-2"})).unwrap();

        fx.grant_req = removes(&["server-0"]);
        let fields = StandardUserData.change_vnfpkg(&req, &fx.ctx()).unwrap();
        // kept VNFC rebuilt from the values captured on its record
        assert_eq!(
            fields.nfv()["VDU"]["VDU1-1"],
            json!({"computeFlavourId": "m1.small", "vcImageId": "img-1", "locationConstraints": "az-9"})
        );
        assert_eq!(fields.nfv()["VDU"]["VirtualStorage-1"], json!({"vcImageId": "vol-1"}));

        fx.grant_req = removes(&["server-1"]);
        assert!(matches!(
            StandardUserData.change_vnfpkg(&req, &fx.ctx()),
            Err(UserDataError::MissingCapturedParams(name)) if name == "VDU1-0"
        ));
    }

    #[test]
    fn test_unmentioned_fixed_ip_cp_keeps_captured_value() {
        let mut fx = fixture(
            HotTemplate::from_yaml(
                r#"
resources:
  VDU1:
    type: VDU1.yaml
    properties:
      flavor: { get_param: [ nfv, VDU, VDU1, computeFlavourId ] }
      ip2: { get_param: [ nfv, CP, VDU1_CP2, fixed_ips, 0, ip_address ] }
"#,
            )
            .unwrap(),
        );
        fx.inst = instantiated(json!({
            "flavourId": "simple",
            "vnfcResourceInfo": [
                {"id": "c0", "vduId": "VDU1", "computeResource": {"resourceId": "server-0"},
                 "metadata": {"vdu_idx": 0}}
            ],
            "metadata": {"nfv": {
                "VDU": {"VDU1-0": {"computeFlavourId": "m1.tiny"}},
                "CP": {"VDU1_CP2-0": {"fixed_ips": [{"ip_address": "192.168.0.10"}]}}
            }}
        }));
        let captured = json!({"fixed_ips": [{"ip_address": "192.168.0.10"}]});

        let req: ChangeCurrentVnfPkgRequest =
            serde_json::from_value(json!({"vnfdId": "vnfd-2"})).unwrap();
        let fields = StandardUserData.change_vnfpkg(&req, &fx.ctx()).unwrap();
        assert_eq!(fields.nfv()["CP"]["VDU1_CP2-0"], captured);

        let req: ChangeExtVnfConnectivityRequest = serde_json::from_value(json!({
            "extVirtualLinks": [{"id": "e2", "resourceId": "ext-net-2", "extCps": [{"cpdId": "VDU1_CP1"}]}]
        }))
        .unwrap();
        let fields = StandardUserData.change_ext_conn(&req, &fx.ctx()).unwrap();
        assert!(fields.nfv()["CP"].get("VDU1_CP2-0").is_none());
    }
}
