// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Anonymous-pool strategy: each VDU is one scaling group and only its
//! `desired_capacity` changes over the instance lifetime.

use super::{fill_attr, merge_additional_params, LcmContext, UserData, UserDataError};
use crate::application::managed_links::apply_managed_links_from_request;
use crate::application::param_extractor::{category, init_nfv_dict};
use crate::application::param_resolver::{
    capacity, current_capacity, flavor, image, opt_to_value, zone, CpSource, ATTR_CAPACITY,
    ATTR_FLAVOR, ATTR_IMAGE, ATTR_ZONE,
};
use crate::domain::engine_config::DEFAULT_USERDATA_CLASS;
use crate::domain::lcm_request::{
    ChangeExtVnfConnectivityRequest, HealVnfRequest, InstantiateVnfRequest, ScaleVnfRequest,
};
use crate::domain::stack::StackFields;
use serde_json::{json, Map, Value};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultUserData;

impl DefaultUserData {
    /// `{VDU: {<vdu>: {desired_capacity}}}` for every VDU with a capacity
    /// placeholder
    fn capacity_delta(
        &self,
        ctx: &LcmContext<'_>,
        capacity_of: impl Fn(&str) -> i64,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let nfv = init_nfv_dict(&ctx.base_hot(flavour_id)?.template);

        let mut vdus = Map::new();
        for (vdu_name, entry) in category(&nfv, "VDU").into_iter().flatten() {
            if entry.get(ATTR_CAPACITY).is_some() {
                vdus.insert(
                    vdu_name.clone(),
                    json!({ ATTR_CAPACITY: capacity_of(vdu_name) }),
                );
            }
        }
        Ok(StackFields::with_nfv(json!({ "VDU": vdus })))
    }

    fn cp_delta(&self, ctx: &LcmContext<'_>, source: CpSource<'_>) -> Result<StackFields, UserDataError> {
        let flavour_id = ctx.instance_flavour()?;
        let nfv = init_nfv_dict(&ctx.base_hot(flavour_id)?.template);

        let cps: Map<String, Value> = category(&nfv, "CP")
            .into_iter()
            .flatten()
            .filter_map(|(cp_name, skeleton)| {
                source
                    .resolve_delta(cp_name, skeleton)
                    .map(|delta| (cp_name.clone(), delta))
            })
            .collect();
        Ok(StackFields::with_nfv(json!({ "CP": cps })))
    }
}

impl UserData for DefaultUserData {
    fn class_name(&self) -> &'static str {
        DEFAULT_USERDATA_CLASS
    }

    fn instantiate(
        &self,
        req: &InstantiateVnfRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        let flavour_id = req.flavour_id.as_str();
        let base_hot = ctx.base_hot(flavour_id)?;
        let mut template = base_hot.template.clone();

        let mut nfv = init_nfv_dict(&template);

        if let Some(Value::Object(vdus)) = nfv.get_mut("VDU") {
            for (vdu_name, entry) in vdus.iter_mut() {
                fill_attr(entry, ATTR_FLAVOR, || {
                    opt_to_value(flavor(vdu_name, flavour_id, ctx.vnfd, ctx.grant))
                });
                fill_attr(entry, ATTR_IMAGE, || {
                    opt_to_value(image(vdu_name, flavour_id, ctx.vnfd, ctx.grant, true))
                });
                fill_attr(entry, ATTR_ZONE, || {
                    opt_to_value(zone(vdu_name, ctx.grant_req, ctx.grant))
                });
                fill_attr(entry, ATTR_CAPACITY, || {
                    json!(capacity(vdu_name, ctx.inst, ctx.grant_req))
                });
            }
        }

        let source = CpSource::Request {
            grant: ctx.grant,
            req,
        };
        if let Some(Value::Object(cps)) = nfv.get_mut("CP") {
            for (cp_name, entry) in cps.iter_mut() {
                *entry = source.resolve_entry(cp_name, entry);
            }
        }

        apply_managed_links_from_request(&mut template, ctx.grant, req);
        let nfv = merge_additional_params(nfv, req, ctx.grant);

        debug!(flavour = flavour_id, resources = template.resources.len(), "Rendered anonymous instantiate");

        Ok(StackFields {
            template: Some(template.to_yaml()?),
            files: Some(base_hot.files_as_yaml()?),
            ..StackFields::with_nfv(nfv)
        })
    }

    fn scale(&self, _req: &ScaleVnfRequest, ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        self.capacity_delta(ctx, |vdu| capacity(vdu, ctx.inst, ctx.grant_req))
    }

    fn scale_rollback(
        &self,
        _req: &ScaleVnfRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        self.capacity_delta(ctx, |vdu| current_capacity(vdu, ctx.inst) as i64)
    }

    fn heal(&self, _req: &HealVnfRequest, _ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        // healing recreates the failed members; no parameter changes
        Ok(StackFields::with_nfv(json!({})))
    }

    fn change_ext_conn(
        &self,
        req: &ChangeExtVnfConnectivityRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        self.cp_delta(
            ctx,
            CpSource::Request {
                grant: ctx.grant,
                req,
            },
        )
    }

    fn change_ext_conn_rollback(
        &self,
        _req: &ChangeExtVnfConnectivityRequest,
        ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        self.cp_delta(ctx, CpSource::Instance(ctx.inst))
    }
}
