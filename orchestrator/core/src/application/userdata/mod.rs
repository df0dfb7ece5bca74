// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Userdata Strategies
//!
//! A userdata strategy turns one lifecycle operation into [`StackFields`].
//! Two strategies are built in:
//!
//! | Class | Identity model |
//! |-------|----------------|
//! | [`DefaultUserData`] | anonymous pool per VDU, only `desired_capacity` changes |
//! | [`StandardUserData`] | one `<vdu>-<idx>` resource per VNFC, durable index |
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Operation orchestration over the resolvers, the extractor
//!   and the managed-link rewriter
//!
//! Every method is a pure function of its inputs. Operations a strategy does
//! not support return [`UserDataError::NotImplemented`].

pub mod default;
pub mod registry;
pub mod standard;

pub use default::DefaultUserData;
pub use registry::UserDataRegistry;
pub use standard::StandardUserData;

use crate::domain::grant::{Grant, GrantRequest};
use crate::domain::lcm_request::{
    ChangeCurrentVnfPkgRequest, ChangeExtVnfConnectivityRequest, HealVnfRequest,
    InstantiateVnfRequest, LcmParams, ScaleVnfRequest,
};
use crate::domain::stack::StackFields;
use crate::domain::template::{BaseHot, TemplateError};
use crate::domain::tree::merge_patch;
use crate::domain::vnf_instance::VnfInstance;
use crate::domain::vnfd::{Vnfd, VnfdError};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum UserDataError {
    #[error("userdata class {class} does not implement {operation}")]
    NotImplemented {
        class: String,
        operation: &'static str,
    },

    #[error("lcm-operation-user-data and lcm-operation-user-data-class must be specified together")]
    UserdataMissing,

    #[error("unknown userdata class: {0}")]
    UnknownClass(String),

    #[error("VNF instance {0} is not instantiated")]
    InstanceNotInstantiated(String),

    #[error("no VNFC found for compute resource {0}")]
    VnfcNotFound(String),

    #[error("VNFC {0} has no vdu_idx")]
    MissingVduIndex(String),

    #[error("no captured parameters for {0}")]
    MissingCapturedParams(String),

    #[error(transparent)]
    Vnfd(#[from] VnfdError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Snapshots shared by every operation
#[derive(Clone, Copy)]
pub struct LcmContext<'a> {
    pub inst: &'a VnfInstance,
    pub grant_req: &'a GrantRequest,
    pub grant: &'a Grant,
    /// Descriptor the operation renders against; the target package for a
    /// forward change-package
    pub vnfd: &'a Vnfd,
}

impl<'a> LcmContext<'a> {
    /// Flavour the instance was instantiated with
    pub fn instance_flavour(&self) -> Result<&'a str, UserDataError> {
        self.inst
            .flavour_id()
            .ok_or_else(|| UserDataError::InstanceNotInstantiated(self.inst.id.clone()))
    }

    pub fn base_hot(&self, flavour_id: &str) -> Result<&'a BaseHot, UserDataError> {
        Ok(self.vnfd.require_base_hot(flavour_id)?)
    }
}

fn not_implemented(class: &str, operation: &'static str) -> UserDataError {
    UserDataError::NotImplemented {
        class: class.to_string(),
        operation,
    }
}

/// One lifecycle strategy
pub trait UserData: Send + Sync {
    fn class_name(&self) -> &'static str;

    fn instantiate(
        &self,
        _req: &InstantiateVnfRequest,
        _ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "instantiate"))
    }

    fn scale(&self, _req: &ScaleVnfRequest, _ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "scale"))
    }

    fn scale_rollback(
        &self,
        _req: &ScaleVnfRequest,
        _ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "scale_rollback"))
    }

    fn heal(&self, _req: &HealVnfRequest, _ctx: &LcmContext<'_>) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "heal"))
    }

    fn change_ext_conn(
        &self,
        _req: &ChangeExtVnfConnectivityRequest,
        _ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "change_ext_conn"))
    }

    fn change_ext_conn_rollback(
        &self,
        _req: &ChangeExtVnfConnectivityRequest,
        _ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "change_ext_conn_rollback"))
    }

    fn change_vnfpkg(
        &self,
        _req: &ChangeCurrentVnfPkgRequest,
        _ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "change_vnfpkg"))
    }

    fn change_vnfpkg_rollback(
        &self,
        _req: &ChangeCurrentVnfPkgRequest,
        _ctx: &LcmContext<'_>,
    ) -> Result<StackFields, UserDataError> {
        Err(not_implemented(self.class_name(), "change_vnfpkg_rollback"))
    }
}

/// Apply `additionalParams.nfv` of the request, then of the grant
pub fn merge_additional_params(mut nfv: Value, req: &dyn LcmParams, grant: &Grant) -> Value {
    if let Some(patch) = req.additional_nfv() {
        merge_patch(&mut nfv, patch);
    }
    if let Some(patch) = grant.additional_params.get("nfv") {
        merge_patch(&mut nfv, patch);
    }
    nfv
}

/// Set `attr` of a skeleton entry only if the template asks for it
pub(crate) fn fill_attr(entry: &mut Value, attr: &str, resolve: impl FnOnce() -> Value) {
    if let Some(slot) = entry.get_mut(attr) {
        *slot = resolve();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::LcmContext;
    use crate::domain::grant::{Grant, GrantRequest};
    use crate::domain::template::{BaseHot, HotTemplate};
    use crate::domain::vnf_instance::VnfInstance;
    use crate::domain::vnfd::tests::sample_vnfd;
    use crate::domain::vnfd::Vnfd;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    pub(crate) struct Fixture {
        pub inst: VnfInstance,
        pub grant_req: GrantRequest,
        pub grant: Grant,
        pub vnfd: Vnfd,
    }

    impl Fixture {
        pub(crate) fn ctx(&self) -> LcmContext<'_> {
            LcmContext {
                inst: &self.inst,
                grant_req: &self.grant_req,
                grant: &self.grant,
                vnfd: &self.vnfd,
            }
        }
    }

    /// Sample descriptor whose `simple` flavour uses `template`
    pub(crate) fn fixture(template: HotTemplate) -> Fixture {
        let mut vnfd = sample_vnfd();
        let mut files = BTreeMap::new();
        files.insert(
            "VDU1.yaml".to_string(),
            json!({
                "heat_template_version": "2013-05-23",
                "resources": {"VDU1": {"type": "OS::Nova::Server"}}
            }),
        );
        vnfd.base_hots
            .insert("simple".to_string(), BaseHot { template, files });

        Fixture {
            inst: VnfInstance {
                id: "inst-1".to_string(),
                vnfd_id: "vnfd-1".to_string(),
                ..Default::default()
            },
            grant_req: GrantRequest::default(),
            grant: Grant::default(),
            vnfd,
        }
    }

    /// Instance snapshot around an `instantiatedVnfInfo` body
    pub(crate) fn instantiated(info: Value) -> VnfInstance {
        serde_json::from_value(json!({
            "id": "inst-1",
            "vnfdId": "vnfd-1",
            "instantiationState": "INSTANTIATED",
            "instantiatedVnfInfo": info
        }))
        .unwrap()
    }
}
