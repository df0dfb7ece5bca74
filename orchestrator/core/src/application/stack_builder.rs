// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stack Builder
//!
//! Entry point of the engine: picks the userdata strategy a request asks
//! for, loads the descriptor the operation renders against, checks the
//! flavour and its base template exist and hands the snapshots to the
//! strategy. Delta outputs are merged onto the parameter map already
//! applied to the stack before they are returned.
//!
//! | Operation | Descriptor | Flavour |
//! |-----------|------------|---------|
//! | instantiate | instance `vnfdId` | request `flavourId` |
//! | change-package | grant request `dstVnfdId`, else request `vnfdId` | instance |
//! | change-package rollback | instance `vnfdId` | instance |
//! | anything else | instance `vnfdId` | instance |

use crate::application::userdata::{LcmContext, UserData, UserDataError, UserDataRegistry};
use crate::domain::grant::{Grant, GrantRequest};
use crate::domain::lcm_request::{LcmOperationType, LcmRequest, ScaleType};
use crate::domain::stack::StackFields;
use crate::domain::vnf_instance::VnfInstance;
use crate::domain::vnfd::{VnfdError, VnfdRepository};
use std::sync::Arc;
use tracing::{debug, info};

const STACK_NAME_PREFIX: &str = "vnf-";

#[derive(Debug, thiserror::Error)]
pub enum StackBuildError {
    #[error("{0} has no rollback")]
    RollbackUnsupported(String),

    #[error(transparent)]
    UserData(#[from] UserDataError),

    #[error(transparent)]
    Vnfd(#[from] VnfdError),
}

/// Name of the stack backing a VNF instance
pub fn stack_name(inst: &VnfInstance) -> String {
    format!("{STACK_NAME_PREFIX}{}", inst.id)
}

pub struct StackBuilder {
    registry: Arc<UserDataRegistry>,
    repository: Arc<dyn VnfdRepository>,
    stack_create_timeout_mins: u32,
}

impl StackBuilder {
    pub fn new(
        registry: Arc<UserDataRegistry>,
        repository: Arc<dyn VnfdRepository>,
        stack_create_timeout_mins: u32,
    ) -> Self {
        Self {
            registry,
            repository,
            stack_create_timeout_mins,
        }
    }

    /// Fields for the forward operation
    pub fn make_fields(
        &self,
        request: &LcmRequest,
        inst: &VnfInstance,
        grant_req: &GrantRequest,
        grant: &Grant,
    ) -> Result<StackFields, StackBuildError> {
        self.build(request, inst, grant_req, grant, false)
    }

    /// Fields undoing a failed forward operation
    pub fn make_rollback_fields(
        &self,
        request: &LcmRequest,
        inst: &VnfInstance,
        grant_req: &GrantRequest,
        grant: &Grant,
    ) -> Result<StackFields, StackBuildError> {
        match request {
            LcmRequest::Instantiate(_) | LcmRequest::Heal(_) => {
                return Err(StackBuildError::RollbackUnsupported(
                    request.operation().to_string(),
                ));
            }
            LcmRequest::Scale(req) if req.scale_type == ScaleType::ScaleIn => {
                return Err(StackBuildError::RollbackUnsupported("SCALE_IN".to_string()));
            }
            _ => {}
        }
        self.build(request, inst, grant_req, grant, true)
    }

    fn target_vnfd_id<'a>(
        request: &'a LcmRequest,
        inst: &'a VnfInstance,
        grant_req: &'a GrantRequest,
        rollback: bool,
    ) -> &'a str {
        match request {
            LcmRequest::ChangeVnfpkg(req) if !rollback => grant_req
                .dst_vnfd_id
                .as_deref()
                .unwrap_or(req.vnfd_id.as_str()),
            _ => inst.vnfd_id.as_str(),
        }
    }

    fn build(
        &self,
        request: &LcmRequest,
        inst: &VnfInstance,
        grant_req: &GrantRequest,
        grant: &Grant,
        rollback: bool,
    ) -> Result<StackFields, StackBuildError> {
        let operation = request.operation();
        let strategy = self.registry.select(request.params().additional_params())?;

        let vnfd_id = Self::target_vnfd_id(request, inst, grant_req, rollback);
        let vnfd = self.repository.load(vnfd_id)?;

        let flavour_id = match request {
            LcmRequest::Instantiate(req) => req.flavour_id.as_str(),
            _ => inst
                .flavour_id()
                .ok_or_else(|| UserDataError::InstanceNotInstantiated(inst.id.clone()))?,
        };
        vnfd.require_flavour(flavour_id)?;
        vnfd.require_base_hot(flavour_id)?;

        info!(
            operation = %operation,
            rollback,
            vnf_instance_id = %inst.id,
            vnfd_id,
            flavour_id,
            userdata = strategy.class_name(),
            "Rendering stack fields"
        );

        let ctx = LcmContext {
            inst,
            grant_req,
            grant,
            vnfd: &vnfd,
        };
        let mut fields = dispatch(strategy.as_ref(), request, &ctx, rollback)?;

        // anything short of a replacement updates the running stack
        if fields.existing != Some(false) && !matches!(request, LcmRequest::Instantiate(_)) {
            if let Some(applied) = inst.applied_nfv() {
                debug!(operation = %operation, "Merging delta onto applied parameters");
                fields.merge_existing_nfv(applied);
            }
        }

        fields.stack_name = Some(stack_name(inst));
        if operation == LcmOperationType::Instantiate {
            fields.timeout_mins = Some(self.stack_create_timeout_mins);
        }
        Ok(fields)
    }
}

fn dispatch(
    strategy: &dyn UserData,
    request: &LcmRequest,
    ctx: &LcmContext<'_>,
    rollback: bool,
) -> Result<StackFields, UserDataError> {
    match (request, rollback) {
        (LcmRequest::Instantiate(req), _) => strategy.instantiate(req, ctx),
        (LcmRequest::Scale(req), false) => strategy.scale(req, ctx),
        (LcmRequest::Scale(req), true) => strategy.scale_rollback(req, ctx),
        (LcmRequest::Heal(req), _) => strategy.heal(req, ctx),
        (LcmRequest::ChangeExtConn(req), false) => strategy.change_ext_conn(req, ctx),
        (LcmRequest::ChangeExtConn(req), true) => strategy.change_ext_conn_rollback(req, ctx),
        (LcmRequest::ChangeVnfpkg(req), false) => strategy.change_vnfpkg(req, ctx),
        (LcmRequest::ChangeVnfpkg(req), true) => strategy.change_vnfpkg_rollback(req, ctx),
    }
}
