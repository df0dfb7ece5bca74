// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lifecycle Operation Requests
//!
//! Typed bodies of the lifecycle requests the engine renders templates for.
//! Schema validation belongs to the API layer; every field the engine does
//! not strictly need is optional or defaulted.

use super::ext_link::{ExtManagedVirtualLinkData, ExtVirtualLinkData};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LcmOperationType {
    Instantiate,
    Scale,
    ScaleToLevel,
    ChangeFlavour,
    Terminate,
    Heal,
    Operate,
    ChangeExtConn,
    ModifyInfo,
    CreateSnapshot,
    RevertToSnapshot,
    ChangeVnfpkg,
}

impl LcmOperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LcmOperationType::Instantiate => "INSTANTIATE",
            LcmOperationType::Scale => "SCALE",
            LcmOperationType::ScaleToLevel => "SCALE_TO_LEVEL",
            LcmOperationType::ChangeFlavour => "CHANGE_FLAVOUR",
            LcmOperationType::Terminate => "TERMINATE",
            LcmOperationType::Heal => "HEAL",
            LcmOperationType::Operate => "OPERATE",
            LcmOperationType::ChangeExtConn => "CHANGE_EXT_CONN",
            LcmOperationType::ModifyInfo => "MODIFY_INFO",
            LcmOperationType::CreateSnapshot => "CREATE_SNAPSHOT",
            LcmOperationType::RevertToSnapshot => "REVERT_TO_SNAPSHOT",
            LcmOperationType::ChangeVnfpkg => "CHANGE_VNFPKG",
        }
    }
}

impl fmt::Display for LcmOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LcmOperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_ascii_uppercase()))
            .map_err(|_| format!("unknown lifecycle operation: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleType {
    ScaleOut,
    ScaleIn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateVnfRequest {
    pub flavour_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiation_level_id: Option<String>,
    #[serde(default)]
    pub ext_virtual_links: Vec<ExtVirtualLinkData>,
    #[serde(default)]
    pub ext_managed_virtual_links: Vec<ExtManagedVirtualLinkData>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleVnfRequest {
    #[serde(rename = "type")]
    pub scale_type: ScaleType,
    pub aspect_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_steps: Option<u32>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealVnfRequest {
    #[serde(default)]
    pub vnfc_instance_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeExtVnfConnectivityRequest {
    #[serde(default)]
    pub ext_virtual_links: Vec<ExtVirtualLinkData>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCurrentVnfPkgRequest {
    pub vnfd_id: String,
    #[serde(default)]
    pub ext_virtual_links: Vec<ExtVirtualLinkData>,
    #[serde(default)]
    pub ext_managed_virtual_links: Vec<ExtManagedVirtualLinkData>,
    #[serde(default)]
    pub additional_params: Map<String, Value>,
}

/// Request fields the resolvers read, uniform over every request kind
pub trait LcmParams {
    fn additional_params(&self) -> &Map<String, Value>;

    fn ext_virtual_links(&self) -> &[ExtVirtualLinkData] {
        &[]
    }

    fn ext_managed_virtual_links(&self) -> &[ExtManagedVirtualLinkData] {
        &[]
    }

    /// `additionalParams.nfv`, the caller's parameter overrides
    fn additional_nfv(&self) -> Option<&Value> {
        self.additional_params().get("nfv")
    }
}

impl LcmParams for InstantiateVnfRequest {
    fn additional_params(&self) -> &Map<String, Value> {
        &self.additional_params
    }

    fn ext_virtual_links(&self) -> &[ExtVirtualLinkData] {
        &self.ext_virtual_links
    }

    fn ext_managed_virtual_links(&self) -> &[ExtManagedVirtualLinkData] {
        &self.ext_managed_virtual_links
    }
}

impl LcmParams for ScaleVnfRequest {
    fn additional_params(&self) -> &Map<String, Value> {
        &self.additional_params
    }
}

impl LcmParams for HealVnfRequest {
    fn additional_params(&self) -> &Map<String, Value> {
        &self.additional_params
    }
}

impl LcmParams for ChangeExtVnfConnectivityRequest {
    fn additional_params(&self) -> &Map<String, Value> {
        &self.additional_params
    }

    fn ext_virtual_links(&self) -> &[ExtVirtualLinkData] {
        &self.ext_virtual_links
    }
}

impl LcmParams for ChangeCurrentVnfPkgRequest {
    fn additional_params(&self) -> &Map<String, Value> {
        &self.additional_params
    }

    fn ext_virtual_links(&self) -> &[ExtVirtualLinkData] {
        &self.ext_virtual_links
    }

    fn ext_managed_virtual_links(&self) -> &[ExtManagedVirtualLinkData] {
        &self.ext_managed_virtual_links
    }
}

/// Any request the engine can render a template for
#[derive(Debug, Clone, PartialEq)]
pub enum LcmRequest {
    Instantiate(InstantiateVnfRequest),
    Scale(ScaleVnfRequest),
    Heal(HealVnfRequest),
    ChangeExtConn(ChangeExtVnfConnectivityRequest),
    ChangeVnfpkg(ChangeCurrentVnfPkgRequest),
}

impl LcmRequest {
    /// Decode a request body for the given operation
    pub fn from_value(
        operation: LcmOperationType,
        body: Value,
    ) -> Result<Self, LcmRequestError> {
        let request = match operation {
            LcmOperationType::Instantiate => Self::Instantiate(serde_json::from_value(body)?),
            LcmOperationType::Scale => Self::Scale(serde_json::from_value(body)?),
            LcmOperationType::Heal => Self::Heal(serde_json::from_value(body)?),
            LcmOperationType::ChangeExtConn => Self::ChangeExtConn(serde_json::from_value(body)?),
            LcmOperationType::ChangeVnfpkg => Self::ChangeVnfpkg(serde_json::from_value(body)?),
            other => return Err(LcmRequestError::Unsupported(other)),
        };
        Ok(request)
    }

    pub fn operation(&self) -> LcmOperationType {
        match self {
            LcmRequest::Instantiate(_) => LcmOperationType::Instantiate,
            LcmRequest::Scale(_) => LcmOperationType::Scale,
            LcmRequest::Heal(_) => LcmOperationType::Heal,
            LcmRequest::ChangeExtConn(_) => LcmOperationType::ChangeExtConn,
            LcmRequest::ChangeVnfpkg(_) => LcmOperationType::ChangeVnfpkg,
        }
    }

    pub fn params(&self) -> &dyn LcmParams {
        match self {
            LcmRequest::Instantiate(req) => req,
            LcmRequest::Scale(req) => req,
            LcmRequest::Heal(req) => req,
            LcmRequest::ChangeExtConn(req) => req,
            LcmRequest::ChangeVnfpkg(req) => req,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LcmRequestError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("operation {0} does not produce a template")]
    Unsupported(LcmOperationType),
}
