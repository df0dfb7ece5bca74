// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stack Fields
//!
//! The record handed to the infrastructure backend: a template (YAML text),
//! the `nfv` parameter map, nested template files and whether the backend
//! should update the existing stack or replace it.

use super::tree::merge_patch;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackParameters {
    pub nfv: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub parameters: StackParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, String>>,
    /// `Some(false)` asks the backend to replace rather than update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_mins: Option<u32>,
}

impl StackFields {
    /// Fields carrying only a parameter map
    pub fn with_nfv(nfv: Value) -> Self {
        Self {
            parameters: StackParameters { nfv },
            ..Default::default()
        }
    }

    pub fn nfv(&self) -> &Value {
        &self.parameters.nfv
    }

    /// Merge this delta onto the parameter map already applied to the stack.
    ///
    /// The delta wins; `null` entries delete the applied ones.
    pub fn merge_existing_nfv(&mut self, applied: &Value) {
        let mut merged = if applied.is_object() {
            applied.clone()
        } else {
            Value::Object(Map::new())
        };
        merge_patch(&mut merged, &self.parameters.nfv);
        self.parameters.nfv = merged;
    }
}
