// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure Template
//!
//! A HOT-like template: every top-level section is kept verbatim and the
//! `resources` section is split out so orchestrators can pop, index and
//! re-insert VDU fragments.
//!
//! ```yaml
//! heat_template_version: 2013-05-23
//! resources:
//!   VDU1:
//!     type: VDU1.yaml
//!     properties:
//!       flavor: { get_param: [ nfv, VDU, VDU1, computeFlavourId ] }
//!       net1: { get_resource: internalVL1 }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of the resources section
pub const RESOURCES: &str = "resources";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template must be a mapping")]
    NotAMapping,

    #[error("template `resources` must be a mapping")]
    ResourcesNotAMapping,

    #[error("template YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parsed infrastructure template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotTemplate {
    /// Every top-level key other than `resources`
    pub sections: Map<String, Value>,
    pub resources: Map<String, Value>,
}

impl HotTemplate {
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        let Value::Object(mut sections) = value else {
            return Err(TemplateError::NotAMapping);
        };
        let resources = match sections.remove(RESOURCES) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(resources)) => resources,
            Some(_) => return Err(TemplateError::ResourcesNotAMapping),
        };
        Ok(Self {
            sections,
            resources,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Template consisting of a resources section only
    pub fn from_resources(resources: Map<String, Value>) -> Self {
        Self {
            sections: Map::new(),
            resources,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.sections.clone();
        map.insert(
            RESOURCES.to_string(),
            Value::Object(self.resources.clone()),
        );
        Value::Object(map)
    }

    pub fn to_yaml(&self) -> Result<String, TemplateError> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }

    pub fn resource(&self, name: &str) -> Option<&Value> {
        self.resources.get(name)
    }

    pub fn insert_resource(&mut self, name: impl Into<String>, fragment: Value) {
        self.resources.insert(name.into(), fragment);
    }

    pub fn remove_resource(&mut self, name: &str) -> Option<Value> {
        self.resources.remove(name)
    }

    /// `type` of a resource, if it is a string
    pub fn resource_type(&self, name: &str) -> Option<&str> {
        self.resources
            .get(name)
            .and_then(|r| r.get("type"))
            .and_then(Value::as_str)
    }
}

/// Base template for one deployment flavour plus its nested templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseHot {
    pub template: HotTemplate,
    /// Nested template file name -> parsed content
    pub files: BTreeMap<String, Value>,
}

impl BaseHot {
    /// Serialize every nested file to YAML text
    pub fn files_as_yaml(&self) -> Result<BTreeMap<String, String>, TemplateError> {
        self.files
            .iter()
            .map(|(name, content)| Ok((name.clone(), serde_yaml::to_string(content)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_yaml_splits_resources() {
        let yaml = r#"
heat_template_version: 2013-05-23
description: test
resources:
  VDU1:
    type: VDU1.yaml
    properties:
      flavor: { get_param: [ nfv, VDU, VDU1, computeFlavourId ] }
"#;
        let hot = HotTemplate::from_yaml(yaml).unwrap();
        assert_eq!(hot.sections.len(), 2);
        assert_eq!(hot.resource_type("VDU1"), Some("VDU1.yaml"));
        assert_eq!(
            hot.to_value()["resources"]["VDU1"]["properties"]["flavor"],
            json!({"get_param": ["nfv", "VDU", "VDU1", "computeFlavourId"]})
        );
    }

    #[test]
    fn test_missing_resources_is_empty() {
        let hot = HotTemplate::from_value(json!({"description": "x"})).unwrap();
        assert!(hot.resources.is_empty());
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(matches!(
            HotTemplate::from_value(json!([1, 2])),
            Err(TemplateError::NotAMapping)
        ));
        assert!(matches!(
            HotTemplate::from_value(json!({"resources": [1]})),
            Err(TemplateError::ResourcesNotAMapping)
        ));
    }

    #[test]
    fn test_to_yaml_round_trips_null_resources() {
        let mut resources = Map::new();
        resources.insert("VDU1-0".to_string(), Value::Null);
        let hot = HotTemplate::from_resources(resources);
        let yaml = hot.to_yaml().unwrap();
        let back: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, json!({"resources": {"VDU1-0": null}}));
    }
}
