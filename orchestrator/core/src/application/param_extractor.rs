// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Parameter Placeholder Extraction
//!
//! Collects every `{get_param: [nfv, <category>, <name>, <attr>...]}` found in
//! the resources of an assembled template and builds the all-null `nfv`
//! skeleton the resolvers fill in:
//!
//! ```yaml
//! # { get_param: [ nfv, VDU, VDU1-0, computeFlavourId ] }
//! # { get_param: [ nfv, CP, VDU1_CP1-0, fixed_ips, 0, ip_address ] }
//! VDU:
//!   VDU1-0:
//!     computeFlavourId: null
//! CP:
//!   VDU1_CP1-0:
//!     fixed_ips:
//!       "0":
//!         ip_address: null
//! ```
//!
//! Sequence-valued attributes are not modelled; numeric path elements become
//! their decimal key and only `fixed_ips` is given positional meaning later.

use crate::domain::index::{GET_PARAM, MIN_PLACEHOLDER_LEN};
use crate::domain::template::HotTemplate;
use crate::domain::tree::{walk_entries, Step};
use serde_json::{Map, Value};

const NFV_HEAD: &str = "nfv";

/// Every `get_param` value found in resource properties, in walk order
pub fn collect_placeholders(template: &HotTemplate) -> Vec<&Value> {
    let mut found = Vec::new();
    for resource in template.resources.values() {
        let Some(properties) = resource.get("properties") else {
            continue;
        };
        walk_entries(properties, &mut |key, value| {
            if key == GET_PARAM {
                found.push(value);
                Step::Skip
            } else {
                Step::Descend
            }
        });
    }
    found
}

/// Key path of an `nfv` placeholder, without the leading `nfv`
fn placeholder_path(param: &Value) -> Option<Vec<String>> {
    let items = param.as_array()?;
    if items.len() < MIN_PLACEHOLDER_LEN || items[0].as_str() != Some(NFV_HEAD) {
        return None;
    }
    items[1..]
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn insert_null_leaf(root: &mut Map<String, Value>, path: &[String]) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for key in parents {
        let slot = node
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        // a deeper placeholder turns a null leaf into a branch
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(child) = slot else {
            return;
        };
        node = child;
    }
    // a shorter placeholder never collapses an existing branch
    node.entry(leaf.clone()).or_insert(Value::Null);
}

/// Build the all-null `nfv` skeleton of a template
pub fn init_nfv_dict(template: &HotTemplate) -> Value {
    let mut nfv = Map::new();
    for path in collect_placeholders(template)
        .into_iter()
        .filter_map(placeholder_path)
    {
        insert_null_leaf(&mut nfv, &path);
    }
    Value::Object(nfv)
}

/// Names under one category of a skeleton, e.g. `VDU` or `CP`
pub fn category<'a>(nfv: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    nfv.get(name).and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(resources: Value) -> HotTemplate {
        HotTemplate::from_value(json!({ "resources": resources })).unwrap()
    }

    #[test]
    fn test_skeleton_from_nested_properties() {
        let hot = template(json!({
            "VDU1": {
                "type": "VDU1.yaml",
                "properties": {
                    "flavor": {"get_param": ["nfv", "VDU", "VDU1", "computeFlavourId"]},
                    "image": {"get_param": ["nfv", "VDU", "VDU1", "vcImageId"]},
                    "net": [
                        {"port": {"get_param": ["nfv", "CP", "CP1", "network"]}},
                        {"fixed_ips": [
                            {"ip_address": {"get_param": ["nfv", "CP", "CP1", "fixed_ips", 0, "ip_address"]}},
                            {"subnet": {"get_param": ["nfv", "CP", "CP1", "fixed_ips", 1, "subnet"]}}
                        ]}
                    ],
                    "ignored_short": {"get_param": ["nfv", "VDU", "VDU1"]},
                    "ignored_other": {"get_param": ["other", "VDU", "VDU1", "x"]},
                    "ignored_scalar": {"get_param": "name"},
                    "name": "vdu1"
                }
            },
            "VL": {"type": "OS::Neutron::Net"}
        }));

        assert_eq!(
            init_nfv_dict(&hot),
            json!({
                "VDU": {"VDU1": {"computeFlavourId": null, "vcImageId": null}},
                "CP": {"CP1": {
                    "network": null,
                    "fixed_ips": {"0": {"ip_address": null}, "1": {"subnet": null}}
                }}
            })
        );
    }

    #[test]
    fn test_duplicate_placeholders_collapse() {
        let hot = template(json!({
            "A": {"properties": {"x": {"get_param": ["nfv", "VDU", "VDU1", "desired_capacity"]}}},
            "B": {"properties": {"y": {"get_param": ["nfv", "VDU", "VDU1", "desired_capacity"]}}}
        }));
        assert_eq!(
            init_nfv_dict(&hot),
            json!({"VDU": {"VDU1": {"desired_capacity": null}}})
        );
    }

    #[test]
    fn test_get_param_value_not_descended() {
        let hot = template(json!({
            "A": {"properties": {"x": {"get_param": [
                "nfv", "VDU", "VDU1", {"get_param": ["nfv", "VDU", "VDU2", "vcImageId"]}
            ]}}}
        }));
        assert_eq!(collect_placeholders(&hot).len(), 1);
        assert_eq!(init_nfv_dict(&hot), json!({}));
    }

    #[test]
    fn test_prefix_placeholder_does_not_collapse_branch() {
        let hot = template(json!({
            "A": {"properties": {
                "a": {"get_param": ["nfv", "CP", "CP1", "fixed_ips", 0, "subnet"]},
                "b": {"get_param": ["nfv", "CP", "CP1", "fixed_ips"]}
            }}
        }));
        assert_eq!(
            init_nfv_dict(&hot),
            json!({"CP": {"CP1": {"fixed_ips": {"0": {"subnet": null}}}}})
        );
    }

    #[test]
    fn test_resources_without_properties() {
        let hot = template(json!({"A": {"type": "OS::Heat::None"}, "B": null}));
        assert_eq!(init_nfv_dict(&hot), json!({}));
    }
}
