// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VDU Index Allocation
//!
//! Every VNFC of the indexed variant is named `<descriptor-name>-<index>`.
//! The index is assigned once and persisted on the VNFC record as
//! `metadata.vdu_idx`, so the name is a durable identity across operations.

use serde_json::Value;

/// Parameter placeholder key inside template properties
pub const GET_PARAM: &str = "get_param";

/// Minimum placeholder length: `[nfv, category, name, attribute]`
pub const MIN_PLACEHOLDER_LEN: usize = 4;

/// Slot of the placeholder holding the VDU/CP name
const NAME_SLOT: usize = 2;

pub fn with_index(name: &str, index: u32) -> String {
    format!("{name}-{index}")
}

/// Recover the descriptor name of an indexed name.
///
/// Splits on the rightmost `-`. A name without any separator yields `""`.
pub fn strip_index(name_idx: &str) -> &str {
    name_idx
        .rsplit_once('-')
        .map(|(name, _)| name)
        .unwrap_or("")
}

/// Deep copy of a VDU resource fragment with its placeholders indexed.
///
/// Only placeholders sitting directly under a top-level property are
/// rewritten:
///
/// ```yaml
/// properties:
///   flavor: { get_param: [ nfv, VDU, VDU1, computeFlavourId ] }   # -> VDU1-1
///   net1: { get_param: [ nfv, CP, VDU1_CP1, network ] }           # -> VDU1_CP1-1
///   nested: { a: { get_param: [ nfv, VDU, VDU1, vcImageId ] } }  # untouched
/// ```
///
/// Placeholders nested deeper keep their descriptor name; descriptors that
/// rely on nesting at this level are not supported.
pub fn index_vdu_fragment(fragment: &Value, index: u32) -> Value {
    let mut indexed = fragment.clone();
    if let Some(Value::Object(properties)) = indexed.get_mut("properties") {
        for prop_value in properties.values_mut() {
            let Some(Value::Array(param)) = prop_value.get_mut(GET_PARAM) else {
                continue;
            };
            if param.len() < MIN_PLACEHOLDER_LEN {
                continue;
            }
            if let Some(Value::String(name)) = param.get_mut(NAME_SLOT) {
                *name = with_index(name, index);
            }
        }
    }
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_with_index_round_trip() {
        for name in ["VDU1", "VDU1_CP1", "my-vdu", "a-b-c", ""] {
            for index in [0, 1, 7, 42, u32::MAX] {
                assert_eq!(strip_index(&with_index(name, index)), name);
            }
        }
    }

    #[test]
    fn test_strip_index_without_separator() {
        assert_eq!(strip_index("VDU1"), "");
        assert_eq!(strip_index("VDU1-0"), "VDU1");
    }

    #[test]
    fn test_index_vdu_fragment_top_level_only() {
        let fragment = json!({
            "type": "VDU1.yaml",
            "properties": {
                "flavor": {"get_param": ["nfv", "VDU", "VDU1", "computeFlavourId"]},
                "net1": {"get_param": ["nfv", "CP", "VDU1_CP1", "network"]},
                "short": {"get_param": ["nfv", "VDU"]},
                "name": "fixed",
                "nested": {"a": {"get_param": ["nfv", "VDU", "VDU1", "vcImageId"]}},
            }
        });

        let indexed = index_vdu_fragment(&fragment, 1);
        let props = &indexed["properties"];
        assert_eq!(props["flavor"]["get_param"][2], json!("VDU1-1"));
        assert_eq!(props["net1"]["get_param"][2], json!("VDU1_CP1-1"));
        assert_eq!(props["short"], fragment["properties"]["short"]);
        assert_eq!(props["name"], json!("fixed"));
        assert_eq!(props["nested"], fragment["properties"]["nested"]);

        // input untouched
        assert_eq!(
            fragment["properties"]["flavor"]["get_param"][2],
            json!("VDU1")
        );
    }

    #[test]
    fn test_index_vdu_fragment_without_properties() {
        let fragment = json!({"type": "OS::Nova::Server"});
        assert_eq!(index_vdu_fragment(&fragment, 3), fragment);
    }
}
