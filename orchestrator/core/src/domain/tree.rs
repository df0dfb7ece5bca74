// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Template Tree Walking
//!
//! Templates, descriptors and parameter maps are schema-free trees. This
//! module treats them as a closed variant type:
//!
//! | Variant | `serde_json::Value` |
//! |---------|---------------------|
//! | Scalar | `Null`, `Bool`, `Number`, `String` |
//! | Sequence | `Array` |
//! | Mapping | `Object` |
//!
//! Every walk is total over these variants, so rewriting code never needs to
//! know the resource schema it is operating on.

use serde_json::{Map, Value};

/// Decision returned by a visitor for one mapping entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue the walk into the entry's value
    Descend,
    /// Do not look inside the entry's value
    Skip,
}

/// Depth-first walk calling `visit` for every mapping entry in `value`.
///
/// Sequence elements are walked but not visited themselves; only mapping
/// entries carry a key and are offered to the visitor.
pub fn walk_entries<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(&'a str, &'a Value) -> Step,
{
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if visit(key, child) == Step::Descend {
                    walk_entries(child, visit);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_entries(item, visit);
            }
        }
        _ => {}
    }
}

/// Replace every node (mapping value or sequence element) equal to `target`
/// with `replacement`. Returns the number of replacements.
pub fn replace_all(value: &mut Value, target: &Value, replacement: &Value) -> usize {
    let mut count = 0;
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                if child == target {
                    *child = replacement.clone();
                    count += 1;
                } else {
                    count += replace_all(child, target, replacement);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if item == target {
                    *item = replacement.clone();
                    count += 1;
                } else {
                    count += replace_all(item, target, replacement);
                }
            }
        }
        _ => {}
    }
    count
}

/// Nested lookup through mappings, e.g. `get_path(v, &["a", "b"])`.
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}

/// Apply an RFC 7396 JSON merge patch to `target`.
///
/// `null` in the patch deletes the key, mappings merge recursively, anything
/// else replaces the target wholesale.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, patch_value) in patch_map {
            if patch_value.is_null() {
                target_map.remove(key);
            } else {
                let slot = target_map.entry(key.clone()).or_insert(Value::Null);
                merge_patch(slot, patch_value);
            }
        }
    }
}
