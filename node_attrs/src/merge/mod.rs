//! Precedence-ordered deep merge of layer values.
//!
//! Two or more maps at the same path merge key by key. As soon as any
//! defining layer holds something other than a map, the highest defining
//! value wins outright: sequences are never concatenated and a scalar or
//! sequence never mixes with maps at other levels.

mod cache;

pub use cache::{MergeCache, MergeCacheStats};

use indexmap::IndexMap;

use crate::key::KeyPath;
use crate::layer::Layer;
use crate::value::{AttrMap, Value};

/// Merge the values one path holds in several layers.
///
/// `values` is ordered from lowest to highest precedence; `None` marks a
/// layer with nothing at the path. Returns `None` when no layer defines a
/// value.
///
/// When a single map is all that contributes, the result shares its storage.
///
/// ```
/// use node_attrs::{Value, merge};
/// use serde_json::json;
///
/// let low = Value::from(json!({"a": 1, "list": [1, 2]}));
/// let high = Value::from(json!({"b": 2, "list": [3]}));
/// let merged = merge::merge_values([Some(&low), None, Some(&high)]);
/// assert_eq!(merged, Some(Value::from(json!({"a": 1, "list": [3], "b": 2}))));
/// ```
pub fn merge_values<'a, I>(values: I) -> Option<Value>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let defined: Vec<&Value> = values.into_iter().flatten().collect();
    let top = *defined.last()?;
    let maps: Vec<&AttrMap> = defined.iter().filter_map(|value| value.as_map()).collect();
    if maps.len() < 2 || maps.len() != defined.len() {
        return Some(top.clone());
    }
    Some(merge_maps(&maps))
}

/// Deep-merge maps given lowest precedence first.
fn merge_maps(maps: &[&AttrMap]) -> Value {
    let mut per_key: IndexMap<&str, Vec<Option<&Value>>> = IndexMap::new();
    for map in maps {
        for (key, value) in map.iter() {
            per_key.entry(key.as_str()).or_default().push(Some(value));
        }
    }
    per_key
        .into_iter()
        .filter_map(|(key, values)| merge_values(values).map(|merged| (key.to_owned(), merged)))
        .collect()
}

/// The merged value of `layers` at `path`.
///
/// Equal to merging the layer roots and then following `path` into the
/// result. The path is walked one segment at a time: while every defining
/// layer holds a map the layers step down together; once the merge at a
/// prefix would be decided outright, the rest of the path is followed in the
/// winning value only, so nothing below a higher scalar or sequence shows
/// through.
pub fn merge_layers<'a, I>(layers: I, path: &KeyPath) -> Option<Value>
where
    I: IntoIterator<Item = &'a Layer>,
{
    let mut defined: Vec<&Value> = layers.into_iter().map(Layer::root).collect();
    for (depth, segment) in path.iter().enumerate() {
        let top = *defined.last()?;
        if defined.len() < 2 || !defined.iter().all(|value| value.is_map()) {
            let rest = KeyPath::new(path.iter().skip(depth));
            return top.pointer(&rest).cloned();
        }
        defined = defined
            .into_iter()
            .filter_map(|value| value.get(segment))
            .collect();
    }
    merge_values(defined.into_iter().map(Some))
}
