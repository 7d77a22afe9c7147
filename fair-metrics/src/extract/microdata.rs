//! HTML Microdata (`itemscope`, `itemtype`, `itemid`, `itemprop`)
//!
//! Items come out as `{"type": [...], "id": ..., "properties": {...}}`.
//! `itemref` is not followed.

use super::dom::Element;
use reqwest::Url;
use serde_json::{json, Map, Value};

/// Top-level items of the document
pub fn extract(document: &Element, base_url: &str) -> Vec<Value> {
    let base = Url::parse(base_url).ok();
    let mut items = Vec::new();
    find_top_level_items(document, base.as_ref(), &mut items);
    items
}

fn find_top_level_items(element: &Element, base: Option<&Url>, items: &mut Vec<Value>) {
    for child in element.child_elements() {
        if child.has_attr("itemscope") && !child.has_attr("itemprop") {
            items.push(item(child, base));
        } else {
            find_top_level_items(child, base, items);
        }
    }
}

fn item(element: &Element, base: Option<&Url>) -> Value {
    let mut out = Map::new();

    let types: Vec<Value> = element
        .attr("itemtype")
        .map(|t| t.split_whitespace().map(|s| Value::String(s.to_string())).collect())
        .unwrap_or_default();
    if !types.is_empty() {
        out.insert("type".to_string(), Value::Array(types));
    }
    if let Some(id) = element.attr("itemid") {
        out.insert("id".to_string(), Value::String(resolve(id.trim(), base)));
    }

    let mut properties = Map::new();
    collect_properties(element, base, &mut properties);
    out.insert("properties".to_string(), Value::Object(properties));

    Value::Object(out)
}

fn collect_properties(element: &Element, base: Option<&Url>, properties: &mut Map<String, Value>) {
    for child in element.child_elements() {
        if let Some(names) = child.attr("itemprop") {
            let value = property_value(child, base);
            for name in names.split_whitespace() {
                add_property(properties, name, value.clone());
            }
        }
        // Nested items own their own properties
        if !child.has_attr("itemscope") {
            collect_properties(child, base, properties);
        }
    }
}

fn add_property(properties: &mut Map<String, Value>, name: &str, value: Value) {
    match properties.get_mut(name) {
        None => {
            properties.insert(name.to_string(), value);
        }
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = json!([first, value]);
        }
    }
}

fn property_value(element: &Element, base: Option<&Url>) -> Value {
    if element.has_attr("itemscope") {
        return item(element, base);
    }

    let url_attr = |name: &str| {
        element
            .attr(name)
            .map(|v| Value::String(resolve(v.trim(), base)))
            .unwrap_or_else(|| Value::String(String::new()))
    };

    match element.name.as_str() {
        "meta" => Value::String(element.attr("content").unwrap_or_default().to_string()),
        "audio" | "embed" | "iframe" | "img" | "source" | "track" | "video" => url_attr("src"),
        "a" | "area" | "link" => url_attr("href"),
        "object" => url_attr("data"),
        "data" | "meter" => Value::String(element.attr("value").unwrap_or_default().to_string()),
        "time" => Value::String(
            element
                .attr("datetime")
                .map(str::to_string)
                .unwrap_or_else(|| element.normalized_text()),
        ),
        _ => Value::String(element.normalized_text()),
    }
}

fn resolve(value: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(value).ok()) {
        Some(url) => url.to_string(),
        None => value.to_string(),
    }
}

/// Expanded JSON-LD node objects for a list of items
///
/// Relative property names are expanded against the vocabulary of the
/// item's first type (everything up to its last `/` or `#`).
pub fn to_json_ld(items: &[Value]) -> Vec<Value> {
    items.iter().filter_map(|i| item_to_node(i, None)).collect()
}

fn item_to_node(item: &Value, inherited_vocab: Option<&str>) -> Option<Value> {
    let item = item.as_object()?;
    let mut node = Map::new();

    let types: Vec<&str> = item
        .get("type")
        .and_then(Value::as_array)
        .map(|t| t.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let vocab = types
        .first()
        .and_then(|t| t.rfind(['/', '#']).map(|i| &t[..=i]))
        .or(inherited_vocab);

    if let Some(id) = item.get("id").and_then(Value::as_str) {
        node.insert("@id".to_string(), Value::String(id.to_string()));
    }
    if !types.is_empty() {
        node.insert("@type".to_string(), json!(types));
    }

    if let Some(properties) = item.get("properties").and_then(Value::as_object) {
        for (name, value) in properties {
            let Some(predicate) = expand_name(name, vocab) else {
                continue;
            };
            let values: Vec<Value> = match value {
                Value::Array(values) => values.iter().filter_map(|v| value_to_json_ld(v, vocab)).collect(),
                other => value_to_json_ld(other, vocab).into_iter().collect(),
            };
            if !values.is_empty() {
                node.insert(predicate, Value::Array(values));
            }
        }
    }

    Some(Value::Object(node))
}

fn value_to_json_ld(value: &Value, vocab: Option<&str>) -> Option<Value> {
    match value {
        Value::Object(_) => item_to_node(value, vocab),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) if crate::identifier::is_url(s) => Some(json!({"@id": s})),
        Value::String(s) => Some(json!({"@value": s})),
        _ => None,
    }
}

fn expand_name(name: &str, vocab: Option<&str>) -> Option<String> {
    if crate::identifier::is_url(name) {
        Some(name.to_string())
    } else {
        vocab.map(|v| format!("{v}{name}"))
    }
}
