//! Dublin Core `<meta name="DC.x">` / `<meta name="DCTERMS.x">` tags

use super::dom::Element;
use serde_json::{json, Map, Value};

const DC_ELEMENTS_NS: &str = "http://purl.org/dc/elements/1.1/";
const DC_TERMS_NS: &str = "http://purl.org/dc/terms/";

/// The fifteen legacy elements of the `dc:` namespace
const DC_ELEMENTS: &[&str] = &[
    "contributor",
    "coverage",
    "creator",
    "date",
    "description",
    "format",
    "identifier",
    "language",
    "publisher",
    "relation",
    "rights",
    "source",
    "subject",
    "title",
    "type",
];

/// `{"namespaces": {...}, "elements": [...], "terms": [...]}`, or `None`
/// when the page has no Dublin Core at all
pub fn extract(document: &Element) -> Option<Value> {
    let mut namespaces = Map::new();
    let mut elements = Vec::new();
    let mut terms = Vec::new();

    for element in document.descendants() {
        match element.name.as_str() {
            "link" => {
                let (Some(rel), Some(href)) = (element.attr("rel"), element.attr("href")) else {
                    continue;
                };
                if let Some(prefix) = rel.trim().strip_prefix("schema.") {
                    namespaces.insert(prefix.to_string(), Value::String(href.trim().to_string()));
                }
            }
            "meta" => {
                let (Some(name), Some(content)) = (element.attr("name"), element.attr("content")) else {
                    continue;
                };
                let Some((prefix, local)) = name.trim().split_once('.') else {
                    continue;
                };
                let local = local.trim();
                if local.is_empty() {
                    continue;
                }

                let prefix = prefix.to_ascii_lowercase();
                let local_lower = local.to_ascii_lowercase();
                let (list, uri) = match prefix.as_str() {
                    "dc" if DC_ELEMENTS.contains(&local_lower.as_str()) => {
                        (&mut elements, format!("{DC_ELEMENTS_NS}{local_lower}"))
                    }
                    "dc" | "dcterms" => (&mut terms, format!("{DC_TERMS_NS}{local}")),
                    _ => continue,
                };

                let mut entry = Map::new();
                entry.insert("name".to_string(), Value::String(local.to_string()));
                entry.insert("content".to_string(), Value::String(content.to_string()));
                entry.insert("URI".to_string(), Value::String(uri));
                if let Some(lang) = element.attr("lang").or_else(|| element.attr("xml:lang")) {
                    entry.insert("lang".to_string(), Value::String(lang.to_string()));
                }
                if let Some(scheme) = element.attr("scheme") {
                    entry.insert("scheme".to_string(), Value::String(scheme.to_string()));
                }
                list.push(Value::Object(entry));
            }
            _ => {}
        }
    }

    if namespaces.is_empty() && elements.is_empty() && terms.is_empty() {
        return None;
    }
    Some(json!({
        "namespaces": namespaces,
        "elements": elements,
        "terms": terms,
    }))
}

/// One expanded JSON-LD node describing `subject_url`, `None` when the
/// bucket carries no element or term
pub fn to_json_ld(dublin_core: &Value, subject_url: &str) -> Option<Value> {
    let mut node = Map::new();
    node.insert("@id".to_string(), Value::String(subject_url.to_string()));

    for key in ["elements", "terms"] {
        let Some(entries) = dublin_core.get(key).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let (Some(uri), Some(content)) = (
                entry.get("URI").and_then(Value::as_str),
                entry.get("content").and_then(Value::as_str),
            ) else {
                continue;
            };
            let mut literal = Map::new();
            literal.insert("@value".to_string(), Value::String(content.to_string()));
            if let Some(lang) = entry.get("lang").and_then(Value::as_str) {
                literal.insert("@language".to_string(), Value::String(lang.to_string()));
            }
            match node.get_mut(uri) {
                Some(Value::Array(values)) => values.push(Value::Object(literal)),
                _ => {
                    node.insert(uri.to_string(), json!([literal]));
                }
            }
        }
    }

    (node.len() > 1).then_some(Value::Object(node))
}
