//! `<script type="application/ld+json">` blocks

use super::dom::Element;
use serde_json::Value;

const JSON_LD_TYPE: &str = "application/ld+json";

/// Every embedded JSON-LD document that parses, top-level arrays flattened
pub fn extract(document: &Element) -> Vec<Value> {
    let mut items = Vec::new();
    for script in document.descendants() {
        if script.name != "script" {
            continue;
        }
        let is_json_ld = script
            .attr("type")
            .map(|t| t.trim().eq_ignore_ascii_case(JSON_LD_TYPE))
            .unwrap_or(false);
        if !is_json_ld {
            continue;
        }

        let body = script.text();
        match serde_json::from_str::<Value>(strip_wrappers(&body)) {
            Ok(Value::Array(values)) => items.extend(values),
            Ok(value) => items.push(value),
            Err(e) => tracing::debug!(error = %e, "Skipping invalid embedded JSON-LD"),
        }
    }
    items
}

/// Drop HTML comment and CDATA markers some pages wrap scripts in
fn strip_wrappers(body: &str) -> &str {
    let mut body = body.trim();
    for (open, close) in [("<!--", "-->"), ("//<![CDATA[", "//]]>"), ("<![CDATA[", "]]>")] {
        if let Some(inner) = body.strip_prefix(open) {
            body = inner.strip_suffix(close).unwrap_or(inner).trim();
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::dom::parse_html;

    #[test]
    fn test_scripts_collected_and_flattened() {
        let doc = parse_html(
            br#"<html><head>
            <script type="application/ld+json">{"@type": "Dataset", "name": "A"}</script>
            <script type="application/ld+json">[{"name": "B"}, {"name": "C"}]</script>
            <script type="application/ld+json">{ not json</script>
            <script type="text/javascript">var x = {"name": "D"};</script>
            <script type="application/ld+json"><!-- {"name": "E"} --></script>
            </head></html>"#,
        );
        let items = extract(&doc);
        let names: Vec<_> = items.iter().map(|v| v["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["A", "B", "C", "E"]);
    }
}
