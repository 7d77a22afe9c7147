//! Structured data embedded in HTML landing pages
//!
//! Four buckets are extracted from one parse of the page: JSON-LD scripts,
//! RDFa, Microdata and Dublin Core meta tags.

pub mod dom;
pub mod dublincore;
pub mod jsonld;
pub mod microdata;
pub mod rdfa;

use serde::Serialize;
use serde_json::Value;

/// Everything found in one HTML document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddedMetadata {
    #[serde(rename = "json-ld")]
    pub json_ld: Vec<Value>,
    pub rdfa: Vec<Value>,
    pub microdata: Vec<Value>,
    #[serde(rename = "dublincore")]
    pub dublin_core: Option<Value>,
}

impl EmbeddedMetadata {
    pub fn is_empty(&self) -> bool {
        self.json_ld.is_empty()
            && self.rdfa.is_empty()
            && self.microdata.is_empty()
            && self.dublin_core.is_none()
    }

    /// Names of the non-empty buckets, in priority order
    pub fn formats(&self) -> Vec<&'static str> {
        let mut formats = Vec::new();
        if !self.json_ld.is_empty() {
            formats.push("json-ld");
        }
        if !self.rdfa.is_empty() {
            formats.push("rdfa");
        }
        if !self.microdata.is_empty() {
            formats.push("microdata");
        }
        if self.dublin_core.is_some() {
            formats.push("dublincore");
        }
        formats
    }
}

/// Parse `html` once and run every extractor, relative links resolve
/// against `base_url`
pub fn extract_embedded(html: &[u8], base_url: &str) -> EmbeddedMetadata {
    let document = dom::parse_html(html);
    EmbeddedMetadata {
        json_ld: jsonld::extract(&document),
        rdfa: rdfa::extract(&document, base_url),
        microdata: microdata::extract(&document, base_url),
        dublin_core: dublincore::extract(&document),
    }
}

/// Microdata items as expanded JSON-LD
pub fn microdata_to_json_ld(items: &[Value]) -> Value {
    Value::Array(microdata::to_json_ld(items))
}

/// Dublin Core bucket as expanded JSON-LD about `subject_url`
pub fn dublin_core_to_json_ld(dublin_core: &Value, subject_url: &str) -> Value {
    Value::Array(dublincore::to_json_ld(dublin_core, subject_url).into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bucket_keys() {
        let embedded = extract_embedded(
            br#"<html><head>
              <script type="application/ld+json">{"@context": "https://schema.org/", "@type": "Dataset"}</script>
            </head><body></body></html>"#,
            "https://example.org/",
        );
        assert_eq!(embedded.formats(), vec!["json-ld"]);

        let value = serde_json::to_value(&embedded).unwrap();
        assert_eq!(value["json-ld"][0]["@type"], "Dataset");
        assert_eq!(value["rdfa"], json!([]));
        assert_eq!(value["microdata"], json!([]));
        assert!(value["dublincore"].is_null());
    }

    #[test]
    fn test_plain_page_is_empty() {
        let embedded = extract_embedded(b"<html><body><h1>Hello</h1></body></html>", "https://example.org/");
        assert!(embedded.is_empty());
    }
}
