//! Plain structured documents (JSON or YAML) for the weak I1 tests

use reqwest::header::ACCEPT;
use serde_json::Value;
use std::fmt;

const STRUCTURED_ACCEPT: &str =
    "application/json, application/yaml;q=0.9, application/x-yaml;q=0.9, text/yaml;q=0.8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    Json,
    Yaml,
}

impl fmt::Display for StructuredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredFormat::Json => write!(f, "JSON"),
            StructuredFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// GET `url` asking for JSON or YAML and parse the body
pub async fn fetch_structured(
    client: &reqwest::Client,
    url: &str,
) -> Result<(StructuredFormat, Value), String> {
    let response = client
        .get(url)
        .header(ACCEPT, STRUCTURED_ACCEPT)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let text = response.text().await.map_err(|e| e.to_string())?;
    parse_structured(&text).ok_or_else(|| "no JSON or YAML document in the response".to_string())
}

/// A JSON or YAML object or list; bare scalars do not count
pub fn parse_structured(text: &str) -> Option<(StructuredFormat, Value)> {
    if let Ok(json) = serde_json::from_str::<Value>(text) {
        return matches!(json, Value::Object(_) | Value::Array(_))
            .then_some((StructuredFormat::Json, json));
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(text).ok()?;
    if !(yaml.is_mapping() || yaml.is_sequence()) {
        return None;
    }
    let value = serde_json::to_value(yaml).ok()?;
    Some((StructuredFormat::Yaml, value))
}
