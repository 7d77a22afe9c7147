//! HTTP `Link` header parsing (FAIR Signposting)
//!
//! `<https://example.org/meta.ttl>; rel="describedby"; type="text/turtle"`

use reqwest::Url;
use serde_json::{json, Map, Value};

/// Relations followed to find machine-readable metadata, in order
pub const FOLLOWED_RELATIONS: &[&str] = &["alternate", "describedby", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignpostingLink {
    pub url: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

/// Parsed links keyed by relation, first occurrence of each relation wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignpostingLinks {
    links: Vec<(String, SignpostingLink)>,
}

impl SignpostingLinks {
    /// Parse every `Link` header value of a response
    pub fn parse<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut parsed = Self::default();
        for header in headers {
            for raw in split_links(header) {
                let Some(link) = parse_link(raw) else {
                    continue;
                };
                let keys: Vec<String> = match &link.rel {
                    Some(rel) => rel.split_whitespace().map(str::to_ascii_lowercase).collect(),
                    None => vec![link.url.clone()],
                };
                for key in keys {
                    if parsed.get(&key).is_none() {
                        parsed.links.push((key, link.clone()));
                    }
                }
            }
        }
        parsed
    }

    pub fn get(&self, rel: &str) -> Option<&SignpostingLink> {
        self.links.iter().find(|(key, _)| key == rel).map(|(_, link)| link)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Object keyed by relation, as stored in `signposting_links`
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .links
            .iter()
            .map(|(key, link)| {
                let mut entry = json!({"url": link.url});
                if let Some(rel) = &link.rel {
                    entry["rel"] = Value::String(rel.clone());
                }
                if let Some(media_type) = &link.media_type {
                    entry["type"] = Value::String(media_type.clone());
                }
                (key.clone(), entry)
            })
            .collect();
        Value::Object(map)
    }
}

/// Target of `link` resolved against the URL the response came from
pub fn resolve_target(link: &SignpostingLink, response_url: &str) -> Option<String> {
    if let Ok(absolute) = Url::parse(&link.url) {
        return Some(absolute.to_string());
    }
    Url::parse(response_url)
        .and_then(|base| base.join(&link.url))
        .map(|url| url.to_string())
        .ok()
}

/// Split a header value on commas outside `<...>` and quoted strings
fn split_links(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_target = false;
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                parts.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(header[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn parse_link(raw: &str) -> Option<SignpostingLink> {
    let raw = raw.trim();
    let rest = raw.strip_prefix('<')?;
    let end = rest.find('>')?;
    let url = rest[..end].trim().to_string();
    let mut link = SignpostingLink {
        url,
        rel: None,
        media_type: None,
    };

    for param in rest[end + 1..].split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "rel" if link.rel.is_none() => link.rel = Some(value),
            "type" if link.media_type.is_none() => link.media_type = Some(value),
            _ => {}
        }
    }
    Some(link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_links_and_headers() {
        let links = SignpostingLinks::parse([
            r#"<https://doi.org/10.5281/zenodo.1>; rel="cite-as", </meta.jsonld>; rel="describedby"; type="application/ld+json""#,
            r#"<https://example.org/other.ttl>; rel="describedby"; type="text/turtle""#,
        ]);

        assert_eq!(links.len(), 2);
        let described = links.get("describedby").unwrap();
        assert_eq!(described.url, "/meta.jsonld");
        assert_eq!(described.media_type.as_deref(), Some("application/ld+json"));
        assert_eq!(links.get("cite-as").unwrap().url, "https://doi.org/10.5281/zenodo.1");
    }

    #[test]
    fn test_comma_inside_target_and_multiple_rels() {
        let links = SignpostingLinks::parse([r#"<https://example.org/a,b>; rel="alternate meta""#]);
        assert_eq!(links.get("alternate").unwrap().url, "https://example.org/a,b");
        assert_eq!(links.get("meta").unwrap().url, "https://example.org/a,b");
    }

    #[test]
    fn test_resolve_relative_target() {
        let links = SignpostingLinks::parse([r#"<meta.ttl>; rel="describedby""#]);
        let link = links.get("describedby").unwrap();
        assert_eq!(
            resolve_target(link, "https://example.org/records/1/").as_deref(),
            Some("https://example.org/records/1/meta.ttl")
        );
    }

    #[test]
    fn test_to_json() {
        let links = SignpostingLinks::parse([r#"<https://example.org/m>; rel="describedby"; type="text/turtle""#]);
        assert_eq!(
            links.to_json(),
            json!({"describedby": {"url": "https://example.org/m", "rel": "describedby", "type": "text/turtle"}})
        );
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert!(SignpostingLinks::parse(["not a link header", ""]).is_empty());
    }
}
