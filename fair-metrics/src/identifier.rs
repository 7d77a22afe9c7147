//! Subject identifier classification and normalization
//!
//! Purely syntactic: turns a raw subject (URL, DOI, handle) into a
//! resolvable URL without touching the network.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;

static DOI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(doi:\s*|(?:https?://)?(?:dx\.)?doi\.org/)?(10\.\d+(\.\d+)*/.+)$")
        .expect("DOI pattern compiles")
});

static HANDLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(hdl:\s*|(?:https?://)?hdl\.handle\.net/)?([^/.\s]+(\.[^/.\s]+)*/\S*)$")
        .expect("handle pattern compiles")
});

const DOI_RESOLVER: &str = "https://doi.org/";
const HANDLE_RESOLVER: &str = "https://hdl.handle.net/";

/// Kind of identifier the subject was recognized as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Url,
    Doi,
    Handle,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IdentifierKind::Url => "URL",
            IdentifierKind::Doi => "DOI",
            IdentifierKind::Handle => "handle",
        };
        f.write_str(name)
    }
}

/// A classified identifier and the URL it resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub url: String,
}

/// Classify `id` and convert it to a canonical URL
///
/// Checked in order: absolute URL (returned unchanged), DOI, handle.
/// Returns `None` for anything else.
pub fn resolve(id: &str) -> Option<Identifier> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }

    if is_url(id) {
        return Some(Identifier {
            kind: IdentifierKind::Url,
            url: id.to_string(),
        });
    }

    if let Some(caps) = DOI_PATTERN.captures(id) {
        return Some(Identifier {
            kind: IdentifierKind::Doi,
            url: format!("{DOI_RESOLVER}{}", &caps[2]),
        });
    }

    if let Some(caps) = HANDLE_PATTERN.captures(id) {
        return Some(Identifier {
            kind: IdentifierKind::Handle,
            url: format!("{HANDLE_RESOLVER}{}", &caps[2]),
        });
    }

    None
}

/// Absolute http/https/ftp URL with a host
pub fn is_url(id: &str) -> bool {
    match Url::parse(id) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https" | "ftp")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// The http ↔ https counterpart of `uri`, if it uses one of those schemes
pub fn scheme_counterpart(uri: &str) -> Option<String> {
    if let Some(rest) = uri.strip_prefix("http://") {
        Some(format!("https://{rest}"))
    } else {
        uri.strip_prefix("https://")
            .map(|rest| format!("http://{rest}"))
    }
}

/// DOI carried by a `doi.org` URL (path without the leading slash)
pub fn doi_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.host_str()? != "doi.org" {
        return None;
    }
    let doi = parsed.path().trim_start_matches('/');
    (!doi.is_empty()).then(|| doi.to_string())
}

/// Seed alias set for a subject URL
///
/// Canonical form first, then the scheme counterpart, then for `doi.org`
/// subjects the legacy `http://dx.doi.org/` form and the lowercased URL.
/// Never contains duplicates.
pub fn initial_aliases(url: &str) -> Vec<String> {
    let mut aliases = Vec::new();
    push_unique(&mut aliases, url.to_string());
    if let Some(counterpart) = scheme_counterpart(url) {
        push_unique(&mut aliases, counterpart);
    }

    for prefix in ["https://doi.org/", "http://doi.org/"] {
        if let Some(doi) = url.strip_prefix(prefix) {
            push_unique(&mut aliases, format!("http://dx.doi.org/{doi}"));
            push_unique(&mut aliases, url.to_lowercase());
        }
    }

    aliases
}

/// Append `value` unless already present
pub fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
