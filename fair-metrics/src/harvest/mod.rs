//! Metadata resolution pipeline
//!
//! Strategies are tried in a fixed order and the first graph with triples
//! wins:
//! 1. External harvester service (only when asked for)
//! 2. Direct GET, recording redirects as subject aliases
//! 3. Signposting `Link` headers, followed recursively
//! 4. Structured data embedded in the HTML page
//! 5. Content negotiation
//! 6. External harvester service as a last resort
//!
//! No step is fatal: failures are logged to the evaluation and the next
//! strategy runs. When no graph is found the first raw JSON candidate seen
//! is returned instead.

pub mod signposting;

use crate::evaluation::Evaluation;
use crate::extract;
use crate::identifier;
use crate::rdf::{Graph, JsonLdContextLoader, MetadataParser, RdfInput};
use fair_common::Settings;
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use signposting::{SignpostingLinks, FOLLOWED_RELATIONS};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Accept headers tried in turn during content negotiation
pub const CONTENT_NEGOTIATION_ACCEPTS: &[&str] = &[
    "text/turtle",
    "application/ld+json",
    "text/turtle, application/turtle, application/x-turtle;q=0.9, application/ld+json;q=0.8, application/rdf+xml, text/n3, text/rdf+n3;q=0.7",
];

const HARVESTER_ACCEPT: &str = "application/turtle";

const ELSEVIER_LINKING_HUB: &str = "linkinghub.elsevier.com/retrieve/pii/";
const SCIENCE_DIRECT: &str = "https://www.sciencedirect.com/science/article/pii/";

const MAX_REDIRECTS: usize = 10;

/// HTTP step failures, turned into log lines by the pipeline
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Graph(Graph),
    /// Best-effort JSON found when no RDF could be parsed
    Raw(Value),
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata::Raw(Value::Array(Vec::new()))
    }

    /// Triples for a graph, elements or keys for raw JSON
    pub fn len(&self) -> usize {
        match self {
            Metadata::Graph(graph) => graph.len(),
            Metadata::Raw(Value::Array(items)) => items.len(),
            Metadata::Raw(Value::Object(map)) => map.len(),
            Metadata::Raw(Value::Null) => 0,
            Metadata::Raw(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn graph(&self) -> Option<&Graph> {
        match self {
            Metadata::Graph(graph) => Some(graph),
            Metadata::Raw(_) => None,
        }
    }

    /// The graph, or an empty one for raw JSON
    pub fn into_graph(self) -> Graph {
        match self {
            Metadata::Graph(graph) => graph,
            Metadata::Raw(_) => Graph::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    /// Ask the external harvester before anything else
    pub use_harvester: bool,
    /// Overrides the configured harvester endpoint
    pub harvester_url: Option<String>,
}

impl RetrieveOptions {
    pub fn with_harvester() -> Self {
        Self {
            use_harvester: true,
            harvester_url: None,
        }
    }
}

/// Mutable state of one top-level resolution
struct ResolveContext {
    harvester_url: String,
    use_harvester: bool,
    harvester_tried: bool,
    visited: HashSet<String>,
    depth: usize,
}

/// A successful (2xx) response, read fully
struct FetchedResponse {
    final_url: String,
    content_type: Option<String>,
    link_headers: Vec<String>,
    body: Vec<u8>,
}

pub struct MetadataHarvester {
    client: Client,
    harvester_client: Client,
    parser: MetadataParser,
    harvester_url: String,
}

impl MetadataHarvester {
    /// Build the pooled HTTP clients from the settings
    pub fn new(settings: &Settings) -> Result<Self, HarvestError> {
        let client = build_client(settings.http_timeout())?;
        let harvester_client = build_client(settings.harvester_timeout())?;
        Ok(Self::with_clients(
            client,
            harvester_client,
            settings.harvester_url.clone(),
        ))
    }

    pub fn with_clients(client: Client, harvester_client: Client, harvester_url: String) -> Self {
        let contexts = Arc::new(JsonLdContextLoader::new(client.clone()));
        Self {
            client,
            harvester_client,
            parser: MetadataParser::new(contexts),
            harvester_url,
        }
    }

    /// Shared client for the external lookups of the metric tests
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Resolve `url` (URL, DOI or handle) into metadata
    pub async fn retrieve_metadata(
        &self,
        eval: &mut Evaluation,
        url: &str,
        options: RetrieveOptions,
    ) -> Metadata {
        let Some(identifier) = identifier::resolve(url) else {
            eval.warn(format!(
                "The resource {url} could not be converted to a valid URL, hence no metadata could be retrieved"
            ));
            return Metadata::empty();
        };

        let mut ctx = ResolveContext {
            harvester_url: options
                .harvester_url
                .unwrap_or_else(|| self.harvester_url.clone()),
            use_harvester: options.use_harvester,
            harvester_tried: false,
            visited: HashSet::new(),
            depth: 0,
        };

        info!(url = %identifier.url, kind = %identifier.kind, "Retrieving metadata");
        let metadata = self.resolve(eval, identifier.url, &mut ctx).await;
        debug!(triples = metadata.len(), visited = ctx.visited.len(), "Metadata resolution done");
        metadata
    }

    fn resolve<'a>(
        &'a self,
        eval: &'a mut Evaluation,
        url: String,
        ctx: &'a mut ResolveContext,
    ) -> BoxFuture<'a, Metadata> {
        Box::pin(async move {
            let is_root = ctx.depth == 0;
            if !ctx.visited.insert(url.clone()) {
                eval.info(format!("Already checked {url}, skipping"));
                return Metadata::empty();
            }
            let mut fallback: Option<Value> = None;

            // 1. External harvester
            if ctx.use_harvester && !ctx.harvester_tried {
                ctx.harvester_tried = true;
                if let Some(graph) = self.query_harvester(eval, &url, &ctx.harvester_url).await {
                    return Metadata::Graph(graph);
                }
            }

            // 2. Direct GET
            let page = match self.fetch(&url, None).await {
                Ok(page) => {
                    eval.info(format!("Successfully resolved {url}"));
                    Some(page)
                }
                Err(e) => {
                    eval.warn(format!("Error resolving the URL {url} : {e}"));
                    None
                }
            };

            if let Some(page) = &page {
                self.record_redirect(eval, &url, &page.final_url, is_root);

                // 3. Signposting
                let links = SignpostingLinks::parse(page.link_headers.iter().map(String::as_str));
                if !links.is_empty() {
                    eval.info(format!("Found Signposting links: {}", page.link_headers.join(", ")));
                    if !eval.data().contains_key("signposting_links") {
                        eval.set_data("signposting_links", links.to_json());
                    }

                    for rel in FOLLOWED_RELATIONS {
                        let Some(link) = links.get(rel) else {
                            continue;
                        };
                        let Some(target) = signposting::resolve_target(link, &page.final_url) else {
                            eval.warn(format!("Could not resolve Signposting link {}", link.url));
                            continue;
                        };
                        if ctx.visited.contains(&target) {
                            continue;
                        }
                        eval.info(format!("Following Signposting link rel={rel} to {target}"));
                        ctx.depth += 1;
                        let nested = self.resolve(&mut *eval, target, &mut *ctx).await;
                        ctx.depth -= 1;
                        if matches!(&nested, Metadata::Graph(graph) if !graph.is_empty()) {
                            return nested;
                        }
                    }
                }

                // 4. Embedded structured data
                if looks_like_html(page) {
                    if let Some(graph) = self
                        .parse_embedded(eval, page, is_root, &mut fallback)
                        .await
                    {
                        return Metadata::Graph(graph);
                    }
                }
            }

            // 5. Content negotiation
            for accept in CONTENT_NEGOTIATION_ACCEPTS {
                debug!(url = %url, accept = %accept, "Content negotiation");
                let response = match self.fetch(&url, Some(accept)).await {
                    Ok(response) => response,
                    Err(e) => {
                        eval.info(format!(
                            "Content-negotiation: error with {url} when asking for {accept}. Getting {e}"
                        ));
                        continue;
                    }
                };

                let content_type = normalize_content_type(response.content_type.as_deref());
                eval.info(format!(
                    "Content-negotiation: found some metadata in {content_type} when asking for {accept}"
                ));
                if content_type.starts_with("text/html") {
                    continue;
                }

                let graph = match serde_json::from_slice::<Value>(&response.body) {
                    Ok(json) => {
                        if is_root {
                            eval.set_data("json-ld", json.clone());
                        }
                        if fallback.is_none() {
                            fallback = Some(json.clone());
                        }
                        self.parser
                            .parse_with_base(
                                eval.log_mut(),
                                RdfInput::Json(json),
                                Some("application/ld+json"),
                                "content negotiation JSON-LD RDF",
                                Some(&response.final_url),
                            )
                            .await
                    }
                    Err(_) => {
                        let text = String::from_utf8_lossy(&response.body).into_owned();
                        self.parser
                            .parse_with_base(
                                eval.log_mut(),
                                RdfInput::Text(text),
                                Some(&content_type),
                                "content negotiation RDF",
                                Some(&response.final_url),
                            )
                            .await
                    }
                };
                if !graph.is_empty() {
                    return Metadata::Graph(graph);
                }
            }

            // 6. Harvester service as last resort
            if is_root && !ctx.harvester_tried {
                ctx.harvester_tried = true;
                eval.info(format!(
                    "Nothing found with built-in metadata harvesting process. Using Metadata Harvester service at {} to retrieve RDF metadata from {url}",
                    ctx.harvester_url
                ));
                if let Some(graph) = self.query_harvester(eval, &url, &ctx.harvester_url).await {
                    return Metadata::Graph(graph);
                }
            }

            Metadata::Raw(fallback.unwrap_or_else(|| Value::Array(Vec::new())))
        })
    }

    /// Record the final URL of a redirected request, growing the alias set
    /// only for the subject itself
    fn record_redirect(&self, eval: &mut Evaluation, url: &str, final_url: &str, is_root: bool) {
        let requested = Url::parse(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        if final_url == requested {
            return;
        }

        let redirect_url = rewrite_elsevier(final_url);
        eval.set_data("redirect_url", Value::String(redirect_url.clone()));

        if is_root && eval.subject_url() == Some(url) {
            if eval.add_alternative_uri(&redirect_url) {
                eval.info(format!(
                    "Request was redirected to {redirect_url}, adding to the list of alternative URIs for the subject"
                ));
            }
            if let Some(counterpart) = identifier::scheme_counterpart(&redirect_url) {
                eval.add_alternative_uri(&counterpart);
            }
        }
    }

    async fn parse_embedded(
        &self,
        eval: &mut Evaluation,
        page: &FetchedResponse,
        is_root: bool,
        fallback: &mut Option<Value>,
    ) -> Option<Graph> {
        eval.info(format!(
            "Checking for metadata embedded in the HTML page returned by the resource URI {}",
            page.final_url
        ));
        let embedded = extract::extract_embedded(&page.body, &page.final_url);
        if is_root {
            match serde_json::to_value(&embedded) {
                Ok(value) => eval.set_data("extruct", value),
                Err(e) => warn!(error = %e, "Could not serialize embedded metadata"),
            }
        }
        if embedded.is_empty() {
            eval.info("No structured data found embedded in the HTML");
            return None;
        }
        eval.info(format!(
            "Found embedded metadata in the formats: {}",
            embedded.formats().join(", ")
        ));

        let mut buckets: Vec<(&str, Value, Value)> = Vec::new();
        if !embedded.json_ld.is_empty() {
            let raw = Value::Array(embedded.json_ld.clone());
            buckets.push(("JSON-LD", raw.clone(), raw));
        }
        if !embedded.rdfa.is_empty() {
            let raw = Value::Array(embedded.rdfa.clone());
            buckets.push(("RDFa", raw.clone(), raw));
        }
        if !embedded.microdata.is_empty() {
            buckets.push((
                "Microdata",
                Value::Array(embedded.microdata.clone()),
                extract::microdata_to_json_ld(&embedded.microdata),
            ));
        }
        if let Some(dublin_core) = &embedded.dublin_core {
            buckets.push((
                "Dublin Core",
                json!([dublin_core]),
                extract::dublin_core_to_json_ld(dublin_core, &page.final_url),
            ));
        }

        for (name, raw, json_ld) in buckets {
            let graph = self
                .parser
                .parse_with_base(
                    eval.log_mut(),
                    RdfInput::Json(json_ld),
                    Some("application/ld+json"),
                    &format!("HTML embedded {name}"),
                    Some(&page.final_url),
                )
                .await;
            if !graph.is_empty() {
                eval.info(format!("Found {name} RDF metadata embedded in the HTML"));
                return Some(graph);
            }
            if fallback.is_none() {
                *fallback = Some(raw);
            }
        }
        None
    }

    /// POST the URL to the harvester service, `None` unless triples came back
    async fn query_harvester(
        &self,
        eval: &mut Evaluation,
        url: &str,
        harvester_url: &str,
    ) -> Option<Graph> {
        eval.info(format!(
            "Using Harvester at {harvester_url} to retrieve RDF metadata at {url}"
        ));

        let response = self
            .harvester_client
            .post(harvester_url)
            .header(ACCEPT, HARVESTER_ACCEPT)
            .json(&json!({ "subject": url }))
            .send()
            .await;

        let body = match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    eval.warn(format!("Could not read the Harvester response for {url}: {e}"));
                    return None;
                }
            },
            Ok(response) => {
                eval.warn(format!(
                    "The Harvester service at {harvester_url} answered HTTP {} for {url}",
                    response.status()
                ));
                return None;
            }
            Err(e) => {
                eval.warn(format!(
                    "Could not retrieve metadata from the Harvester service at {harvester_url} for {url}: {e}"
                ));
                return None;
            }
        };

        let graph = self
            .parser
            .parse(
                eval.log_mut(),
                RdfInput::Text(body),
                Some("text/turtle"),
                "FAIR evaluator harvester RDF",
            )
            .await;
        if graph.is_empty() {
            eval.warn(format!(
                "The Harvester service at {harvester_url} could not find metadata for {url}"
            ));
            return None;
        }
        Some(graph)
    }

    async fn fetch(&self, url: &str, accept: Option<&str>) -> Result<FetchedResponse, HarvestError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }

        let final_url = response.url().to_string();
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let link_headers = headers
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(FetchedResponse {
            final_url,
            content_type,
            link_headers,
            body,
        })
    }
}

fn build_client(timeout: std::time::Duration) -> Result<Client, HarvestError> {
    Client::builder()
        .user_agent(env!("FAIR_USER_AGENT"))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| HarvestError::Client(e.to_string()))
}

fn status_error(url: &str, status: StatusCode) -> HarvestError {
    HarvestError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    }
}

/// Elsevier redirects DOIs to a linking hub page instead of the article
pub fn rewrite_elsevier(url: &str) -> String {
    let pii = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .and_then(|rest| rest.strip_prefix(ELSEVIER_LINKING_HUB));
    match pii {
        Some(pii) => format!("{SCIENCE_DIRECT}{pii}"),
        None => url.to_string(),
    }
}

/// Lowercase, no spaces, no utf-8 charset parameter
pub fn normalize_content_type(content_type: Option<&str>) -> String {
    content_type
        .unwrap_or_default()
        .to_ascii_lowercase()
        .replace(' ', "")
        .replace(";charset=utf-8", "")
}

fn looks_like_html(page: &FetchedResponse) -> bool {
    let content_type = normalize_content_type(page.content_type.as_deref());
    if content_type.contains("html") {
        return true;
    }
    if !content_type.is_empty() {
        return false;
    }
    let head = String::from_utf8_lossy(&page.body[..page.body.len().min(512)]).to_ascii_lowercase();
    head.contains("<html") || head.contains("<!doctype html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_elsevier() {
        assert_eq!(
            rewrite_elsevier("https://linkinghub.elsevier.com/retrieve/pii/S1532046408000415"),
            "https://www.sciencedirect.com/science/article/pii/S1532046408000415"
        );
        assert_eq!(rewrite_elsevier("https://example.org/a"), "https://example.org/a");
    }

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(
            normalize_content_type(Some("text/turtle; charset=UTF-8")),
            "text/turtle"
        );
        assert_eq!(normalize_content_type(Some("application/ld+json")), "application/ld+json");
        assert_eq!(normalize_content_type(None), "");
    }

    #[test]
    fn test_metadata_len() {
        assert_eq!(Metadata::empty().len(), 0);
        assert!(Metadata::Graph(Graph::new()).is_empty());
        assert_eq!(Metadata::Raw(json!({"a": 1, "b": 2})).len(), 2);
        assert_eq!(Metadata::Raw(json!([{"a": 1}])).len(), 1);
        assert!(Metadata::Raw(json!([])).into_graph().is_empty());
    }

    #[tokio::test]
    async fn test_unclassifiable_identifier_returns_empty() {
        let settings = Settings::default();
        let harvester = MetadataHarvester::new(&settings).unwrap();
        let mut eval = Evaluation::new("Wrong entry", "f2-test", "0.1.0", &settings);

        let metadata = harvester
            .retrieve_metadata(&mut eval, "Wrong entry", RetrieveOptions::default())
            .await;
        assert_eq!(metadata, Metadata::empty());
        assert!(eval.log().lines().last().unwrap().contains("could not be converted"));
    }
}
