//! Remote JSON-LD context documents
//!
//! The JSON-LD processor resolves contexts through a synchronous callback,
//! so every remote context referenced by a document is fetched beforehand
//! and served from memory. Fetched documents go into a cache bounded by
//! total bytes and entry age; documents over the per-document limit are
//! refused and never cached.

use moka::future::Cache;
use oxjsonld::{JsonLdLoadDocumentOptions, JsonLdRemoteDocument};
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Contexts referencing other contexts are followed this many levels deep
const MAX_CONTEXT_DEPTH: usize = 3;

/// Total size of the cached context documents
const MAX_CACHED_BYTES: u64 = 8 * 1024 * 1024;

/// Largest single context document accepted
const MAX_CONTEXT_BYTES: usize = 1024 * 1024;

const CONTEXT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CONTEXT_ACCEPT: &str = "application/ld+json, application/json;q=0.9";

/// Context documents available to a single parse, keyed by URL
#[derive(Debug, Clone, Default)]
pub struct ContextDocuments {
    documents: HashMap<String, Arc<Vec<u8>>>,
}

impl ContextDocuments {
    pub fn contains(&self, url: &str) -> bool {
        self.documents.contains_key(url)
    }

    /// Load callback handed to the JSON-LD processor
    pub fn into_loader(
        self,
    ) -> impl Fn(
        &str,
        &JsonLdLoadDocumentOptions,
    ) -> Result<JsonLdRemoteDocument, Box<dyn Error + Send + Sync>>
           + Send
           + Sync
           + std::panic::UnwindSafe
           + std::panic::RefUnwindSafe
           + 'static {
        let documents = Arc::new(self.documents);
        move |url, _options| match documents.get(url) {
            Some(document) => Ok(JsonLdRemoteDocument {
                document: document.as_ref().clone(),
                document_url: url.to_string(),
            }),
            None => Err(format!("JSON-LD context {url} could not be retrieved").into()),
        }
    }
}

/// Process-wide context cache with an HTTP fallback
pub struct JsonLdContextLoader {
    client: reqwest::Client,
    cache: Cache<String, Arc<Vec<u8>>>,
    max_document_bytes: usize,
}

impl JsonLdContextLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_limits(client, MAX_CACHED_BYTES, MAX_CONTEXT_BYTES)
    }

    pub fn with_limits(client: reqwest::Client, max_cached_bytes: u64, max_document_bytes: usize) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_cached_bytes)
            .weigher(|_url: &String, document: &Arc<Vec<u8>>| {
                u32::try_from(document.len()).unwrap_or(u32::MAX)
            })
            .time_to_live(CONTEXT_TTL)
            .build();
        Self {
            client,
            cache,
            max_document_bytes,
        }
    }

    /// Seed the cache with a known document, refused when over the size limit
    #[cfg(test)]
    pub(crate) async fn insert(&self, url: impl Into<String>, document: Vec<u8>) -> bool {
        if document.len() > self.max_document_bytes {
            return false;
        }
        self.cache.insert(url.into(), Arc::new(document)).await;
        true
    }

    #[cfg(test)]
    pub(crate) fn cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    /// Bytes held by the cache once pending evictions have run
    #[cfg(test)]
    pub(crate) async fn cached_bytes(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.weighted_size()
    }

    /// Collect every remote context `doc` needs
    ///
    /// Returns the documents found plus one message per context that could
    /// not be fetched. Missing contexts make the JSON-LD parse fail later,
    /// they are not an error here.
    pub async fn documents_for(&self, doc: &Value) -> (ContextDocuments, Vec<String>) {
        let mut documents = ContextDocuments::default();
        let mut failures = Vec::new();
        let mut pending = context_urls(doc);

        for _ in 0..MAX_CONTEXT_DEPTH {
            if pending.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for url in pending {
                if documents.contains(&url) {
                    continue;
                }
                match self.load(&url).await {
                    Ok(bytes) => {
                        if let Ok(context) = serde_json::from_slice::<Value>(&bytes) {
                            next.extend(context_urls(&context));
                        }
                        documents.documents.insert(url, bytes);
                    }
                    Err(e) => failures.push(format!("{url}: {e}")),
                }
            }
            pending = next;
        }

        (documents, failures)
    }

    async fn load(&self, url: &str) -> Result<Arc<Vec<u8>>, String> {
        if let Some(bytes) = self.cache.get(url).await {
            return Ok(bytes);
        }

        debug!(url = %url, "Fetching JSON-LD context");
        let mut response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, CONTEXT_ACCEPT)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "JSON-LD context not available");
            return Err(format!("HTTP {}", response.status()));
        }

        let too_large = || format!("larger than {} bytes", self.max_document_bytes);
        if response
            .content_length()
            .is_some_and(|len| len > self.max_document_bytes as u64)
        {
            warn!(url = %url, "JSON-LD context over the size limit");
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            if body.len() + chunk.len() > self.max_document_bytes {
                warn!(url = %url, "JSON-LD context over the size limit");
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let bytes = Arc::new(body);
        self.cache.insert(url.to_string(), Arc::clone(&bytes)).await;
        Ok(bytes)
    }
}

/// Remote (http/https) context URLs referenced anywhere in `value`
pub fn context_urls(value: &Value) -> Vec<String> {
    let mut urls = Vec::new();
    collect_context_urls(value, &mut urls);
    urls
}

fn collect_context_urls(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_context_urls(v, urls)),
        Value::Object(map) => {
            for (key, child) in map {
                if key == "@context" {
                    push_context_strings(child, urls);
                }
                collect_context_urls(child, urls);
            }
        }
        _ => {}
    }
}

fn push_context_strings(context: &Value, urls: &mut Vec<String>) {
    match context {
        Value::String(url) if url.starts_with("http://") || url.starts_with("https://") => {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| push_context_strings(v, urls)),
        _ => {}
    }
}
