use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

static INFO: MetricInfo = MetricInfo {
    metric_path: "a1-metadata-protocol",
    applies_to_principle: "A1.1",
    title: "Metadata uses an open free protocol for metadata retrieval",
    description: "Metadata may be retrieved by an open and free protocol. Tests metadata GUID for its resolution protocol. Accept URLs.",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["metadata"],
};

pub struct MetadataProtocol;

#[async_trait]
impl MetricTest for MetadataProtocol {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, _ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        eval.info(format!(
            "Checking if the given resource URI {subject} is a valid URL"
        ));

        match parsed_subject(eval) {
            Some(url) => {
                record_uri_parts(eval, &url);
                eval.success(format!("Validated the given resource URI {subject} is a URL"));
            }
            None => eval.failure(format!(
                "Could not validate the given resource URI {subject} is a URL"
            )),
        }
    }
}

/// Normalized subject URL, only when it has a scheme and a host
pub(crate) fn parsed_subject(eval: &Evaluation) -> Option<Url> {
    let url = Url::parse(eval.subject_url()?).ok()?;
    url.host_str().filter(|h| !h.is_empty())?;
    Some(url)
}

/// Store `uri_protocol`, `uri_location` and, for doi.org, `uri_doi`
pub(crate) fn record_uri_parts(eval: &mut Evaluation, url: &Url) {
    let host = url.host_str().unwrap_or_default().to_string();
    eval.set_data("uri_protocol", Value::String(url.scheme().to_string()));
    eval.set_data("uri_location", Value::String(host.clone()));
    if host == "doi.org" {
        let doi = url.path().trim_start_matches('/').to_string();
        eval.set_data("uri_doi", Value::String(doi));
    }
}
