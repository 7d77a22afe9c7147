use super::a1_metadata_protocol::{parsed_subject, record_uri_parts};
use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use async_trait::async_trait;

/// Hosts whose URLs are considered persistent identifiers
pub const PERSISTENT_HOSTS: &[&str] = &["doi.org", "purl.org", "identifiers.org", "w3id.org"];

static INFO: MetricInfo = MetricInfo {
    metric_path: "f1-unique-persistent-id",
    applies_to_principle: "F1",
    title: "Resource identifier is unique and persistent",
    description: "Check if the identifier of the resource is unique (HTTP) and persistent (some HTTP domains)",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["identifier"],
};

pub struct UniquePersistentId;

#[async_trait]
impl MetricTest for UniquePersistentId {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, _ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        eval.info(format!("Checking if the given resource URI {subject} is a valid URL"));

        let host = match parsed_subject(eval) {
            Some(url) => {
                record_uri_parts(eval, &url);
                eval.success(format!("Validated the given resource URI {subject} is a URL"));
                url.host_str().map(str::to_string)
            }
            None => {
                eval.failure(format!("Could not validate the given resource URI {subject} is a URL"));
                None
            }
        };

        eval.info(format!(
            "Check if the given resource URI {subject} use a persistent URI, one of: {}",
            PERSISTENT_HOSTS.join(", ")
        ));
        match host {
            Some(host) if PERSISTENT_HOSTS.contains(&host.as_str()) => {
                eval.success(format!("Validated the given resource URI {subject} is a persistent URL"));
            }
            _ => eval.failure(format!(
                "The given resource URI {subject} is not considered a persistent URL"
            )),
        }
    }
}
