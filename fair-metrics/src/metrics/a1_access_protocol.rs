use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use crate::vocab;
use async_trait::async_trait;
use reqwest::Url;

static INFO: MetricInfo = MetricInfo {
    metric_path: "a1-access-protocol",
    applies_to_principle: "A1",
    title: "Check Access Protocol",
    description: "The access protocol and authorization (if content restricted).\n\
For the protocol, do an HTTP get on the URL to see if it returns a valid document.\n\
Find information about authorization in metadata",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["access"],
};

pub struct AccessProtocol;

#[async_trait]
impl MetricTest for AccessProtocol {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>) {
        let Some(url) = eval.subject_url().map(str::to_string) else {
            let subject = eval.subject().to_string();
            eval.failure(format!("Could not resolve {subject}, it is not a URL, DOI or handle"));
            return;
        };

        eval.info(format!(
            "Access protocol: check resource URI protocol is resolvable for {url}"
        ));
        match ctx.client.get(&url).send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => {
                eval.success(format!("Successfully resolved {url}"));
                let requested = Url::parse(&url).ok();
                if requested.as_ref() != Some(response.url()) {
                    eval.info(format!("Request was redirected to {}.", response.url()));
                }
            }
            Err(e) => eval.failure(format!("Could not resolve {url}. Getting: {e}")),
        }

        let graph = ctx
            .harvester
            .retrieve_metadata(eval, &url, RetrieveOptions::default())
            .await
            .into_graph();

        eval.info("Authorization: checking for dcterms:accessRights in metadata");
        let rights = eval.extract_property(&graph, vocab::ACCESS_RIGHTS_PREDICATES, None);
        match rights.first() {
            Some(value) => eval.bonus(format!("Found dcterms:accessRights in metadata: {value}")),
            None => {
                eval.warn("Could not find dcterms:accessRights information in metadata");
                eval.warn(format!(
                    "Make sure your metadata contains informations about access rights using one of those predicates: {}",
                    vocab::ACCESS_RIGHTS_PREDICATES.join(", ")
                ));
            }
        }
    }
}
