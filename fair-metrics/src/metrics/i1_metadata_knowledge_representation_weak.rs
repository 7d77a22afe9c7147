use super::structured::fetch_structured;
use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::{Metadata, RetrieveOptions};
use async_trait::async_trait;

static INFO: MetricInfo = MetricInfo {
    metric_path: "i1-metadata-knowledge-representation-weak",
    applies_to_principle: "I1",
    title: "Metadata uses a formal knowledge representation language (weak)",
    description: "Maturity Indicator to test if the metadata uses a formal language broadly applicable for knowledge representation.\n\
This particular test takes a broad view of what defines a 'knowledge representation language'; in this evaluation, \
anything that can be represented as structured data will be accepted",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["metadata", "interoperability"],
};

pub struct MetadataKnowledgeRepresentationWeak;

#[async_trait]
impl MetricTest for MetadataKnowledgeRepresentationWeak {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        let metadata = ctx
            .harvester
            .retrieve_metadata(eval, &subject, RetrieveOptions::default())
            .await;

        match &metadata {
            Metadata::Graph(graph) if !graph.is_empty() => {
                eval.success(format!(
                    "Successfully parsed the RDF metadata retrieved with content negotiation. It contains {} triples",
                    graph.len()
                ));
                return;
            }
            Metadata::Raw(raw) if !metadata.is_empty() => {
                eval.success(format!("Successfully found and parsed JSON metadata: {raw}"));
                return;
            }
            _ => {}
        }

        // Nothing from the pipeline, try a plain JSON or YAML document
        let Some(url) = eval.subject_url().map(str::to_string) else {
            eval.failure(format!("No structured metadata found for {subject}"));
            return;
        };
        eval.warn("No RDF metadata found, searching for JSON or YAML");
        match fetch_structured(ctx.client, &url).await {
            Ok((format, document)) => {
                eval.success(format!("Successfully found and parsed {format} metadata: {document}"))
            }
            Err(e) => eval.failure(format!("No JSON or YAML metadata found at {url}: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests_support::offline_context;

    #[tokio::test]
    async fn test_unclassifiable_subject_scores_zero() {
        let (harvester, client, settings) = offline_context();
        let ctx = EvaluationContext {
            harvester: &harvester,
            client: &client,
            settings: &settings,
        };
        let eval =
            crate::metrics::run_metric(&MetadataKnowledgeRepresentationWeak, "Wrong entry", &ctx).await;
        assert_eq!(eval.score(), 0);
        assert!(eval.log().joined().contains("No structured metadata found for Wrong entry"));
    }
}
