use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use async_trait::async_trait;

static INFO: MetricInfo = MetricInfo {
    metric_path: "i1-metadata-knowledge-representation",
    applies_to_principle: "I1",
    title: "Metadata uses a formal knowledge representation language (strong)",
    description: "Maturity Indicator to test if the metadata uses a formal language broadly applicable for knowledge representation.\n\
This particular test takes a broad view of what defines a 'knowledge representation language'; in this evaluation, \
a knowledge representation language is interpreted as one in which terms are semantically-grounded in ontologies.\n\
Any form of RDF will pass this test",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["metadata", "interoperability"],
};

pub struct KnowledgeRepresentation;

#[async_trait]
impl MetricTest for KnowledgeRepresentation {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        let graph = ctx
            .harvester
            .retrieve_metadata(eval, &subject, RetrieveOptions::default())
            .await
            .into_graph();

        if graph.is_empty() {
            eval.failure(format!("Could not find RDF metadata at {subject}"));
        } else {
            eval.success(format!(
                "Successfully parsed the RDF metadata retrieved with content negotiation. It contains {} triples",
                graph.len()
            ));
        }
    }
}
