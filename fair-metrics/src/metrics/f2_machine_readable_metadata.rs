use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use async_trait::async_trait;

static INFO: MetricInfo = MetricInfo {
    metric_path: "f2-machine-readable-metadata",
    applies_to_principle: "F2",
    title: "Metadata is machine-readable",
    description: "This assessment will try to extract metadata from the resource URI:\n\
- Search for structured metadata at the resource URI.\n\
- Use HTTP requests with content-negotiation (RDF, JSON-LD, JSON),\n\
- Extract metadata from the HTML landing page (JSON-LD, RDFa, Microdata, Dublin Core)",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["metadata"],
};

pub struct MachineReadableMetadata;

#[async_trait]
impl MetricTest for MachineReadableMetadata {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        eval.info(format!(
            "Checking if machine readable data (e.g. RDF, JSON-LD) can be retrieved using content-negotiation at {subject}"
        ));

        let metadata = ctx
            .harvester
            .retrieve_metadata(eval, &subject, RetrieveOptions::default())
            .await;
        match metadata.graph() {
            Some(graph) if !graph.is_empty() => eval.success(format!(
                "RDF metadata containing {} triples found at the subject URL provided.",
                graph.len()
            )),
            _ => eval.failure("No RDF found at the subject URL provided."),
        }
    }
}
