use super::i1_data_knowledge_representation::data_uris_in_metadata;
use super::structured::fetch_structured;
use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use async_trait::async_trait;

static INFO: MetricInfo = MetricInfo {
    metric_path: "i1-data-knowledge-representation-weak",
    applies_to_principle: "I1",
    title: "Data uses a formal knowledge representation language (weak)",
    description: "Maturity Indicator to test if the data uses a formal language broadly applicable for knowledge representation.\n\
This particular test takes a broad view of what defines a 'knowledge representation language'; in this evaluation, \
anything that can be represented as structured data will be accepted",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["data", "interoperability"],
};

pub struct DataKnowledgeRepresentationWeak;

#[async_trait]
impl MetricTest for DataKnowledgeRepresentationWeak {
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
        if !graph.is_empty() {
            eval.info(format!(
                "Successfully found and parsed RDF metadata. It contains {} triples",
                graph.len()
            ));
        }

        let data_uris = data_uris_in_metadata(eval, &graph);
        if data_uris.is_empty() {
            eval.failure("Could not find data URI in the metadata.");
            return;
        }

        for uri in data_uris {
            eval.info(format!("Found data URI: {uri}. Try retrieving RDF"));
            let data = ctx
                .harvester
                .retrieve_metadata(eval, uri.as_str(), RetrieveOptions::default())
                .await
                .into_graph();
            if !data.is_empty() {
                eval.success(format!(
                    "Successfully found and parsed RDF data for {uri}. It contains {} triples",
                    data.len()
                ));
                continue;
            }

            eval.warn(format!("No RDF data found for {uri}, searching for JSON or YAML"));
            match fetch_structured(ctx.client, uri.as_str()).await {
                Ok((format, document)) => eval.success(format!(
                    "Successfully found and parsed {format} data for {uri}: {document}"
                )),
                Err(e) => eval.failure(format!("No JSON or YAML data found for {uri}: {e}")),
            }
        }
    }
}
