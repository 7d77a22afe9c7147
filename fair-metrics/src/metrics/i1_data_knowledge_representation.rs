use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use crate::rdf::{Graph, Term};
use crate::vocab;
use async_trait::async_trait;

static INFO: MetricInfo = MetricInfo {
    metric_path: "i1-data-knowledge-representation",
    applies_to_principle: "I1",
    title: "Data uses a formal knowledge representation language (strong)",
    description: "Maturity Indicator to test if the data uses a formal language broadly applicable for knowledge representation.\n\
This particular test takes a broad view of what defines a 'knowledge representation language'; in this evaluation, \
a knowledge representation language is interpreted as one in which terms are semantically-grounded in ontologies.\n\
Any form of ontologically-grounded linked data will pass this test.",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["data", "interoperability"],
};

pub struct DataKnowledgeRepresentation;

#[async_trait]
impl MetricTest for DataKnowledgeRepresentation {
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
            let data = ctx
                .harvester
                .retrieve_metadata(eval, uri.as_str(), RetrieveOptions::default())
                .await
                .into_graph();
            if data.is_empty() {
                eval.failure(format!("Could not find RDF at the data URI: {uri}"));
            } else {
                eval.success(format!(
                    "Successfully retrieved RDF for the data URI: {uri}. It contains {} triples",
                    data.len()
                ));
            }
        }
    }
}

/// Data URIs linked from the subject's node, or from any alias when the
/// node cannot be found
pub(crate) fn data_uris_in_metadata(eval: &mut Evaluation, graph: &Graph) -> Vec<Term> {
    let aliases = eval.alternative_uris().to_vec();
    let subjects = match eval.extract_metadata_subject(graph, &aliases) {
        Some(node) => vec![node],
        None => aliases.iter().map(|alias| Term::iri(alias.as_str())).collect(),
    };
    eval.info(format!(
        "Searching for the data URI using the following predicates: {}",
        vocab::DATA_PREDICATES.join(", ")
    ));
    eval.extract_data_subject(graph, &subjects)
}
