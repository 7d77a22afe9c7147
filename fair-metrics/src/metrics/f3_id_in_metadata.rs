use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use crate::vocab;
use async_trait::async_trait;
use serde_json::Value;

static INFO: MetricInfo = MetricInfo {
    metric_path: "f3-id-in-metadata",
    applies_to_principle: "F3",
    title: "Resource Identifier is in Metadata",
    description: "Whether the metadata document contains the globally unique and persistent identifier for the digital resource.\n\
Parse the metadata to search for the given digital resource GUID.\n\
If found, retrieve informations about this resource (title, description, date created, etc)",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["identifier", "metadata"],
};

/// Findings copied into the result data when the subject is found
const DESCRIPTIVE_PROPERTIES: &[(&str, &[&str])] = &[
    ("title", vocab::TITLE_PREDICATES),
    ("description", vocab::DESCRIPTION_PREDICATES),
    ("date_created", vocab::DATE_CREATED_PREDICATES),
];

pub struct IdInMetadata;

#[async_trait]
impl MetricTest for IdInMetadata {
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
            eval.failure("No RDF found at the subject URL provided.");
            return;
        }
        eval.info(format!(
            "RDF metadata containing {} triples found at the subject URL provided.",
            graph.len()
        ));

        let aliases = eval.alternative_uris().to_vec();
        let Some(node) = eval.extract_metadata_subject(&graph, &aliases) else {
            eval.failure(format!(
                "Could not find links to the resource URI {subject} in the RDF metadata"
            ));
            return;
        };

        let linked = linked_keys(eval.data().get("identifier_in_metadata"));
        eval.success(format!(
            "Found properties/links for the URI {node} in the metadata: {}",
            linked.join(", ")
        ));

        let scope = std::slice::from_ref(&node);
        for (key, predicates) in DESCRIPTIVE_PROPERTIES {
            let values = eval.extract_property(&graph, predicates, Some(scope));
            if let Some(value) = values.first() {
                if !eval.data().contains_key(*key) {
                    eval.set_data(key, Value::String(value.as_str().to_string()));
                }
            }
        }
    }
}

/// Predicates and linking subjects recorded under `identifier_in_metadata`
fn linked_keys(found: Option<&Value>) -> Vec<String> {
    let Some(found) = found else {
        return Vec::new();
    };
    ["properties", "linked_to"]
        .iter()
        .filter_map(|field| found.get(field).and_then(Value::as_object))
        .flat_map(|map| map.keys().cloned())
        .collect()
}
