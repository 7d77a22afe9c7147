use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;

pub const LOV_VOCABULARY_LIST: &str = "https://lov.linkeddata.es/dataset/lov/api/v2/vocabulary/list";

static INFO: MetricInfo = MetricInfo {
    metric_path: "i2-fair-vocabularies",
    applies_to_principle: "I2",
    title: "Metadata uses FAIR Vocabularies",
    description: "The metadata values and qualified relations should themselves be FAIR, for example, \
terms from open, community-accepted vocabularies published in an appropriate knowledge-exchange format.\n\
Resolve IRIs, check FAIRness of the returned documents.",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["vocabularies", "interoperability"],
};

/// One entry of the Linked Open Vocabularies list
#[derive(Debug, Clone, Deserialize)]
pub struct LovVocabulary {
    #[serde(default)]
    pub nsp: String,
}

pub struct FairVocabularies {
    lov_url: String,
}

impl FairVocabularies {
    pub fn new() -> Self {
        Self::with_lov_url(LOV_VOCABULARY_LIST)
    }

    pub fn with_lov_url(lov_url: impl Into<String>) -> Self {
        Self {
            lov_url: lov_url.into(),
        }
    }
}

impl Default for FairVocabularies {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricTest for FairVocabularies {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        let graph = ctx
            .harvester
            .retrieve_metadata(eval, &subject, RetrieveOptions::with_harvester())
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

        let namespaces = graph.namespaces();
        eval.info(format!(
            "Check if used vocabularies in Linked Open Vocabularies: {}",
            self.lov_url
        ));
        let vocabularies = match fetch_vocabularies(ctx.client, &self.lov_url).await {
            Ok(vocabularies) => vocabularies,
            Err(e) => {
                eval.failure(format!(
                    "Could not retrieve the Linked Open Vocabularies list from {}: {e}",
                    self.lov_url
                ));
                return;
            }
        };

        let validated = validate_namespaces(&namespaces, &vocabularies);
        if validated.is_empty() {
            eval.failure(format!(
                "Could not find vocabularies used by the resource metadata in the Linked Open Vocabularies: {}",
                join(&namespaces)
            ));
        } else {
            eval.success(format!(
                "Found vocabularies used by the resource metadata in the Linked Open Vocabularies: {}",
                join(&validated)
            ));
        }
    }
}

async fn fetch_vocabularies(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<LovVocabulary>, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.json().await
}

/// Namespaces matching a LOV namespace, prefix match in either direction
pub fn validate_namespaces(
    namespaces: &BTreeSet<String>,
    vocabularies: &[LovVocabulary],
) -> BTreeSet<String> {
    namespaces
        .iter()
        .filter(|ns| {
            vocabularies.iter().any(|vocab| {
                !vocab.nsp.is_empty()
                    && (vocab.nsp.starts_with(ns.as_str()) || ns.starts_with(vocab.nsp.as_str()))
            })
        })
        .cloned()
        .collect()
}

fn join(namespaces: &BTreeSet<String>) -> String {
    namespaces.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
