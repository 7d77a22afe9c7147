//! FAIR metric test units
//!
//! Every unit implements [`MetricTest`] and is listed in
//! [`MetricRegistry::builtin`]. The API layer looks units up by path.

pub mod a1_access_protocol;
pub mod a1_metadata_protocol;
pub mod descriptor;
pub mod f1_unique_persistent_id;
pub mod f2_machine_readable_metadata;
pub mod f3_id_in_metadata;
pub mod f4_searchable;
pub mod i1_data_knowledge_representation;
pub mod i1_data_knowledge_representation_weak;
pub mod i1_knowledge_representation;
pub mod i1_metadata_knowledge_representation_weak;
pub mod i2_fair_vocabularies;
pub mod r1_accessible_license;
pub mod structured;

use crate::evaluation::Evaluation;
use crate::harvest::MetadataHarvester;
use async_trait::async_trait;
use fair_common::Settings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_AUTHOR: &str = "https://orcid.org/0000-0002-1501-1082";
pub const DEFAULT_METRIC_VERSION: &str = "0.1.0";

/// Static description of a metric test unit
#[derive(Debug, Clone, Serialize)]
pub struct MetricInfo {
    pub metric_path: &'static str,
    pub applies_to_principle: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub author: &'static str,
    pub metric_version: &'static str,
    pub topics: &'static [&'static str],
}

/// Shared services handed to a metric while it evaluates
pub struct EvaluationContext<'a> {
    pub harvester: &'a MetadataHarvester,
    pub client: &'a reqwest::Client,
    pub settings: &'a Settings,
}

#[async_trait]
pub trait MetricTest: Send + Sync {
    fn info(&self) -> &MetricInfo;

    /// Record log lines and score on `eval`, never fails
    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>);
}

/// Create a session for `subject` and run `metric` on it
pub async fn run_metric(
    metric: &dyn MetricTest,
    subject: &str,
    ctx: &EvaluationContext<'_>,
) -> Evaluation {
    let info = metric.info();
    let mut eval = Evaluation::new(subject, info.metric_path, info.metric_version, ctx.settings);
    metric.evaluate(&mut eval, ctx).await;
    info!(
        metric = info.metric_path,
        subject = %subject,
        score = eval.score(),
        bonus = eval.bonus_score(),
        "Metric evaluated"
    );
    eval
}

/// Compile-time list of the available metric tests, keyed by path
pub struct MetricRegistry {
    metrics: BTreeMap<&'static str, Arc<dyn MetricTest>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            metrics: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(a1_access_protocol::AccessProtocol));
        registry.register(Arc::new(a1_metadata_protocol::MetadataProtocol));
        registry.register(Arc::new(f1_unique_persistent_id::UniquePersistentId));
        registry.register(Arc::new(f2_machine_readable_metadata::MachineReadableMetadata));
        registry.register(Arc::new(f3_id_in_metadata::IdInMetadata));
        registry.register(Arc::new(f4_searchable::Searchable::new()));
        registry.register(Arc::new(i1_knowledge_representation::KnowledgeRepresentation));
        registry.register(Arc::new(
            i1_metadata_knowledge_representation_weak::MetadataKnowledgeRepresentationWeak,
        ));
        registry.register(Arc::new(i1_data_knowledge_representation::DataKnowledgeRepresentation));
        registry.register(Arc::new(
            i1_data_knowledge_representation_weak::DataKnowledgeRepresentationWeak,
        ));
        registry.register(Arc::new(i2_fair_vocabularies::FairVocabularies::new()));
        registry.register(Arc::new(r1_accessible_license::AccessibleLicense::new()));
        registry
    }

    /// Add `metric`, replacing any unit registered under the same path
    pub fn register(&mut self, metric: Arc<dyn MetricTest>) {
        self.metrics.insert(metric.info().metric_path, metric);
    }

    pub fn get(&self, metric_path: &str) -> Option<Arc<dyn MetricTest>> {
        self.metrics.get(metric_path).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MetricTest>> {
        self.metrics.values()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// Harvester, client and settings without any network configuration
    pub fn offline_context() -> (MetadataHarvester, reqwest::Client, Settings) {
        let settings = Settings::default();
        let harvester = MetadataHarvester::new(&settings).unwrap();
        let client = harvester.client().clone();
        (harvester, client, settings)
    }
}
