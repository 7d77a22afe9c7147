use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::identifier;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DATACITE_DOIS_API: &str = "https://api.datacite.org/dois/";
const DATACITE_TIMEOUT: Duration = Duration::from_secs(10);

static INFO: MetricInfo = MetricInfo {
    metric_path: "f4-searchable",
    applies_to_principle: "F4",
    title: "The resource is indexed in a searchable resource",
    description: "Search for existing metadata about the resource URI in data repositories, such as DataCite, RE3data.",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["search"],
};

#[derive(Debug, Deserialize)]
struct DataCiteResponse {
    data: Option<DataCiteRecord>,
}

#[derive(Debug, Deserialize)]
struct DataCiteRecord {
    attributes: Option<DataCiteAttributes>,
}

#[derive(Debug, Default, Deserialize)]
struct DataCiteAttributes {
    #[serde(default)]
    titles: Vec<DataCiteTitle>,
    #[serde(default)]
    descriptions: Vec<DataCiteDescription>,
}

#[derive(Debug, Deserialize)]
struct DataCiteTitle {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataCiteDescription {
    description: Option<String>,
}

pub struct Searchable {
    api_url: String,
}

impl Searchable {
    pub fn new() -> Self {
        Self::with_api_url(DATACITE_DOIS_API)
    }

    /// Point the DOI lookups at another DataCite-compatible endpoint
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    async fn lookup(&self, client: &reqwest::Client, doi: &str) -> Result<Option<DataCiteAttributes>, reqwest::Error> {
        let url = format!("{}{}", self.api_url, doi);
        debug!(url = %url, "Querying DataCite");
        let response: DataCiteResponse = client
            .get(&url)
            .timeout(DATACITE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.data.and_then(|record| record.attributes))
    }
}

impl Default for Searchable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricTest for Searchable {
    fn info(&self) -> &MetricInfo {
        &INFO
    }

    async fn evaluate(&self, eval: &mut Evaluation, ctx: &EvaluationContext<'_>) {
        let subject = eval.subject().to_string();
        let Some(doi) = eval.subject_url().and_then(identifier::doi_of) else {
            eval.failure(format!(
                "The subject {subject} is not a DOI, skipping search in DataCite API"
            ));
            return;
        };

        eval.info(format!("The subject resource URI {subject} is a DOI"));
        eval.info(format!("Checking DataCite API for metadata about the DOI: {doi}"));
        match self.lookup(ctx.client, &doi).await {
            Ok(Some(attributes)) => {
                eval.success(format!("Retrieved metadata about {doi} from DataCite API"));
                record_datacite(eval, &attributes);
            }
            Ok(None) => eval.failure(format!("DataCite API has no metadata about {doi}")),
            Err(e) => eval.failure(format!("Search in DataCite API failed: {e}")),
        }
    }
}

fn record_datacite(eval: &mut Evaluation, attributes: &DataCiteAttributes) {
    let title = attributes.titles.first().and_then(|t| t.title.clone());
    let description = attributes
        .descriptions
        .first()
        .and_then(|d| d.description.clone());

    let mut found = json!({});
    if let Some(title) = &title {
        found["title"] = Value::String(title.clone());
        if !eval.data().contains_key("title") {
            eval.set_data("title", Value::String(title.clone()));
        }
    }
    if let Some(description) = description {
        found["description"] = Value::String(description);
    }
    eval.set_data("datacite", found);
}
