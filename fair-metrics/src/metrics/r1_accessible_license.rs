use super::{EvaluationContext, MetricInfo, MetricTest, DEFAULT_AUTHOR, DEFAULT_METRIC_VERSION};
use crate::evaluation::Evaluation;
use crate::harvest::RetrieveOptions;
use crate::vocab;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub const SPDX_LICENSE_LIST: &str = "https://raw.github.com/spdx/license-list-data/master/json/licenses.json";

static INFO: MetricInfo = MetricInfo {
    metric_path: "r1-accessible-license",
    applies_to_principle: "R1",
    title: "Check accessible Usage License",
    description: "The existence of a license document, for BOTH (independently) the data and its associated metadata, \
and the ability to retrieve those documents\n\
Resolve the licenses IRI",
    author: DEFAULT_AUTHOR,
    metric_version: DEFAULT_METRIC_VERSION,
    topics: &["license", "reusability"],
};

#[derive(Debug, Deserialize)]
struct SpdxLicenseList {
    #[serde(default)]
    licenses: Vec<SpdxLicense>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpdxLicense {
    #[serde(rename = "licenseId", default)]
    pub license_id: String,
    #[serde(rename = "seeAlso", default)]
    pub see_also: Vec<String>,
    #[serde(rename = "isOsiApproved", default)]
    pub is_osi_approved: bool,
}

pub struct AccessibleLicense {
    spdx_url: String,
}

impl AccessibleLicense {
    pub fn new() -> Self {
        Self::with_spdx_url(SPDX_LICENSE_LIST)
    }

    pub fn with_spdx_url(spdx_url: impl Into<String>) -> Self {
        Self {
            spdx_url: spdx_url.into(),
        }
    }

    async fn fetch_licenses(&self, client: &reqwest::Client) -> Result<Vec<SpdxLicense>, reqwest::Error> {
        let list: SpdxLicenseList = client
            .get(&self.spdx_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list.licenses)
    }
}

impl Default for AccessibleLicense {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricTest for AccessibleLicense {
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

        eval.info("Checking for license in RDF metadata");
        let license = match eval.data().get("license").and_then(Value::as_str) {
            Some(license) => Some(license.to_string()),
            None => eval
                .extract_property(&graph, vocab::LICENSE_PREDICATES, None)
                .first()
                .map(|term| term.as_str().to_string()),
        };

        let Some(license) = license else {
            eval.failure("Could not find license information in metadata");
            return;
        };
        eval.set_data("license", Value::String(license.clone()));
        eval.success(format!("Found license in metadata: {license}"));

        eval.info("Check if license is approved by the Open Source Initiative, in the SPDX licenses list");
        match self.fetch_licenses(ctx.client).await {
            Ok(licenses) => {
                if let Some(approved) = osi_approved(&licenses, &license) {
                    eval.bonus(format!(
                        "License approved by the Open Source Initiative ({license}, SPDX {})",
                        approved.license_id
                    ));
                }
            }
            Err(e) => eval.warn(format!(
                "Could not retrieve the SPDX licenses list from {}: {e}",
                self.spdx_url
            )),
        }
    }
}

/// OSI-approved SPDX entry listing `license` among its references
pub fn osi_approved<'a>(licenses: &'a [SpdxLicense], license: &str) -> Option<&'a SpdxLicense> {
    licenses
        .iter()
        .find(|entry| entry.is_osi_approved && entry.see_also.iter().any(|url| url == license))
}
