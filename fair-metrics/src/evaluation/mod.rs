//! Per-request evaluation session
//!
//! One [`Evaluation`] is created for each metric call. It holds the
//! normalized subject with its alias set, the score ledger, the user-visible
//! log and the auxiliary findings returned under `sio:metadata`.

pub mod log;

pub use log::{EvaluationLog, LogEntry, LogLevel};

use crate::identifier::{self, push_unique, scheme_counterpart};
use crate::rdf::{Graph, Term};
use crate::vocab;
use chrono::Local;
use fair_common::Settings;
use reqwest::Url;
use serde_json::{json, Map, Value};

pub struct Evaluation {
    subject: String,
    subject_url: Option<String>,
    metric_path: String,
    metric_version: String,
    id: String,
    date: String,
    score: u32,
    bonus_score: u32,
    alternative_uris: Vec<String>,
    log: EvaluationLog,
    data: Map<String, Value>,
}

impl Evaluation {
    pub fn new(subject: &str, metric_path: &str, metric_version: &str, settings: &Settings) -> Self {
        let subject = subject.trim().to_string();
        let date = Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string();
        let id = result_id(&settings.host_url, metric_path, &subject, &date);

        let mut log = EvaluationLog::new();
        let subject_url = match identifier::resolve(&subject) {
            Some(id) => {
                log.info(format!("Validated the resource {subject} is a {}", id.kind));
                Some(id.url)
            }
            None => {
                log.warn(format!(
                    "Could not validate the given resource URI {subject} is a URL, DOI, or handle"
                ));
                None
            }
        };
        let alternative_uris = subject_url
            .as_deref()
            .map(identifier::initial_aliases)
            .unwrap_or_default();

        Self {
            subject,
            subject_url,
            metric_path: metric_path.to_string(),
            metric_version: metric_version.to_string(),
            id,
            date,
            score: 0,
            bonus_score: 0,
            alternative_uris,
            log,
            data: Map::new(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Canonical URL of the subject, `None` when it could not be classified
    pub fn subject_url(&self) -> Option<&str> {
        self.subject_url.as_deref()
    }

    pub fn metric_path(&self) -> &str {
        &self.metric_path
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn bonus_score(&self) -> u32 {
        self.bonus_score
    }

    pub fn alternative_uris(&self) -> &[String] {
        &self.alternative_uris
    }

    /// Add an alias; invalid URIs and duplicates are ignored
    pub fn add_alternative_uri(&mut self, uri: &str) -> bool {
        if Url::parse(uri).is_err() || self.alternative_uris.iter().any(|u| u == uri) {
            return false;
        }
        self.alternative_uris.push(uri.to_string());
        true
    }

    pub fn log(&self) -> &EvaluationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut EvaluationLog {
        &mut self.log
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn set_data(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    // ========================================================================
    // Scoring ledger
    // ========================================================================

    pub fn info(&mut self, message: impl Into<String>) {
        self.log.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.log.push(LogLevel::Warn, message);
    }

    /// Resets the score to 0
    pub fn failure(&mut self, message: impl Into<String>) {
        self.score = 0;
        self.log.push(LogLevel::Failure, message);
    }

    /// Sets the score to 1, or counts a bonus once the score is already 1
    pub fn success(&mut self, message: impl Into<String>) {
        if self.score >= 1 {
            self.bonus(message);
        } else {
            self.score = 1;
            self.log.push(LogLevel::Success, message);
        }
    }

    pub fn bonus(&mut self, message: impl Into<String>) {
        self.bonus_score += 1;
        self.log.push(LogLevel::Success, message);
    }

    // ========================================================================
    // Graph helpers
    // ========================================================================

    /// Values of `predicates` (and their http/https counterparts), limited
    /// to `subjects` when given
    pub fn extract_property(
        &mut self,
        graph: &Graph,
        predicates: &[&str],
        subjects: Option<&[Term]>,
    ) -> Vec<Term> {
        let mut checked = Vec::new();
        for predicate in predicates {
            push_unique(&mut checked, predicate.to_string());
            if let Some(counterpart) = scheme_counterpart(predicate) {
                push_unique(&mut checked, counterpart);
            }
        }

        self.info(format!("Checking values for properties: {}", predicates.join(", ")));
        if let Some(subjects) = subjects {
            let listed: Vec<&str> = subjects.iter().map(Term::as_str).collect();
            self.info(format!("Checking values for subjects URIs: {}", listed.join(", ")));
        }

        let scopes: Vec<Option<&Term>> = match subjects {
            Some(subjects) => subjects.iter().map(Some).collect(),
            None => vec![None],
        };

        let mut values: Vec<Term> = Vec::new();
        for predicate in checked {
            let predicate = Term::iri(predicate);
            for subject in &scopes {
                let found: Vec<Term> = graph
                    .pattern(*subject, Some(&predicate), None)
                    .map(|t| t.object.clone())
                    .collect();
                for object in found {
                    self.info(format!("Found a value for property {predicate} => {object}"));
                    if !values.contains(&object) {
                        values.push(object);
                    }
                }
            }
        }
        values
    }

    /// Node describing the subject in its own metadata
    ///
    /// Each alias (and its scheme counterpart) is tried in order, first as a
    /// triple subject, then as the IRI or literal object of an identifier
    /// predicate. The first match wins and is recorded under
    /// `identifier_in_metadata`.
    pub fn extract_metadata_subject(&mut self, graph: &Graph, alias_uris: &[String]) -> Option<Term> {
        let mut candidates = Vec::new();
        for alias in alias_uris {
            push_unique(&mut candidates, alias.clone());
            if let Some(counterpart) = scheme_counterpart(alias) {
                push_unique(&mut candidates, counterpart);
            }
        }

        let mut identifier_predicates = Vec::new();
        for predicate in vocab::IDENTIFIER_PREDICATES {
            push_unique(&mut identifier_predicates, predicate.to_string());
            if let Some(counterpart) = scheme_counterpart(predicate) {
                push_unique(&mut identifier_predicates, counterpart);
            }
        }

        self.info(format!(
            "Checking RDF metadata to find links to all the alternative identifiers: <{}>",
            candidates.join(">, <")
        ));

        for alias in &candidates {
            let as_subject = Term::iri(alias.as_str());
            if graph.pattern(Some(&as_subject), None, None).next().is_some() {
                self.record_subject_properties(graph, &as_subject);
                self.info(format!("Found the subject {alias} in the metadata"));
                return Some(as_subject);
            }

            for predicate in &identifier_predicates {
                let predicate = Term::iri(predicate.as_str());
                let found = graph
                    .pattern(None, Some(&predicate), None)
                    .find(|t| {
                        t.object.has_value(alias)
                            && matches!(t.object, Term::Iri(_) | Term::Literal { .. })
                    })
                    .map(|t| t.subject.clone());
                if let Some(subject) = found {
                    self.record_identifier_link(&subject, &predicate);
                    self.info(format!(
                        "Found the identifier {alias} in the metadata of {subject} with {predicate}"
                    ));
                    return Some(subject);
                }
            }
        }

        self.warn(format!(
            "Could not find the subject identifier in the metadata, tried: {}",
            candidates.join(", ")
        ));
        None
    }

    /// The subject's own triples, under `identifier_in_metadata.properties`
    fn record_subject_properties(&mut self, graph: &Graph, subject: &Term) {
        let properties: Map<String, Value> = graph
            .pattern(Some(subject), None, None)
            .map(|t| (t.predicate.to_string(), Value::String(t.object.to_string())))
            .collect();
        self.set_data("identifier_in_metadata", json!({ "properties": properties }));
    }

    /// The node naming the subject and the identifier predicate linking them,
    /// under `identifier_in_metadata.linked_to`
    fn record_identifier_link(&mut self, subject: &Term, predicate: &Term) {
        self.set_data(
            "identifier_in_metadata",
            json!({ "linked_to": { (subject.to_string()): predicate.to_string() } }),
        );
    }

    /// URIs of the data described by the metadata about `subjects`
    ///
    /// Blank-node values are followed through their download predicates;
    /// every download location found is appended to `content_url`.
    pub fn extract_data_subject(&mut self, graph: &Graph, subjects: &[Term]) -> Vec<Term> {
        let mut data_uris = Vec::new();
        let values = self.extract_property(graph, vocab::DATA_PREDICATES, Some(subjects));

        for value in values {
            if !value.is_blank_node() {
                if !data_uris.contains(&value) {
                    data_uris.push(value);
                }
                continue;
            }

            let node = std::slice::from_ref(&value);
            for content in self.extract_property(graph, vocab::CONTENT_PREDICATES, Some(node)) {
                self.push_content_url(content.as_str());
                if !data_uris.contains(&content) {
                    data_uris.push(content);
                }
            }
        }

        data_uris
    }

    fn push_content_url(&mut self, url: &str) {
        let entry = self
            .data
            .entry("content_url")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(urls) = entry {
            let url = Value::String(url.to_string());
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }

    /// Result document returned by the metric endpoint
    pub fn to_json_ld(&self) -> Value {
        let mut metadata = self.data.clone();
        metadata.insert("alternative_uris".to_string(), json!(self.alternative_uris));
        metadata.insert("score_bonus".to_string(), json!(self.bonus_score));

        json!([{
            "@id": self.id,
            "@type": [vocab::METRIC_EVALUATION_RESULT],
            (vocab::OBO_DATE): [{"@value": self.date, "@type": vocab::XSD_DATE}],
            (vocab::SCHEMA_SOFTWARE_VERSION): [{"@value": self.metric_version, "@type": vocab::XSD_FLOAT}],
            (vocab::SCHEMA_COMMENT): [{"@value": self.log.joined(), "@language": "en"}],
            (vocab::SIO_IS_ABOUT): [{"@value": self.subject, "@language": "en"}],
            (vocab::SIO_HAS_VALUE): [{"@value": f64::from(self.score), "@type": vocab::XSD_FLOAT}],
            (vocab::SIO_METADATA): metadata,
        }])
    }
}

/// `{host_url}/metrics/{metric_path}#{subject}/result-{date}`
fn result_id(host_url: &str, metric_path: &str, subject: &str, date: &str) -> String {
    let base = format!("{}/metrics/{}", host_url.trim_end_matches('/'), metric_path);
    let fragment = format!("{subject}/result-{date}");
    match Url::parse(&base) {
        Ok(mut url) => {
            url.set_fragment(Some(&fragment));
            url.to_string()
        }
        Err(_) => format!("{base}#{fragment}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Triple;

    fn eval(subject: &str) -> Evaluation {
        Evaluation::new(subject, "f1-test", "0.1.0", &Settings::default())
    }

    #[test]
    fn test_scoring_laws() {
        let mut e = eval("https://example.org/x");
        e.success("first");
        assert_eq!((e.score(), e.bonus_score()), (1, 0));

        e.success("second");
        assert_eq!((e.score(), e.bonus_score()), (1, 1));

        e.failure("reset");
        assert_eq!((e.score(), e.bonus_score()), (0, 1));

        e.bonus("extra");
        assert_eq!((e.score(), e.bonus_score()), (0, 2));

        e.success("again");
        assert_eq!(e.score(), 1);
    }

    #[test]
    fn test_unclassifiable_subject() {
        let e = eval("Wrong entry");
        assert!(e.subject_url().is_none());
        assert!(e.alternative_uris().is_empty());
        assert!(e.log().lines()[0].starts_with("WARN:"));
    }

    #[test]
    fn test_doi_subject_aliases() {
        let e = eval("doi:10.1594/PANGAEA.908011");
        assert_eq!(e.subject_url(), Some("https://doi.org/10.1594/PANGAEA.908011"));
        assert_eq!(e.alternative_uris()[0], "https://doi.org/10.1594/PANGAEA.908011");
        assert!(e
            .alternative_uris()
            .contains(&"http://dx.doi.org/10.1594/PANGAEA.908011".to_string()));
    }

    #[test]
    fn test_add_alternative_uri_rejects_duplicates_and_invalid() {
        let mut e = eval("https://example.org/x");
        assert!(!e.add_alternative_uri("https://example.org/x"));
        assert!(!e.add_alternative_uri("not a uri"));
        assert!(e.add_alternative_uri("https://example.org/landing"));
        assert_eq!(e.alternative_uris().len(), 3);
    }

    fn metadata_graph() -> Graph {
        let ds = Term::iri("https://example.org/landing");
        let dist = Term::BlankNode("d0".into());
        [
            Triple::new(ds.clone(), Term::iri("http://schema.org/name"), Term::literal("Landing")),
            Triple::new(
                ds.clone(),
                Term::iri("http://schema.org/identifier"),
                Term::literal("https://doi.org/10.1594/PANGAEA.908011"),
            ),
            Triple::new(ds.clone(), Term::iri("http://schema.org/distribution"), dist.clone()),
            Triple::new(
                dist,
                Term::iri("http://schema.org/contentUrl"),
                Term::iri("https://example.org/data.csv"),
            ),
            Triple::new(
                ds,
                Term::iri("http://schema.org/about"),
                Term::iri("https://example.org/topic"),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_extract_property_matches_scheme_counterparts() {
        let mut e = eval("https://example.org/x");
        let values = e.extract_property(&metadata_graph(), &["https://schema.org/name"], None);
        assert_eq!(values, vec![Term::literal("Landing")]);

        let scoped = e.extract_property(
            &metadata_graph(),
            &["https://schema.org/name"],
            Some(&[Term::iri("https://example.org/other")][..]),
        );
        assert!(scoped.is_empty());
    }

    #[test]
    fn test_extract_metadata_subject_via_identifier_literal() {
        let mut e = eval("https://doi.org/10.1594/PANGAEA.908011");
        let aliases = e.alternative_uris().to_vec();
        let found = e.extract_metadata_subject(&metadata_graph(), &aliases);

        assert_eq!(found, Some(Term::iri("https://example.org/landing")));
        let recorded = &e.data()["identifier_in_metadata"];
        assert_eq!(
            recorded["linked_to"],
            json!({"https://example.org/landing": "http://schema.org/identifier"})
        );
        assert!(recorded.get("properties").is_none());
    }

    #[test]
    fn test_identifier_link_ignores_other_references() {
        let mut graph = metadata_graph();
        graph.insert(Triple::new(
            Term::iri("https://example.org/catalog"),
            Term::iri("http://www.w3.org/ns/dcat#dataset"),
            Term::iri("https://example.org/landing"),
        ));
        let mut e = eval("https://doi.org/10.1594/PANGAEA.908011");
        let aliases = e.alternative_uris().to_vec();
        e.extract_metadata_subject(&graph, &aliases);

        let linked = e.data()["identifier_in_metadata"]["linked_to"].as_object().unwrap();
        assert_eq!(linked.len(), 1);
        assert!(linked.get("https://example.org/catalog").is_none());
    }

    #[test]
    fn test_subject_found_directly_records_properties() {
        let mut e = eval("https://example.org/landing");
        let aliases = e.alternative_uris().to_vec();
        let found = e.extract_metadata_subject(&metadata_graph(), &aliases);

        assert_eq!(found, Some(Term::iri("https://example.org/landing")));
        let recorded = &e.data()["identifier_in_metadata"];
        assert_eq!(recorded["properties"]["http://schema.org/name"], "Landing");
        assert!(recorded.get("linked_to").is_none());
    }

    #[test]
    fn test_extract_metadata_subject_absent() {
        let mut e = eval("https://example.org/unknown");
        let aliases = e.alternative_uris().to_vec();
        assert!(e.extract_metadata_subject(&metadata_graph(), &aliases).is_none());
        assert!(e.data().get("identifier_in_metadata").is_none());
    }

    #[test]
    fn test_extract_data_subject_follows_distribution() {
        let mut e = eval("https://example.org/landing");
        let uris = e.extract_data_subject(&metadata_graph(), &[Term::iri("https://example.org/landing")]);

        assert!(uris.contains(&Term::iri("https://example.org/topic")));
        assert!(uris.contains(&Term::iri("https://example.org/data.csv")));
        assert_eq!(e.data()["content_url"], json!(["https://example.org/data.csv"]));
    }

    #[test]
    fn test_to_json_ld_shape() {
        let mut e = eval("https://example.org/x");
        e.success("ok");
        e.bonus("more");

        let result = e.to_json_ld();
        let node = &result[0];
        assert!(node["@id"]
            .as_str()
            .unwrap()
            .starts_with("https://metrics.api.fair-enough.semanticscience.org/metrics/f1-test#https://example.org/x/result-"));
        assert_eq!(node["@type"], json!([vocab::METRIC_EVALUATION_RESULT]));
        assert_eq!(node[vocab::SIO_HAS_VALUE][0]["@value"], json!(1.0));
        assert_eq!(node[vocab::SIO_IS_ABOUT][0]["@value"], "https://example.org/x");
        assert_eq!(node[vocab::SIO_METADATA]["score_bonus"], 1);
        assert_eq!(node[vocab::SIO_METADATA]["alternative_uris"][1], "http://example.org/x");

        let comment = node[vocab::SCHEMA_COMMENT][0]["@value"].as_str().unwrap();
        assert!(comment.contains("\n\nSUCCESS: ["));
    }
}
