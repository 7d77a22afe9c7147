//! Bytes or JSON into a [`Graph`]
//!
//! Text input is parsed with the format implied by the declared mime type,
//! or with each format of [`SyntaxFormat::FALLBACK_ORDER`] until one works.
//! JSON input always goes through the JSON-LD processor.

use super::graph::{Graph, Term, Triple};
use super::jsonld::JsonLdContextLoader;
use crate::evaluation::EvaluationLog;
use oxjsonld::JsonLdParser;
use oxrdfio::{RdfFormat, RdfParser};
use serde_json::Value;
use std::sync::Arc;

/// Context every schema.org reference is pinned to
pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org/docs/jsonldcontext.json";

/// Auto-generated HTML triples removed after every parse
pub const NOISE_PREDICATES: &[&str] = &["http://www.w3.org/1999/xhtml/vocab#role"];

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// Metadata handed to the parser
#[derive(Debug, Clone)]
pub enum RdfInput {
    Json(Value),
    Text(String),
}

/// Result of one attempted format
#[derive(Debug)]
enum ParseOutcome {
    Parsed(Graph),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxFormat {
    Turtle,
    JsonLd,
    RdfXml,
    NTriples,
    NQuads,
    TriG,
    N3,
}

impl SyntaxFormat {
    pub const FALLBACK_ORDER: [SyntaxFormat; 7] = [
        SyntaxFormat::Turtle,
        SyntaxFormat::JsonLd,
        SyntaxFormat::RdfXml,
        SyntaxFormat::NTriples,
        SyntaxFormat::NQuads,
        SyntaxFormat::TriG,
        SyntaxFormat::N3,
    ];

    /// Guess the format from a content type, parameters ignored
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
        if essence.contains("turtle") {
            Some(SyntaxFormat::Turtle)
        } else if essence.contains("json") {
            Some(SyntaxFormat::JsonLd)
        } else if essence.contains("xml") {
            Some(SyntaxFormat::RdfXml)
        } else if essence.contains("n-triples") || essence.contains("ntriples") {
            Some(SyntaxFormat::NTriples)
        } else if essence.contains("n-quads") || essence.contains("nquads") {
            Some(SyntaxFormat::NQuads)
        } else if essence.contains("trig") {
            Some(SyntaxFormat::TriG)
        } else if essence.contains("n3") {
            Some(SyntaxFormat::N3)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SyntaxFormat::Turtle => "turtle",
            SyntaxFormat::JsonLd => "json-ld",
            SyntaxFormat::RdfXml => "xml",
            SyntaxFormat::NTriples => "ntriples",
            SyntaxFormat::NQuads => "nquads",
            SyntaxFormat::TriG => "trig",
            SyntaxFormat::N3 => "n3",
        }
    }

    fn rdf_format(&self) -> Option<RdfFormat> {
        match self {
            SyntaxFormat::Turtle => Some(RdfFormat::Turtle),
            SyntaxFormat::RdfXml => Some(RdfFormat::RdfXml),
            SyntaxFormat::NTriples => Some(RdfFormat::NTriples),
            SyntaxFormat::NQuads => Some(RdfFormat::NQuads),
            SyntaxFormat::TriG => Some(RdfFormat::TriG),
            SyntaxFormat::N3 => Some(RdfFormat::N3),
            SyntaxFormat::JsonLd => None,
        }
    }
}

/// Parses metadata, owns the shared context loader
pub struct MetadataParser {
    contexts: Arc<JsonLdContextLoader>,
}

impl MetadataParser {
    pub fn new(contexts: Arc<JsonLdContextLoader>) -> Self {
        Self { contexts }
    }

    /// Parse `input`; never fails, exhaustion yields an empty graph
    pub async fn parse(
        &self,
        log: &mut EvaluationLog,
        input: RdfInput,
        mime_type: Option<&str>,
        source: &str,
    ) -> Graph {
        self.parse_with_base(log, input, mime_type, source, None).await
    }

    /// Same as [`parse`](Self::parse), resolving relative IRIs against `base_iri`
    pub async fn parse_with_base(
        &self,
        log: &mut EvaluationLog,
        input: RdfInput,
        mime_type: Option<&str>,
        source: &str,
        base_iri: Option<&str>,
    ) -> Graph {
        let declared = mime_type.unwrap_or("unknown");

        let formats = match (&input, mime_type.and_then(SyntaxFormat::from_mime)) {
            (RdfInput::Json(_), _) => vec![SyntaxFormat::JsonLd],
            (RdfInput::Text(_), Some(format)) => vec![format],
            (RdfInput::Text(_), None) => SyntaxFormat::FALLBACK_ORDER.to_vec(),
        };

        let mut failures = Vec::new();
        for format in formats {
            let outcome = match (&input, format) {
                (RdfInput::Json(value), _) => self.parse_json(log, value.clone(), base_iri).await,
                (RdfInput::Text(text), SyntaxFormat::JsonLd) => {
                    match serde_json::from_str::<Value>(text) {
                        Ok(value) => self.parse_json(log, value, base_iri).await,
                        Err(e) => ParseOutcome::Failed(e.to_string()),
                    }
                }
                (RdfInput::Text(text), format) => parse_text(text, format, base_iri),
            };

            match outcome {
                ParseOutcome::Parsed(mut graph) => {
                    strip_noise(&mut graph);
                    log.info(format!(
                        "Successfully parsed {declared} RDF from {source} with parser {}, containing {} triples",
                        format.name(),
                        graph.len()
                    ));
                    return graph;
                }
                ParseOutcome::Failed(reason) => {
                    log.info(format!(
                        "Could not parse {declared} metadata from {source} with parser {}. Getting error: {reason}",
                        format.name()
                    ));
                    failures.push(format.name());
                }
            }
        }

        tracing::debug!(source = %source, tried = ?failures, "No RDF parser succeeded");
        Graph::new()
    }

    async fn parse_json(
        &self,
        log: &mut EvaluationLog,
        value: Value,
        base_iri: Option<&str>,
    ) -> ParseOutcome {
        let mut document = normalize_to_array(value);
        rewrite_schema_org_contexts(&mut document);

        let (contexts, failures) = self.contexts.documents_for(&document).await;
        for failure in failures {
            log.warn(format!("Could not retrieve JSON-LD context {failure}"));
        }

        let bytes = match serde_json::to_vec(&document) {
            Ok(bytes) => bytes,
            Err(e) => return ParseOutcome::Failed(e.to_string()),
        };

        let mut parser = JsonLdParser::new();
        if let Some(base) = base_iri {
            parser = match parser.with_base_iri(base) {
                Ok(parser) => parser,
                Err(e) => return ParseOutcome::Failed(format!("invalid base IRI {base}: {e}")),
            };
        }

        let mut graph = Graph::new();
        for quad in parser
            .for_slice(&bytes)
            .with_load_document_callback(contexts.into_loader())
        {
            match quad {
                Ok(quad) => {
                    if let Some(triple) = convert_quad(quad) {
                        graph.insert(triple);
                    }
                }
                Err(e) => return ParseOutcome::Failed(e.to_string()),
            }
        }
        ParseOutcome::Parsed(graph)
    }
}

fn parse_text(text: &str, format: SyntaxFormat, base_iri: Option<&str>) -> ParseOutcome {
    let Some(rdf_format) = format.rdf_format() else {
        return ParseOutcome::Failed(format!("{} is not a text syntax", format.name()));
    };

    let mut parser = RdfParser::from_format(rdf_format);
    if let Some(base) = base_iri {
        parser = match parser.with_base_iri(base) {
            Ok(parser) => parser,
            Err(e) => return ParseOutcome::Failed(format!("invalid base IRI {base}: {e}")),
        };
    }

    let mut graph = Graph::new();
    for quad in parser.for_slice(text.as_bytes()) {
        match quad {
            Ok(quad) => {
                if let Some(triple) = convert_quad(quad) {
                    graph.insert(triple);
                }
            }
            Err(e) => return ParseOutcome::Failed(e.to_string()),
        }
    }
    ParseOutcome::Parsed(graph)
}

/// Objects become one-element arrays, arrays pass through
pub fn normalize_to_array(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        other => Value::Array(vec![other]),
    }
}

/// Pin every schema.org `@context` string to [`SCHEMA_ORG_CONTEXT`]
pub fn rewrite_schema_org_contexts(document: &mut Value) {
    let Value::Array(entries) = document else {
        return;
    };
    for entry in entries {
        if let Some(context) = entry.get_mut("@context") {
            rewrite_context(context);
        }
    }
}

fn rewrite_context(context: &mut Value) {
    match context {
        Value::String(url)
            if url.starts_with("http://schema.org") || url.starts_with("https://schema.org") =>
        {
            *url = SCHEMA_ORG_CONTEXT.to_string();
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_context),
        _ => {}
    }
}

fn strip_noise(graph: &mut Graph) {
    for predicate in NOISE_PREDICATES {
        graph.remove_matching(None, Some(&Term::iri(*predicate)), None);
    }
}

fn convert_quad(quad: oxrdf::Quad) -> Option<Triple> {
    let subject = convert_term(oxrdf::Term::from(quad.subject))?;
    let predicate = Term::Iri(quad.predicate.into_string());
    let object = convert_term(quad.object)?;
    Some(Triple::new(subject, predicate, object))
}

fn convert_term(term: oxrdf::Term) -> Option<Term> {
    match term {
        oxrdf::Term::NamedNode(node) => Some(Term::Iri(node.into_string())),
        oxrdf::Term::BlankNode(node) => Some(Term::BlankNode(node.into_string())),
        oxrdf::Term::Literal(literal) => {
            let datatype = literal.datatype().as_str();
            let datatype = (datatype != XSD_STRING && datatype != RDF_LANG_STRING)
                .then(|| datatype.to_string());
            Some(Term::Literal {
                value: literal.value().to_string(),
                datatype,
                language: literal.language().map(str::to_string),
            })
        }
        // Quoted triples are not queried by any metric
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
