//! RDFa attributes into expanded JSON-LD node objects
//!
//! Covers RDFa Lite (`vocab`, `prefix`, `typeof`, `property`, `resource`)
//! plus the core attributes most landing pages use (`about`, `rel`, `href`,
//! `src`, `content`, `datatype`, `lang`). Terms that expand to nothing are
//! dropped, as plain HTML `rel` keywords are without a vocabulary.

use super::dom::Element;
use reqwest::Url;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Prefixes available without a `prefix` declaration
const INITIAL_PREFIXES: &[(&str, &str)] = &[
    ("as", "https://www.w3.org/ns/activitystreams#"),
    ("cc", "http://creativecommons.org/ns#"),
    ("dc", "http://purl.org/dc/terms/"),
    ("dc11", "http://purl.org/dc/elements/1.1/"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("og", "http://ogp.me/ns#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("schema", "http://schema.org/"),
    ("sioc", "http://rdfs.org/sioc/ns#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("void", "http://rdfs.org/ns/void#"),
    ("xhv", "http://www.w3.org/1999/xhtml/vocab#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Object {
    Iri(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

#[derive(Clone)]
struct Context {
    subject: String,
    vocab: Option<String>,
    prefixes: HashMap<String, String>,
    language: Option<String>,
}

struct Extractor {
    base: Option<Url>,
    base_str: String,
    blank_counter: usize,
    /// subject → predicate → objects, in first-seen order
    nodes: BTreeMap<String, Vec<(String, Object)>>,
    order: Vec<String>,
}

/// Expanded JSON-LD node objects for every subject described in RDFa
pub fn extract(document: &Element, base_url: &str) -> Vec<Value> {
    let base = Url::parse(base_url).ok();
    let mut extractor = Extractor {
        base,
        base_str: base_url.to_string(),
        blank_counter: 0,
        nodes: BTreeMap::new(),
        order: Vec::new(),
    };

    let context = Context {
        subject: base_url.to_string(),
        vocab: None,
        prefixes: INITIAL_PREFIXES
            .iter()
            .map(|(p, iri)| (p.to_string(), iri.to_string()))
            .collect(),
        language: None,
    };

    extractor.walk(document, &context);
    extractor.into_json_ld()
}

impl Extractor {
    fn walk(&mut self, element: &Element, parent: &Context) {
        let mut context = parent.clone();

        if let Some(vocab) = element.attr("vocab") {
            let vocab = vocab.trim();
            context.vocab = (!vocab.is_empty()).then(|| vocab.to_string());
        }
        if let Some(prefix) = element.attr("prefix") {
            parse_prefixes(prefix, &mut context.prefixes);
        }
        if let Some(lang) = element.attr("lang").or_else(|| element.attr("xml:lang")) {
            let lang = lang.trim();
            context.language = (!lang.is_empty()).then(|| lang.to_string());
        }

        let about = element.attr("about").map(|a| self.resolve(a));
        let target = element
            .attr("resource")
            .or_else(|| element.attr("href"))
            .or_else(|| element.attr("src"))
            .map(|r| self.resolve(r));
        let property = element.attr("property");
        let rel = element.attr("rel");
        let types = element.attr("typeof");

        // Resource typed by `typeof`, object of `property` when both are set
        let typed_resource = match types {
            Some(_) => Some(
                about
                    .clone()
                    .or_else(|| target.clone())
                    .unwrap_or_else(|| self.fresh_blank_node()),
            ),
            None => None,
        };
        let subject = about.clone().unwrap_or_else(|| parent.subject.clone());

        if let (Some(types), Some(resource)) = (types, &typed_resource) {
            for class in types.split_whitespace() {
                if let Some(iri) = expand_term(class, &context) {
                    self.add(resource, RDF_TYPE, Object::Iri(iri));
                }
            }
        }

        if let Some(property) = property {
            let object = if let Some(content) = element.attr("content") {
                self.literal(content, element, &context)
            } else if let (Some(resource), None) = (&typed_resource, &about) {
                Object::Iri(resource.clone())
            } else if let (Some(target), None) = (&target, element.attr("datatype")) {
                Object::Iri(target.clone())
            } else if let Some(datetime) = element.attr("datetime") {
                self.literal(datetime, element, &context)
            } else {
                let text = element.normalized_text();
                self.literal(&text, element, &context)
            };

            for term in property.split_whitespace() {
                if let Some(predicate) = expand_term(term, &context) {
                    self.add(&subject, &predicate, object.clone());
                }
            }
        }

        if let (Some(rel), Some(target)) = (rel, &target) {
            for term in rel.split_whitespace() {
                if let Some(predicate) = expand_term(term, &context) {
                    self.add(&subject, &predicate, Object::Iri(target.clone()));
                }
            }
        }

        context.subject = match (&typed_resource, &about) {
            (Some(resource), _) => resource.clone(),
            (None, Some(about)) => about.clone(),
            (None, None) => parent.subject.clone(),
        };

        for child in element.child_elements() {
            self.walk(child, &context);
        }
    }

    fn literal(&self, value: &str, element: &Element, context: &Context) -> Object {
        let datatype = element
            .attr("datatype")
            .and_then(|d| expand_term(d.trim(), context))
            .filter(|d| !d.is_empty());
        let language = if datatype.is_none() {
            context.language.clone()
        } else {
            None
        };
        Object::Literal {
            value: value.to_string(),
            datatype,
            language,
        }
    }

    fn resolve(&self, reference: &str) -> String {
        let reference = reference.trim();
        if let Some(curie) = reference
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
        {
            return curie.to_string();
        }
        match self.base.as_ref().and_then(|b| b.join(reference).ok()) {
            Some(url) => url.to_string(),
            None if reference.is_empty() => self.base_str.clone(),
            None => reference.to_string(),
        }
    }

    fn fresh_blank_node(&mut self) -> String {
        self.blank_counter += 1;
        format!("_:rdfa{}", self.blank_counter)
    }

    fn add(&mut self, subject: &str, predicate: &str, object: Object) {
        let entries = self.nodes.entry(subject.to_string()).or_default();
        if entries.is_empty() {
            self.order.push(subject.to_string());
        }
        let triple = (predicate.to_string(), object);
        if !entries.contains(&triple) {
            entries.push(triple);
        }
    }

    fn into_json_ld(self) -> Vec<Value> {
        let mut nodes = self.nodes;
        self.order
            .into_iter()
            .filter_map(|subject| {
                let entries = nodes.remove(&subject)?;
                let mut node = Map::new();
                node.insert("@id".to_string(), Value::String(subject));
                for (predicate, object) in entries {
                    if predicate == RDF_TYPE {
                        if let Object::Iri(class) = object {
                            push_value(&mut node, "@type", Value::String(class));
                        }
                        continue;
                    }
                    push_value(&mut node, &predicate, object_to_json_ld(object));
                }
                Some(Value::Object(node))
            })
            .collect()
    }
}

fn push_value(node: &mut Map<String, Value>, key: &str, value: Value) {
    match node.get_mut(key) {
        Some(Value::Array(values)) => values.push(value),
        _ => {
            node.insert(key.to_string(), Value::Array(vec![value]));
        }
    }
}

fn object_to_json_ld(object: Object) -> Value {
    match object {
        Object::Iri(iri) => json!({"@id": iri}),
        Object::Literal {
            value,
            datatype,
            language,
        } => {
            let mut literal = Map::new();
            literal.insert("@value".to_string(), Value::String(value));
            if let Some(datatype) = datatype {
                literal.insert("@type".to_string(), Value::String(datatype));
            } else if let Some(language) = language {
                literal.insert("@language".to_string(), Value::String(language));
            }
            Value::Object(literal)
        }
    }
}

/// `prefix="p1: iri1 p2: iri2"`
fn parse_prefixes(declaration: &str, prefixes: &mut HashMap<String, String>) {
    let tokens: Vec<&str> = declaration.split_whitespace().collect();
    for pair in tokens.chunks(2) {
        if let [name, iri] = pair {
            if let Some(name) = name.strip_suffix(':') {
                prefixes.insert(name.to_ascii_lowercase(), iri.to_string());
            }
        }
    }
}

/// Expand a term, CURIE or absolute IRI
fn expand_term(term: &str, context: &Context) -> Option<String> {
    if term.contains("://") {
        return Some(term.to_string());
    }
    if let Some((prefix, local)) = term.split_once(':') {
        if prefix == "_" {
            return Some(term.to_string());
        }
        return context
            .prefixes
            .get(&prefix.to_ascii_lowercase())
            .map(|ns| format!("{ns}{local}"));
    }
    context.vocab.as_ref().map(|v| format!("{v}{term}"))
}
