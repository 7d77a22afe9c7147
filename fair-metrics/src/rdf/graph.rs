//! In-memory triple graph queried by the metric tests

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// RDF term
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Term {
    Iri(String),
    #[serde(rename = "bnode")]
    BlankNode(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    /// Plain literal without datatype or language tag
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Lexical value: IRI string, blank node id or literal value
    pub fn as_str(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::BlankNode(id) => id,
            Term::Literal { value, .. } => value,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Does this term carry `value`, whatever its kind
    pub fn has_value(&self, value: &str) -> bool {
        self.as_str() == value
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// Set of triples; insertion order is not preserved, duplicates collapse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the triple was not already present
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching the given terms, `None` is a wildcard
    pub fn pattern<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| {
            subject.map_or(true, |s| &t.subject == s)
                && predicate.map_or(true, |p| &t.predicate == p)
                && object.map_or(true, |o| &t.object == o)
        })
    }

    /// Remove every triple matching the pattern, returns how many were removed
    pub fn remove_matching(
        &mut self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> usize {
        let before = self.triples.len();
        self.triples.retain(|t| {
            !(subject.map_or(true, |s| &t.subject == s)
                && predicate.map_or(true, |p| &t.predicate == p)
                && object.map_or(true, |o| &t.object == o))
        });
        before - self.triples.len()
    }

    /// Vocabulary namespaces used by predicates and `rdf:type` objects
    ///
    /// A namespace is the IRI up to and including its last `#` or `/`.
    pub fn namespaces(&self) -> BTreeSet<String> {
        let rdf_type = Term::iri(RDF_TYPE);
        let mut namespaces = BTreeSet::new();
        for triple in &self.triples {
            if let Some(ns) = namespace_of(triple.predicate.as_str()) {
                namespaces.insert(ns.to_string());
            }
            if triple.predicate == rdf_type && triple.object.is_iri() {
                if let Some(ns) = namespace_of(triple.object.as_str()) {
                    namespaces.insert(ns.to_string());
                }
            }
        }
        namespaces
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

fn namespace_of(iri: &str) -> Option<&str> {
    let cut = iri.rfind(['#', '/'])?;
    // Skip the scheme separator of IRIs without a path
    if iri[..=cut].ends_with("://") {
        return None;
    }
    Some(&iri[..=cut])
}
