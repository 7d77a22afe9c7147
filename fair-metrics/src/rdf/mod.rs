//! RDF model and parsing

pub mod graph;
pub mod jsonld;
pub mod parser;

pub use graph::{Graph, Term, Triple};
pub use jsonld::JsonLdContextLoader;
pub use parser::{MetadataParser, RdfInput, SyntaxFormat};
