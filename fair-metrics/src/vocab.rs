//! IRIs the metric tests and the session look up

pub const DCTERMS_IDENTIFIER: &str = "https://purl.org/dc/terms/identifier";
pub const DC_IDENTIFIER: &str = "https://purl.org/dc/elements/1.1/identifier";
pub const SCHEMA_IDENTIFIER: &str = "https://schema.org/identifier";
pub const SCHEMA_SAME_AS: &str = "https://schema.org/sameAs";
pub const OGP_URL: &str = "http://ogp.me/ns#url";

/// Predicates whose object may carry the subject identifier
pub const IDENTIFIER_PREDICATES: &[&str] = &[
    DCTERMS_IDENTIFIER,
    DC_IDENTIFIER,
    SCHEMA_IDENTIFIER,
    SCHEMA_SAME_AS,
    OGP_URL,
];

/// Predicates linking metadata to the data it describes
pub const DATA_PREDICATES: &[&str] = &[
    "https://www.w3.org/ns/ldp#contains",
    "https://xmlns.com/foaf/0.1/primaryTopic",
    "https://schema.org/about",
    "https://schema.org/mainEntity",
    "https://schema.org/codeRepository",
    "https://schema.org/distribution",
    "https://www.w3.org/ns/dcat#distribution",
    "https://semanticscience.org/resource/SIO_000332",
    "https://semanticscience.org/resource/is-about",
    "https://purl.obolibrary.org/obo/IAO_0000136",
];

/// Download locations of a distribution node
pub const CONTENT_PREDICATES: &[&str] = &[
    "https://schema.org/url",
    "https://schema.org/contentUrl",
    "https://www.w3.org/ns/dcat#downloadURL",
];

pub const TITLE_PREDICATES: &[&str] = &[
    "http://purl.org/dc/elements/1.1/title",
    "http://purl.org/dc/terms/title",
    "http://www.w3.org/2000/01/rdf-schema#label",
    "http://schema.org/name",
];

pub const DESCRIPTION_PREDICATES: &[&str] = &[
    "http://purl.org/dc/terms/description",
    "http://schema.org/description",
];

pub const DATE_CREATED_PREDICATES: &[&str] = &[
    "http://purl.org/dc/terms/created",
    "http://schema.org/dateCreated",
    "http://schema.org/datePublished",
];

pub const LICENSE_PREDICATES: &[&str] = &[
    "http://purl.org/dc/terms/license",
    "http://schema.org/license",
];

pub const ACCESS_RIGHTS_PREDICATES: &[&str] = &["http://purl.org/dc/terms/accessRights"];

// Result document
pub const METRIC_EVALUATION_RESULT: &str = "http://fairmetrics.org/resources/metric_evaluation_result";
pub const OBO_DATE: &str = "http://purl.obolibrary.org/obo/date";
pub const SCHEMA_SOFTWARE_VERSION: &str = "http://schema.org/softwareVersion";
pub const SCHEMA_COMMENT: &str = "http://schema.org/comment";
pub const SIO_IS_ABOUT: &str = "http://semanticscience.org/resource/SIO_000332";
pub const SIO_HAS_VALUE: &str = "http://semanticscience.org/resource/SIO_000300";
pub const SIO_METADATA: &str = "http://semanticscience.org/resource/metadata";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
