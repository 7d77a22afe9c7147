//! Metadata resolution against a local fixture server
//!
//! Every route below stands in for one kind of real-world landing page.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fair_common::Settings;
use fair_metrics::evaluation::Evaluation;
use fair_metrics::harvest::{Metadata, MetadataHarvester, RetrieveOptions};
use fair_metrics::metrics::{run_metric, EvaluationContext, MetricRegistry};
use fair_metrics::rdf::Graph;
use serde_json::{json, Value};

const TURTLE: &str = r#"<> <http://schema.org/name> "Fixture dataset" ;
    <http://purl.org/dc/terms/license> <https://opensource.org/licenses/MIT> ."#;

const PLAIN_PAGE: &str = "<html><head><title>Landing</title></head><body><p>Nothing here</p></body></html>";

const EMBEDDED_PAGE: &str = r#"<html><head>
<script type="application/ld+json">
{"@context": {"@vocab": "http://schema.org/"}, "@type": "Dataset", "name": "Embedded dataset", "description": "From a script tag"}
</script>
</head><body></body></html>"#;

const RDFA_PAGE: &str = r#"<html><body vocab="http://schema.org/">
<div typeof="Dataset" resource="https://example.org/rdfa-ds">
  <span property="name">RDFa dataset</span>
  <span property="description">Only RDFa here</span>
</div>
</body></html>"#;

const MICRODATA_PAGE: &str = r#"<html><body>
<div itemscope itemtype="https://schema.org/Dataset" itemid="https://example.org/microdata-ds">
  <h1 itemprop="name">Microdata dataset</h1>
  <meta itemprop="keywords" content="ocean">
</div>
</body></html>"#;

const DUBLIN_CORE_PAGE: &str = r#"<html><head>
<meta name="DC.title" content="Dublin Core dataset">
<meta name="DC.creator" content="Ada">
</head><body></body></html>"#;

/// JSON-LD without a context expands to nothing, RDFa must be used instead
const CONTEXTLESS_JSON_LD_AND_RDFA_PAGE: &str = r#"<html><head>
<script type="application/ld+json">{"name": "Not linked data"}</script>
</head><body vocab="http://schema.org/">
<div typeof="Dataset" resource="https://example.org/rdfa-ds">
  <span property="name">RDFa dataset</span>
</div>
</body></html>"#;

const CONTEXTLESS_JSON_LD_PAGE: &str = r#"<html><head>
<script type="application/ld+json">{"name": "Not linked data"}</script>
</head><body></body></html>"#;

const DESCRIBED_DATA_TTL: &str = r#"<> <http://schema.org/name> "Described data" ;
    <http://schema.org/about> </turtle> ."#;

const JSON_DATA_TTL: &str = r#"<> <http://schema.org/name> "JSON data" ;
    <http://schema.org/about> </data.json> ."#;

const YAML_METADATA: &str = "name: Fixture dataset\nkeywords:\n  - ocean\n  - salinity\n";

const ELSEVIER_HUB: &str = "http://linkinghub.elsevier.com/retrieve/pii/S0001";

fn html(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

fn accepts(headers: &HeaderMap, mime: &str) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(mime))
}

async fn conneg_turtle(headers: HeaderMap) -> Response {
    if accepts(&headers, "text/turtle") {
        ([(header::CONTENT_TYPE, "text/turtle; charset=utf-8")], TURTLE).into_response()
    } else {
        html(PLAIN_PAGE)
    }
}

async fn conneg_json_ld(headers: HeaderMap) -> Response {
    if accepts(&headers, "application/ld+json") && !accepts(&headers, "text/turtle") {
        Json(json!({
            "@context": {"name": "http://schema.org/name"},
            "@id": "",
            "name": "JSON-LD dataset"
        }))
        .into_response()
    } else {
        html(PLAIN_PAGE)
    }
}

async fn signposted() -> Response {
    (
        [
            (header::LINK, r#"</meta.ttl>; rel="describedby"; type="text/turtle""#),
            (header::CONTENT_TYPE, "text/html"),
        ],
        PLAIN_PAGE,
    )
        .into_response()
}

async fn self_loop() -> Response {
    (
        [
            (header::LINK, r#"</loop>; rel="describedby", </loop>; rel="alternate""#),
            (header::CONTENT_TYPE, "text/html"),
        ],
        PLAIN_PAGE,
    )
        .into_response()
}

async fn meta_ttl() -> Response {
    turtle(TURTLE)
}

fn turtle(body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, "text/turtle")], body).into_response()
}

async fn signposted_redirect() -> Response {
    (
        [
            (header::LINK, r#"</redirect>; rel="describedby""#),
            (header::CONTENT_TYPE, "text/html"),
        ],
        PLAIN_PAGE,
    )
        .into_response()
}

/// Answers with triples only for subjects mentioning "harvest"
async fn harvester(Json(body): Json<Value>) -> Response {
    let subject = body["subject"].as_str().unwrap_or_default().to_string();
    if subject.contains("harvest") {
        let turtle = format!("<{subject}> <http://schema.org/name> \"Harvested\" .");
        ([(header::CONTENT_TYPE, "text/turtle")], turtle).into_response()
    } else {
        ([(header::CONTENT_TYPE, "text/turtle")], String::new()).into_response()
    }
}

fn fixture_router() -> Router {
    Router::new()
        .route("/turtle", get(conneg_turtle))
        .route("/jsonld", get(conneg_json_ld))
        .route("/embedded", get(|| async { html(EMBEDDED_PAGE) }))
        .route("/signposted", get(signposted))
        .route("/meta.ttl", get(meta_ttl))
        .route("/loop", get(self_loop))
        .route("/redirect", get(|| async { Redirect::temporary("/turtle") }))
        .route("/empty", get(|| async { html(PLAIN_PAGE) }))
        .route("/harvest-only", get(|| async { StatusCode::NOT_FOUND }))
        .route("/harvester", post(harvester))
        .route("/rdfa", get(|| async { html(RDFA_PAGE) }))
        .route("/microdata", get(|| async { html(MICRODATA_PAGE) }))
        .route("/dublin-core", get(|| async { html(DUBLIN_CORE_PAGE) }))
        .route("/json-ld-then-rdfa", get(|| async { html(CONTEXTLESS_JSON_LD_AND_RDFA_PAGE) }))
        .route("/raw-json-ld", get(|| async { html(CONTEXTLESS_JSON_LD_PAGE) }))
        .route(
            "/garbage",
            get(|| async { html("\u{0}\u{1}%%%% \u{7f} not markup at all") }),
        )
        .route("/signposted-redirect", get(signposted_redirect))
        .route("/elsevier", get(|| async { Redirect::temporary(ELSEVIER_HUB) }))
        .route("/retrieve/pii/:pii", get(meta_ttl))
        .route("/described-data", get(|| async { turtle(DESCRIBED_DATA_TTL) }))
        .route("/json-data", get(|| async { turtle(JSON_DATA_TTL) }))
        .route("/data.json", get(|| async { Json(json!({"rows": [1, 2, 3]})) }))
        .route(
            "/yaml-meta",
            get(|| async { ([(header::CONTENT_TYPE, "application/yaml")], YAML_METADATA) }),
        )
}

/// Serve the fixture on an ephemeral port and return its base URL
async fn spawn_fixture() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fixture_router()).await.unwrap();
    });
    format!("http://{addr}")
}

fn fixture_settings(base: &str) -> Settings {
    Settings {
        harvester_url: format!("{base}/harvester"),
        http_timeout_secs: 5,
        harvester_timeout_secs: 5,
        ..Settings::default()
    }
}

async fn resolve(base: &str, path: &str, options: RetrieveOptions) -> (Evaluation, Metadata) {
    let settings = fixture_settings(base);
    let harvester = MetadataHarvester::new(&settings).unwrap();
    let subject = format!("{base}{path}");
    let mut eval = Evaluation::new(&subject, "f2-machine-readable-metadata", "0.1.0", &settings);
    let metadata = harvester.retrieve_metadata(&mut eval, &subject, options).await;
    (eval, metadata)
}

#[tokio::test]
async fn test_content_negotiation_turtle() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/turtle", RetrieveOptions::default()).await;

    let graph = metadata.graph().expect("turtle graph");
    assert_eq!(graph.len(), 2);
    assert!(eval.log().joined().contains("when asking for text/turtle"));
}

#[tokio::test]
async fn test_content_negotiation_json_ld_is_recorded() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/jsonld", RetrieveOptions::default()).await;

    assert_eq!(metadata.len(), 1);
    assert_eq!(eval.data()["json-ld"]["name"], "JSON-LD dataset");
}

#[tokio::test]
async fn test_embedded_json_ld() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/embedded", RetrieveOptions::default()).await;

    assert!(metadata.graph().is_some_and(|g| g.len() >= 3));
    assert_eq!(eval.data()["extruct"]["json-ld"][0]["name"], "Embedded dataset");
}

#[tokio::test]
async fn test_signposting_describedby_is_followed() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/signposted", RetrieveOptions::default()).await;

    assert_eq!(metadata.len(), 2);
    assert_eq!(eval.data()["signposting_links"]["describedby"]["url"], "/meta.ttl");
    assert!(eval
        .log()
        .joined()
        .contains(&format!("Following Signposting link rel=describedby to {base}/meta.ttl")));
}

#[tokio::test]
async fn test_signposting_self_loop_terminates() {
    let base = spawn_fixture().await;
    let (_, metadata) = resolve(&base, "/loop", RetrieveOptions::default()).await;
    assert!(metadata.is_empty());
}

#[tokio::test]
async fn test_redirect_grows_alias_set() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/redirect", RetrieveOptions::default()).await;

    let target = format!("{base}/turtle");
    assert_eq!(eval.data()["redirect_url"], Value::String(target.clone()));
    assert!(eval.alternative_uris().contains(&target));
    assert!(eval
        .alternative_uris()
        .contains(&target.replacen("http://", "https://", 1)));
    assert_eq!(metadata.len(), 2);
}

#[tokio::test]
async fn test_harvester_first_when_requested() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/harvest-only", RetrieveOptions::with_harvester()).await;

    assert_eq!(metadata.len(), 1);
    assert!(eval.log().lines()[1].contains("Using Harvester"));
}

#[tokio::test]
async fn test_harvester_as_last_resort() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/harvest-only", RetrieveOptions::default()).await;

    assert_eq!(metadata.len(), 1);
    assert!(eval
        .log()
        .joined()
        .contains("Nothing found with built-in metadata harvesting process"));
}

#[tokio::test]
async fn test_alias_set_stable_across_resolutions() {
    let base = spawn_fixture().await;
    let (first_eval, first) = resolve(&base, "/redirect", RetrieveOptions::default()).await;
    let (second_eval, second) = resolve(&base, "/redirect", RetrieveOptions::default()).await;

    assert_eq!(first.len(), second.len());
    assert_eq!(first_eval.alternative_uris(), second_eval.alternative_uris());
}

#[tokio::test]
async fn test_metric_units_against_fixture() {
    let base = spawn_fixture().await;
    let settings = fixture_settings(&base);
    let harvester = MetadataHarvester::new(&settings).unwrap();
    let client = harvester.client().clone();
    let ctx = EvaluationContext {
        harvester: &harvester,
        client: &client,
        settings: &settings,
    };
    let registry = MetricRegistry::builtin();
    let score = |eval: &Evaluation| eval.score();

    let f2 = registry.get("f2-machine-readable-metadata").unwrap();
    let found = run_metric(f2.as_ref(), &format!("{base}/turtle"), &ctx).await;
    assert_eq!(score(&found), 1);
    let empty = run_metric(f2.as_ref(), &format!("{base}/empty"), &ctx).await;
    assert_eq!(score(&empty), 0);

    let f3 = registry.get("f3-id-in-metadata").unwrap();
    let f3_eval = run_metric(f3.as_ref(), &format!("{base}/turtle"), &ctx).await;
    assert_eq!(score(&f3_eval), 1);
    assert_eq!(f3_eval.data()["title"], "Fixture dataset");

    let i1 = registry.get("i1-metadata-knowledge-representation").unwrap();
    let i1_eval = run_metric(i1.as_ref(), &format!("{base}/empty"), &ctx).await;
    assert_eq!(score(&i1_eval), 0);
}

fn has_literal(graph: &Graph, value: &str) -> bool {
    graph.iter().any(|t| t.object.as_str() == value)
}

#[tokio::test]
async fn test_embedded_rdfa_only() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/rdfa", RetrieveOptions::default()).await;

    let graph = metadata.graph().expect("RDFa graph");
    assert!(has_literal(graph, "RDFa dataset"));
    assert!(eval.log().joined().contains("Found RDFa RDF metadata embedded in the HTML"));
}

#[tokio::test]
async fn test_embedded_microdata_only() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/microdata", RetrieveOptions::default()).await;

    let graph = metadata.graph().expect("Microdata graph");
    assert!(has_literal(graph, "Microdata dataset"));
    assert!(eval.log().joined().contains("Found Microdata RDF metadata embedded in the HTML"));
    assert_eq!(eval.data()["extruct"]["microdata"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_embedded_dublin_core_only() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/dublin-core", RetrieveOptions::default()).await;

    let graph = metadata.graph().expect("Dublin Core graph");
    assert!(has_literal(graph, "Dublin Core dataset"));
    assert!(has_literal(graph, "Ada"));
    assert!(eval.log().joined().contains("Found Dublin Core RDF metadata embedded in the HTML"));
}

#[tokio::test]
async fn test_empty_json_ld_bucket_falls_through_to_rdfa() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/json-ld-then-rdfa", RetrieveOptions::default()).await;

    let graph = metadata.graph().expect("RDFa graph");
    assert!(has_literal(graph, "RDFa dataset"));
    assert!(!has_literal(graph, "Not linked data"));
    let log = eval.log().joined();
    assert!(log.contains("Found embedded metadata in the formats: json-ld, rdfa"));
    assert!(log.contains("Found RDFa RDF metadata embedded in the HTML"));
}

#[tokio::test]
async fn test_unusable_embedded_json_ld_is_returned_raw() {
    let base = spawn_fixture().await;
    let (_, metadata) = resolve(&base, "/raw-json-ld", RetrieveOptions::default()).await;

    assert!(metadata.graph().is_none());
    assert_eq!(metadata.len(), 1);
    match metadata {
        Metadata::Raw(raw) => assert_eq!(raw[0]["name"], "Not linked data"),
        Metadata::Graph(_) => unreachable!(),
    }
}

#[tokio::test]
async fn test_unparseable_html_yields_empty_metadata() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/garbage", RetrieveOptions::default()).await;

    assert!(metadata.is_empty());
    assert!(metadata.graph().is_none());
    assert!(eval.log().joined().contains("No structured data found embedded in the HTML"));
}

#[tokio::test]
async fn test_signposted_redirect_does_not_grow_alias_set() {
    let base = spawn_fixture().await;
    let (eval, metadata) = resolve(&base, "/signposted-redirect", RetrieveOptions::default()).await;

    assert_eq!(metadata.len(), 2);
    let target = format!("{base}/turtle");
    assert!(!eval.alternative_uris().contains(&target));
    assert_eq!(eval.alternative_uris().len(), 2);
}

#[tokio::test]
async fn test_elsevier_redirect_is_rewritten_into_alias() {
    let base = spawn_fixture().await;
    // Every http request, the linking hub included, is answered by the fixture
    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(&base).unwrap())
        .build()
        .unwrap();
    let settings = fixture_settings(&base);
    let harvester = MetadataHarvester::with_clients(client.clone(), client, settings.harvester_url.clone());
    let subject = format!("{base}/elsevier");
    let mut eval = Evaluation::new(&subject, "f3-id-in-metadata", "0.1.0", &settings);

    let metadata = harvester
        .retrieve_metadata(&mut eval, &subject, RetrieveOptions::default())
        .await;

    let article = "https://www.sciencedirect.com/science/article/pii/S0001";
    assert_eq!(eval.data()["redirect_url"], article);
    assert!(eval.alternative_uris().contains(&article.to_string()));
    assert!(eval
        .alternative_uris()
        .contains(&"http://www.sciencedirect.com/science/article/pii/S0001".to_string()));
    assert!(!eval.alternative_uris().contains(&ELSEVIER_HUB.to_string()));
    assert_eq!(metadata.len(), 2);
}

#[tokio::test]
async fn test_knowledge_representation_units_against_fixture() {
    let base = spawn_fixture().await;
    let settings = fixture_settings(&base);
    let harvester = MetadataHarvester::new(&settings).unwrap();
    let client = harvester.client().clone();
    let ctx = EvaluationContext {
        harvester: &harvester,
        client: &client,
        settings: &settings,
    };
    let registry = MetricRegistry::builtin();
    let run = |path: &'static str, route: &'static str| {
        let metric = registry.get(path).unwrap();
        let subject = format!("{base}{route}");
        let ctx = &ctx;
        async move { run_metric(metric.as_ref(), &subject, ctx).await }
    };

    // Data linked from the metadata resolves to RDF
    let strong = run("i1-data-knowledge-representation", "/described-data").await;
    assert_eq!(strong.score(), 1);
    assert!(strong.log().joined().contains(&format!("Successfully retrieved RDF for the data URI: {base}/turtle")));

    // Data linked from the metadata is plain JSON
    let strong_json = run("i1-data-knowledge-representation", "/json-data").await;
    assert_eq!(strong_json.score(), 0);
    let weak_json = run("i1-data-knowledge-representation-weak", "/json-data").await;
    assert_eq!(weak_json.score(), 1);
    assert!(weak_json.log().joined().contains("Successfully found and parsed JSON data"));

    let no_data = run("i1-data-knowledge-representation", "/empty").await;
    assert_eq!(no_data.score(), 0);

    // Weak metadata accepts RDF, raw JSON from the pipeline and plain YAML
    let weak_rdf = run("i1-metadata-knowledge-representation-weak", "/turtle").await;
    assert_eq!(weak_rdf.score(), 1);
    let weak_raw = run("i1-metadata-knowledge-representation-weak", "/raw-json-ld").await;
    assert_eq!(weak_raw.score(), 1);
    assert!(weak_raw.log().joined().contains("Successfully found and parsed JSON metadata"));
    let weak_yaml = run("i1-metadata-knowledge-representation-weak", "/yaml-meta").await;
    assert_eq!(weak_yaml.score(), 1);
    assert!(weak_yaml.log().joined().contains("Successfully found and parsed YAML metadata"));
    let weak_none = run("i1-metadata-knowledge-representation-weak", "/empty").await;
    assert_eq!(weak_none.score(), 0);

    // The strong metadata unit rejects the YAML document
    let strong_yaml = run("i1-metadata-knowledge-representation", "/yaml-meta").await;
    assert_eq!(strong_yaml.score(), 0);
}
