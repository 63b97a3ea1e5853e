use sitechunk::handlers::*;
use sitechunk_core::chunker::ChunkerConfig;
use sitechunk_core::corpus::{CORPUS_FILE_NAME, read_corpus};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn run_settings(output_dir: &Path) -> RunSettings {
    RunSettings {
        output_dir: output_dir.to_path_buf(),
        chunker: ChunkerConfig::default(),
        max_tags: 5,
        known_corpus: None,
        quiet: true,
    }
}

// ============================================================================
// Argument Helper Tests
// ============================================================================

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("https://example.com".to_string()));

    let result = parse_url_line("localhost:8080/docs");
    assert_eq!(result, Some("https://localhost:8080/docs".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    assert_eq!(parse_url_line("not a valid url!!!"), None);
    assert_eq!(parse_url_line("   "), None);
}

#[test]
fn test_extract_url_path() {
    assert_eq!(
        extract_url_path("https://example.com/docs/rules"),
        "/docs/rules"
    );
    assert_eq!(extract_url_path("https://example.com/"), "/");
    assert_eq!(extract_url_path("https://example.com"), "/");
}

#[test]
fn test_default_allowed_domains_uses_seed_host() {
    let seed = Url::parse("https://docs.example.com/start").unwrap();
    assert_eq!(default_allowed_domains(&seed), vec!["docs.example.com"]);
}

#[test]
fn test_default_allowed_domains_strips_www() {
    let seed = Url::parse("https://WWW.Example.com/").unwrap();
    assert_eq!(default_allowed_domains(&seed), vec!["example.com"]);
}

#[test]
fn test_resolve_output_dir_expands_tilde() {
    let dir = resolve_output_dir("~/corpus");
    assert!(!dir.to_string_lossy().starts_with('~'));
    assert!(dir.ends_with("corpus"));

    assert_eq!(resolve_output_dir("./out"), Path::new("./out"));
}

// ============================================================================
// Known Corpus Tests
// ============================================================================

#[tokio::test]
async fn test_load_known_corpus_none_is_empty() {
    let state = load_known_corpus(None).await.unwrap();
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_load_known_corpus_missing_file_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_known_corpus(Some(&tmp.path().join("nope.json")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("known corpus"));
}

// ============================================================================
// Ingest Tests
// ============================================================================

#[tokio::test]
async fn test_run_ingest_writes_corpus() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(
        input.path().join("guide.html"),
        "<html><head><title>Guide</title></head><body><p>Recycling is collected on Thursdays.</p></body></html>",
    )
    .unwrap();

    let settings = IngestSettings {
        root: input.path().to_path_buf(),
        extensions: Vec::new(),
        run: run_settings(output.path()),
    };

    let result = run_ingest(&settings, &CancellationToken::new()).await.unwrap();
    assert_eq!(result.records.len(), 1);

    let written = read_corpus(&output.path().join(CORPUS_FILE_NAME)).await.unwrap();
    assert_eq!(written, result.records);
    assert_eq!(written[0].page_title, "Guide");
    assert_eq!(written[0].page_name, "guide");
}

#[tokio::test]
async fn test_run_ingest_with_known_corpus_emits_nothing_new() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("notes.txt"), "Visitors must sign in at reception.").unwrap();

    let first = IngestSettings {
        root: input.path().to_path_buf(),
        extensions: Vec::new(),
        run: run_settings(&output.path().join("first")),
    };
    run_ingest(&first, &CancellationToken::new()).await.unwrap();

    let mut second = first.clone();
    second.run.output_dir = output.path().join("second");
    second.run.known_corpus = Some(output.path().join("first").join(CORPUS_FILE_NAME));

    let result = run_ingest(&second, &CancellationToken::new()).await.unwrap();
    assert!(result.records.is_empty());
    assert_eq!(result.stats.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_run_ingest_missing_root_fails() {
    let output = tempfile::tempdir().unwrap();
    let settings = IngestSettings {
        root: output.path().join("missing"),
        extensions: Vec::new(),
        run: run_settings(output.path()),
    };

    assert!(run_ingest(&settings, &CancellationToken::new()).await.is_err());
}

// ============================================================================
// Crawl Tests
// ============================================================================

#[tokio::test]
async fn test_run_crawl_saves_pages_and_corpus() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(
                    r#"<html><head><title>Home</title></head><body>
                        <p>Welcome to the residents association website.</p>
                        <a href="/rules">Rules</a>
                        <a href="https://elsewhere.example.org/">Elsewhere</a>
                    </body></html>"#
                        .as_bytes(),
                ),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rules"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(b"<html><body><p>No ball games in the courtyard.</p></body></html>".as_slice()),
        )
        .mount(&mock_server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let seed = Url::parse(&mock_server.uri()).unwrap();
    let settings = CrawlSettings {
        allowed_domains: default_allowed_domains(&seed),
        seed,
        max_pages: Some(10),
        workers: 2,
        timeout: Duration::from_secs(5),
        save_pages: true,
        run: run_settings(output.path()),
    };

    let result = run_crawl(&settings, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.stats.documents, 2);
    assert_eq!(result.records.len(), 2);
    assert!(output.path().join(PAGES_DIR).join("index.html").exists());
    assert!(output.path().join(PAGES_DIR).join("rules.html").exists());
    assert!(output.path().join(CORPUS_FILE_NAME).exists());
}

#[tokio::test]
async fn test_run_crawl_respects_max_pages() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(
                    br#"<p>The front page of the test site.</p><a href="/a">a</a><a href="/b">b</a>"#
                        .as_slice(),
                ),
        )
        .mount(&mock_server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let seed = Url::parse(&mock_server.uri()).unwrap();
    let settings = CrawlSettings {
        allowed_domains: default_allowed_domains(&seed),
        seed,
        max_pages: Some(1),
        workers: 1,
        timeout: Duration::from_secs(5),
        save_pages: false,
        run: run_settings(output.path()),
    };

    let result = run_crawl(&settings, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.stats.documents, 1);
    assert!(!output.path().join(PAGES_DIR).exists());
}
