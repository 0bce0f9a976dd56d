use assert_matches::assert_matches;
use neurodoc_core::BackendError;
use neurodoc_core::ClientConfig;
use neurodoc_core::HttpBackend;
use neurodoc_core::MemoryPreferenceStore;
use neurodoc_core::SearchBackend;
use neurodoc_core::SearchSession;
use neurodoc_core::SessionInit;
use neurodoc_core::UploadFile;
use neurodoc_core::i18n::bundle;
use neurodoc_protocol::FilterSpec;
use neurodoc_protocol::Locale;
use neurodoc_protocol::SearchRequest;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        reveal_interval_ms: 1,
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn search_sends_query_and_language() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/api_search"))
        .and(query_param("q", "cats"))
        .and(query_param("lang", "pl"))
        .and(query_param("sort", "date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "title": "Cat care", "meta": "2021", "snippet": "...", "href": "/doc/1" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server))?;
    let filters: FilterSpec = serde_json::from_value(json!({ "sort": "date" }))?;
    let request = SearchRequest::new("cats", Locale::Pl).with_filters(Some(filters));
    let results = backend.search(&request).await?.into_results();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title(), Some("Cat care"));
    assert_eq!(results[0].href(), Some("/doc/1"));
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_an_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/api_search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server))?;
    let err = backend
        .search(&SearchRequest::new("cats", Locale::En))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        BackendError::Status { endpoint: "search", status: 500, ref body } if body == "boom"
    );
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/api_search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server))?;
    let err = backend
        .search(&SearchRequest::new("cats", Locale::En))
        .await
        .unwrap_err();

    assert_matches!(err, BackendError::Decode(_));
    Ok(())
}

#[tokio::test]
async fn upload_posts_multipart_file_field() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server))?;
    backend
        .upload(UploadFile::new("doc.txt", b"hello upload".to_vec()))
        .await?;

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="file"; filename="doc.txt""#), "{body}");
    assert!(body.contains("hello upload"));
    assert!(body.contains("text/plain"));
    Ok(())
}

#[tokio::test]
async fn session_reveals_placeholder_from_live_server() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/api_search"))
        .and(query_param("q", "zzqx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/api_search"))
        .and(query_param("q", "cats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "results": [{ "title": "c" }] })),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let backend = Arc::new(HttpBackend::new(&config)?);
    let mut session = SearchSession::new(SessionInit {
        config,
        backend,
        preferences: Box::new(MemoryPreferenceStore::default()),
        history_file: None,
        environment_locale: "en-GB".to_string(),
    });

    session.search("  zzqx  ")?;
    session.settle().await;
    assert_eq!(session.displayed(), bundle(Locale::En).no_results);
    assert!(session.history().is_empty());

    session.search("cats")?;
    session.settle().await;
    assert_eq!(session.results().len(), 1);
    assert_eq!(session.history().front(), Some("cats"));
    Ok(())
}
