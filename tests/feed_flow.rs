//! End-to-end feed requests against a mocked upstream API.

use axum::http::StatusCode;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::collections::HashMap;
use tweetfeed::{ApiConfig, Credentials, FeedBody, FeedService, HandlerConfig};

const SEARCH_PATH: &str = "/1.1/search/tweets.json";

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn tweets(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id_str": format!("{}-{}", prefix, i), "text": format!("{} tweet {}", prefix, i)}))
        .collect()
}

fn service(server: &ServerGuard) -> FeedService {
    let api = ApiConfig::new(&server.url()).expect("mock server url");
    FeedService::new(api, Credentials::new("key", "secret")).expect("http client")
}

async fn mock_token(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/oauth2/token")
        .match_header("authorization", "Basic a2V5OnNlY3JldA==")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token_type":"bearer","access_token":"TOKEN"}"#)
        .expect(hits)
        .create_async()
        .await
}

/// `q` as it arrives after the client's own form encoding is undone.
async fn mock_search(server: &mut ServerGuard, q: &str, statuses: &[Value], hits: usize) -> Mock {
    server
        .mock("GET", SEARCH_PATH)
        .match_header("authorization", "Bearer TOKEN")
        .match_query(Matcher::UrlEncoded("q".into(), q.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"statuses": statuses, "search_metadata": {"count": 15}}).to_string())
        .expect(hits)
        .create_async()
        .await
}

fn data(body: &FeedBody) -> &[Value] {
    match body {
        FeedBody::Data { data } => data,
        FeedBody::Error { error } => panic!("expected data, got error {}", error),
    }
}

#[tokio::test]
async fn missing_title_is_rejected_without_upstream_calls() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 0).await;
    let search = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let service = service(&server);
    let resp = service
        .respond(&params(&[("a", "Ada Lovelace")]), &HandlerConfig::multi_field())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body, FeedBody::Error { error: json!("Invalid Parameters.") });

    let resp = service.respond(&params(&[("q", "")]), &HandlerConfig::freeform()).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    token.assert_async().await;
    search.assert_async().await;
}

#[tokio::test]
async fn enough_title_results_skip_fallbacks() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let title = mock_search(&mut server, "Deep%20Learning", &tweets("title", 10), 1).await;
    let author = mock_search(&mut server, "%22Yann%20LeCun%22", &tweets("author", 2), 0).await;
    let journal = mock_search(&mut server, "%22Nature%22", &tweets("journal", 2), 0).await;

    let resp = service(&server)
        .respond(
            &params(&[("t", "Deep Learning"), ("a", "Yann LeCun"), ("j", "Nature")]),
            &HandlerConfig::multi_field(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(data(&resp.body).len(), 10);
    token.assert_async().await;
    title.assert_async().await;
    author.assert_async().await;
    journal.assert_async().await;
}

#[tokio::test]
async fn threshold_is_checked_after_each_append() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let title = mock_search(&mut server, "Deep%20Learning", &tweets("title", 3), 1).await;
    let author = mock_search(&mut server, "%22Yann%20LeCun%22", &tweets("author", 8), 1).await;
    let journal = mock_search(&mut server, "%22Nature%22", &tweets("journal", 5), 0).await;

    let resp = service(&server)
        .respond(
            &params(&[("t", "Deep Learning"), ("a", "Yann LeCun"), ("j", "Nature")]),
            &HandlerConfig::multi_field(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(data(&resp.body).len(), 11);
    title.assert_async().await;
    author.assert_async().await;
    journal.assert_async().await;
}

#[tokio::test]
async fn results_are_concatenated_in_call_order_without_dedup() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;

    let shared = json!({"id_str": "shared", "text": "matches everything"});
    let title_hits = vec![shared.clone(), tweets("title", 1)[0].clone()];
    let author_hits = vec![tweets("author", 1)[0].clone(), shared.clone()];
    let journal_hits = tweets("journal", 2);

    let _title = mock_search(&mut server, "Deep%20Learning", &title_hits, 1).await;
    let _author = mock_search(&mut server, "%22Yann%20LeCun%22", &author_hits, 1).await;
    let _journal = mock_search(&mut server, "%22Nature%22", &journal_hits, 1).await;

    let resp = service(&server)
        .respond(
            &params(&[("t", "Deep Learning"), ("a", "Yann LeCun"), ("j", "Nature")]),
            &HandlerConfig::multi_field(),
        )
        .await;

    let expected: Vec<Value> = title_hits
        .into_iter()
        .chain(author_hits)
        .chain(journal_hits)
        .collect();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(data(&resp.body), expected.as_slice());
}

#[tokio::test]
async fn absent_author_and_journal_skip_their_searches() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let title = mock_search(&mut server, "Deep%20Learning", &tweets("title", 2), 1).await;
    let other = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::UrlEncoded("q".into(), "%22undefined%22".into()))
        .expect(0)
        .create_async()
        .await;

    let resp = service(&server)
        .respond(&params(&[("t", "Deep Learning")]), &HandlerConfig::multi_field())
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(data(&resp.body).len(), 2);
    title.assert_async().await;
    other.assert_async().await;
}

#[tokio::test]
async fn lower_threshold_changes_gating() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _search = mock_search(&mut server, "Deep%20Learning", &tweets("title", 3), 1).await;
    let author = mock_search(&mut server, "%22Yann%20LeCun%22", &tweets("author", 1), 0).await;

    let config = HandlerConfig::multi_field().with_fallback_threshold(3);
    let resp = service(&server)
        .respond(&params(&[("t", "Deep Learning"), ("a", "Yann LeCun")]), &config)
        .await;

    assert_eq!(data(&resp.body).len(), 3);
    author.assert_async().await;
}

#[tokio::test]
async fn multi_field_token_failure_surfaces_upstream_body() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("POST", "/oauth2/token")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors":[{"code":99,"message":"Unable to verify your credentials","label":"authenticity_token_error"}]}"#)
        .create_async()
        .await;
    let search = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let resp = service(&server)
        .respond(&params(&[("t", "Deep Learning")]), &HandlerConfig::multi_field())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    match &resp.body {
        FeedBody::Error { error } => assert_eq!(error["errors"][0]["code"], 99),
        other => panic!("expected error body, got {:?}", other),
    }
    search.assert_async().await;
}

#[tokio::test]
async fn multi_field_fallback_failure_aborts() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _search = mock_search(&mut server, "Deep%20Learning", &tweets("title", 1), 1).await;
    let _upstream = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::UrlEncoded("q".into(), "%22Yann%20LeCun%22".into()))
        .with_status(429)
        .with_body(r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#)
        .create_async()
        .await;

    let resp = service(&server)
        .respond(
            &params(&[("t", "Deep Learning"), ("a", "Yann LeCun")]),
            &HandlerConfig::multi_field(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body,
        FeedBody::Error {
            error: json!({"errors": [{"code": 88, "message": "Rate limit exceeded"}]})
        }
    );
}

#[tokio::test]
async fn empty_upstream_error_body_reports_status() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("POST", "/oauth2/token")
        .with_status(500)
        .create_async()
        .await;

    let resp = service(&server)
        .respond(&params(&[("t", "x")]), &HandlerConfig::multi_field())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body,
        FeedBody::Error {
            error: json!("Request failed with status code 500")
        }
    );
}

#[tokio::test]
async fn malformed_search_body_aborts_multi_field() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _upstream = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"search_metadata":{}}"#)
        .create_async()
        .await;

    let resp = service(&server)
        .respond(&params(&[("t", "Deep Learning")]), &HandlerConfig::multi_field())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    match &resp.body {
        FeedBody::Error { error } => {
            let message = error.as_str().unwrap_or_default();
            assert!(message.starts_with("Parse error"), "unexpected error {}", message);
        }
        other => panic!("expected error body, got {:?}", other),
    }
}

#[tokio::test]
async fn freeform_sends_raw_query() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let statuses = tweets("free", 4);
    let search = mock_search(&mut server, "\"deep learning\" OR #ml", &statuses, 1).await;

    let resp = service(&server)
        .respond(&params(&[("q", "\"deep learning\" OR #ml")]), &HandlerConfig::freeform())
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(data(&resp.body), statuses.as_slice());
    search.assert_async().await;
}

#[tokio::test]
async fn freeform_search_failure_degrades_to_empty() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _upstream = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Internal Error")
        .create_async()
        .await;

    let resp = service(&server)
        .respond(&params(&[("q", "rust")]), &HandlerConfig::freeform())
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, FeedBody::Data { data: Vec::new() });
}

#[tokio::test]
async fn freeform_token_failure_degrades_without_searching() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("POST", "/oauth2/token")
        .with_status(503)
        .with_body("Service Unavailable")
        .create_async()
        .await;
    let search = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let resp = service(&server)
        .respond(&params(&[("q", "rust")]), &HandlerConfig::freeform())
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, FeedBody::Data { data: Vec::new() });
    search.assert_async().await;
}

#[tokio::test]
async fn transport_error_message_is_reported() {
    // Nothing listens on the discard port.
    let api = ApiConfig::new("http://127.0.0.1:9").expect("valid url");
    let service = FeedService::new(api, Credentials::new("key", "secret")).expect("http client");

    let resp = service
        .respond(&params(&[("t", "Deep Learning")]), &HandlerConfig::multi_field())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    match &resp.body {
        FeedBody::Error { error } => assert!(error.is_string()),
        other => panic!("expected error body, got {:?}", other),
    }
}
