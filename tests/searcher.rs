use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use gh_search::{
    new_repos_query, BoxError, Field, GitHubSearcher, HttpRequest, HttpResponse, Query,
    SearchError, Searcher, Transport,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, BoxError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<HttpResponse, BoxError>>) -> Self {
        ScriptedTransport {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        }
    }

    fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.query_pairs().into_owned().collect())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("more requests than scripted responses")
    }
}

fn json_response(status: StatusCode, body: Value) -> Result<HttpResponse, BoxError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    Ok(HttpResponse {
        status,
        headers,
        body: serde_json::to_vec(&body).unwrap(),
    })
}

fn page(total: u64, incomplete: bool, ids: std::ops::Range<u64>) -> Result<HttpResponse, BoxError> {
    let items: Vec<Value> = ids.map(|id| json!({ "id": id })).collect();
    json_response(
        StatusCode::OK,
        json!({ "total_count": total, "incomplete_results": incomplete, "items": items }),
    )
}

fn query(limit: u32) -> Query {
    let mut query = new_repos_query();
    query.keywords = vec!["cli".to_string()];
    query.limit = limit;
    query
}

fn ids(items: &[serde_json::Map<String, Value>]) -> Vec<u64> {
    items.iter().filter_map(|i| i["id"].as_u64()).collect()
}

fn page_params(requests: &[HashMap<String, String>]) -> Vec<(String, String)> {
    requests
        .iter()
        .map(|r| (r["page"].clone(), r["per_page"].clone()))
        .collect()
}

#[tokio::test]
async fn small_limit_is_one_page() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![page(3, false, 0..3)]),
        "github.com",
    );

    let result = searcher.search(&query(30)).await.unwrap();

    assert_eq!(ids(&result.items), vec![0, 1, 2]);
    assert_eq!(result.total_count, 3);
    let requests = searcher_requests(&searcher);
    assert_eq!(page_params(&requests), vec![("1".into(), "30".into())]);
}

#[tokio::test]
async fn hundred_is_one_full_page() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![page(900, false, 0..100)]),
        "github.com",
    );

    let result = searcher.search(&query(100)).await.unwrap();

    assert_eq!(result.items.len(), 100);
    assert_eq!(
        page_params(&searcher_requests(&searcher)),
        vec![("1".into(), "100".into())]
    );
}

#[tokio::test]
async fn pages_follow_the_remaining_count_formula() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![
            page(900, false, 0..100),
            page(900, false, 100..150),
            page(900, false, 150..160),
        ]),
        "github.com",
    );

    searcher.search(&query(250)).await.unwrap();

    assert_eq!(
        page_params(&searcher_requests(&searcher)),
        vec![
            ("1".into(), "100".into()),
            ("2".into(), "50".into()),
            ("3".into(), "250".into()),
        ]
    );
}

#[tokio::test]
async fn requests_target_the_kind_endpoint_with_json_headers() {
    let transport = ScriptedTransport::new(vec![page(1, false, 0..1)]);
    let searcher = GitHubSearcher::new(transport, "example.com");
    let mut query = query(10);
    query.keywords.push("hello world".into());
    query.order.set("asc").unwrap();
    query.sort.set("stars").unwrap();
    query.qualifiers.get_mut("Stars").unwrap().set(">=10").unwrap();

    searcher.search(&query).await.unwrap();

    let recorded = recorded_requests(&searcher);
    let request = &recorded[0];
    assert_eq!(request.url.host_str(), Some("api.example.com"));
    assert_eq!(request.url.path(), "/search/repositories");
    assert_eq!(request.headers[ACCEPT], "application/vnd.github.v3+json");
    assert_eq!(request.headers[CONTENT_TYPE], "application/json; charset=utf-8");

    let params: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
    assert_eq!(params["q"], "cli \"hello world\" stars:>=10");
    assert_eq!(params["order"], "asc");
    assert_eq!(params["sort"], "stars");
}

#[tokio::test]
async fn unset_ordering_is_not_sent() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![page(1, false, 0..1)]),
        "github.com",
    );

    searcher.search(&query(5)).await.unwrap();

    let requests = searcher_requests(&searcher);
    assert!(!requests[0].contains_key("order"));
    assert!(!requests[0].contains_key("sort"));
    assert_eq!(requests[0]["q"], "cli");
}

#[tokio::test]
async fn last_page_metadata_wins_and_items_concatenate() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![page(500, false, 0..100), page(500, true, 100..130)]),
        "github.com",
    );

    let result = searcher.search(&query(130)).await.unwrap();

    assert!(result.incomplete_results);
    assert_eq!(result.total_count, 500);
    assert_eq!(ids(&result.items), (0..130).collect::<Vec<_>>());
}

#[tokio::test]
async fn unprocessable_page_surfaces_query_and_detail() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![
            page(500, false, 0..100),
            json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"message": "Validation Failed", "errors": [{"message": "bad qualifier"}]}),
            ),
        ]),
        "github.com",
    );
    let mut query = query(200);
    query.qualifiers.get_mut("Size").unwrap().set("1..5").unwrap();

    let err = searcher.search(&query).await.unwrap_err();

    let http = err.as_http().expect("http error");
    assert!(http.is_unprocessable());
    assert_eq!(http.query(), "cli size:1..5");
    let message = err.to_string();
    assert!(message.contains("cli size:1..5"), "{message}");
    assert!(message.contains("bad qualifier"), "{message}");
    assert_eq!(searcher_requests(&searcher).len(), 2);
}

#[tokio::test]
async fn other_http_failures_stop_pagination() {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![Ok(HttpResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: b"down".to_vec(),
        })]),
        "github.com",
    );

    let err = searcher.search(&query(300)).await.unwrap_err();

    let message = err.to_string();
    assert!(
        message.starts_with(
            "HTTP 503: Service Unavailable (https://api.github.com/search/repositories?"
        ),
        "{message}"
    );
    assert_eq!(searcher_requests(&searcher).len(), 1);
}

#[tokio::test]
async fn transport_failure_is_returned_verbatim() {
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![
            page(500, false, 0..100),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset").into()),
        ]),
        "github.com",
    );

    let err = searcher.search(&query(300)).await.unwrap_err();

    assert!(matches!(err, SearchError::Transport(_)));
    assert_eq!(err.to_string(), "connection reset");
    assert_eq!(searcher_requests(&searcher).len(), 2);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let searcher = GitHubSearcher::new(
        ScriptedTransport::new(vec![Ok(HttpResponse {
            status: StatusCode::OK,
            headers,
            body: b"{\"items\": 5}".to_vec(),
        })]),
        "github.com",
    );

    let err = searcher.search(&query(10)).await.unwrap_err();

    assert!(matches!(err, SearchError::Decode(_)));
}

#[test]
fn browser_url_needs_no_network() {
    let searcher = GitHubSearcher::new(ScriptedTransport::default(), "github.com");
    let mut query = query(500);
    query.sort.set("updated").unwrap();

    let url = searcher.url(&query).unwrap();

    assert_eq!(
        url.as_str(),
        "https://github.com/search?q=cli&sort=updated&type=repositories"
    );
    assert!(searcher_requests(&searcher).is_empty());
}

fn recorded_requests(searcher: &GitHubSearcher<ScriptedTransport>) -> Vec<HttpRequest> {
    searcher.transport().requests.lock().unwrap().clone()
}

fn searcher_requests(searcher: &GitHubSearcher<ScriptedTransport>) -> Vec<HashMap<String, String>> {
    searcher.transport().requests()
}
