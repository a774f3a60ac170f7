//! Integration tests for `HyperTransport` using wiremock.
//!
//! The transport is blocking, so every call runs on a blocking thread while
//! the mock server keeps serving from the test runtime.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use assert2::{check, let_assert};
use fastclient::prelude::*;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Model)]
struct User {
    id: u64,
    name: String,
}

#[fastclient]
pub trait Users {
    #[get("/users/{id}")]
    fn get_user(&self, id: u64) -> fastclient::Result<User>;

    #[post("/users")]
    fn create_user(&self, #[body(embed = false)] user: &User) -> fastclient::Result<User>;

    #[get("/search")]
    fn search(&self, #[query] q: &str, #[query(ge = 1)] page: u32) -> fastclient::Result<JsonMap>;

    #[delete("/users/{id}")]
    fn delete_user(&self, #[path] id: u64) -> fastclient::Result<Response<Bytes>>;
}

async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.expect("blocking task completes")
}

fn users_client(server: &MockServer) -> UsersClient {
    let transport = HyperTransport::builder()
        .timeout(Duration::from_secs(5))
        .worker_threads(1)
        .with_logging()
        .build()
        .expect("transport starts");
    let base_url = Url::parse(&server.uri()).expect("valid URL");
    UsersClient::new(transport, base_url).expect("valid endpoints")
}

fn alice() -> User {
    User {
        id: 1,
        name: "Alice".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn get_with_path_parameter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(header("Accept", "application/json"))
        .and(header("User-Agent", fastclient::DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = users_client(&mock_server);
    let result = blocking(move || client.get_user(1)).await;

    let_assert!(Ok(user) = result);
    check!(user == alice());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_with_bare_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(alice()))
        .respond_with(ResponseTemplate::new(201).set_body_json(User {
            id: 42,
            name: "Alice".to_string(),
        }))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = users_client(&mock_server);
    let result = blocking(move || client.create_user(&alice())).await;

    let_assert!(Ok(user) = result);
    check!(user.id == 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust client"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": ["fastclient", "rustls"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = users_client(&mock_server);
    let result = blocking(move || client.search("rust client", 2)).await;

    let_assert!(Ok(found) = result);
    check!(found["results"] == serde_json::json!(["fastclient", "rustls"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_arguments_never_reach_the_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = users_client(&mock_server);
    let result = blocking(move || client.search("rust", 0)).await;

    let_assert!(Err(err) = result);
    check!(err.is_validation());
    check!(err.to_string().contains("page: input should be greater than or equal to 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_error_status_keeps_the_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "no such user"})))
        .mount(&mock_server)
        .await;

    let client = users_client(&mock_server);
    let result = blocking(move || client.get_user(404)).await;

    let_assert!(Err(err) = result);
    check!(err.status() == Some(404));
    let_assert!(Some(Ok(body)) = err.decode_body::<serde_json::Value>());
    check!(body["error"] == "no such user");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn raw_response_with_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(204).insert_header("X-Request-Id", "abc123"))
        .mount(&mock_server)
        .await;

    let client = users_client(&mock_server);
    let result = blocking(move || client.delete_user(1)).await;

    let_assert!(Ok(response) = result);
    check!(response.status() == 204);
    check!(response.header("x-request-id") == Some("abc123"));
    check!(response.body().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timeout() {
    let mock_server = MockServer::start().await;

    // Delay longer than the transport timeout
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let base_url = Url::parse(&mock_server.uri()).expect("valid URL");
    let result = blocking(move || -> fastclient::Result<User> {
        let transport = HyperTransport::builder()
            .timeout(Duration::from_millis(100))
            .build()?;
        let client = ApiClient::new(transport, base_url);
        client.get_user(1)
    })
    .await;

    let_assert!(Err(err) = result);
    check!(err.is_timeout(), "expected timeout error, got: {err}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connection_error() {
    let result = blocking(|| -> fastclient::Result<User> {
        let client = ApiClient::parse(HyperTransport::new()?, "http://127.0.0.1:1")?;
        client.get_user(1)
    })
    .await;

    let_assert!(Err(err) = result);
    check!(err.is_connection(), "expected connection error, got: {err}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_transport_serves_concurrent_callers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = Arc::new(users_client(&mock_server));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::task::spawn_blocking(move || client.get_user(1))
        })
        .collect();

    for handle in handles {
        let_assert!(Ok(Ok(user)) = handle.await);
        check!(user == alice());
    }
}
