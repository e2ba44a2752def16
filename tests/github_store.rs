//! GitHub contents API mapping, checked against a mock HTTP server

use draft_publisher::core::{FileVersion, PutRequest, RemoteError, RemoteFileStore};
use draft_publisher::remote::GitHubFileStore;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENTS_PATH: &str = "/repos/octocat/blog/contents/content/hello.md";

fn store(server: &MockServer) -> GitHubFileStore {
    GitHubFileStore::new(SecretString::new("ghp_test_token".into()), "octocat", "blog")
        .with_api_base(server.uri())
}

fn put_request(expected_version: Option<&str>) -> PutRequest {
    PutRequest {
        path: "hello.md".to_string(),
        content: "# Hello\n\nWorld".to_string(),
        message: "Add post: Hello".to_string(),
        expected_version: expected_version.map(FileVersion::from),
    }
}

#[tokio::test]
async fn get_decodes_content_and_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(query_param("ref", "main"))
        .and(header("authorization", "Bearer ghp_test_token"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "encoding": "base64",
            "sha": "abc123",
            "content": "IyBIZWxsbwoK\nV29ybGQ=\n"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = store(&server).get("hello.md").await.unwrap().unwrap();

    assert_eq!(file.path, "hello.md");
    assert_eq!(file.content, "# Hello\n\nWorld");
    assert_eq!(file.version, FileVersion::new("abc123"));
}

#[tokio::test]
async fn get_missing_file_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    assert!(store(&server).get("hello.md").await.unwrap().is_none());
}

#[tokio::test]
async fn get_server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Server Error"
        })))
        .mount(&server)
        .await;

    let err = store(&server).get("hello.md").await.unwrap_err();

    assert_eq!(
        err,
        RemoteError::Api {
            status: 500,
            message: "Server Error".to_string()
        }
    );
}

#[tokio::test]
async fn put_create_sends_encoded_content_without_sha() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "message": "Add post: Hello",
            "content": "IyBIZWxsbwoKV29ybGQ=",
            "branch": "main"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "sha": "new-sha", "path": "content/hello.md" },
            "commit": { "sha": "commit-sha" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let version = store(&server).put(put_request(None)).await.unwrap();
    assert_eq!(version.as_str(), "new-sha");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("sha").is_none());
}

#[tokio::test]
async fn put_update_sends_sha_and_branch() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/blog/contents/content/hello.md"))
        .and(body_partial_json(json!({
            "sha": "old-sha",
            "branch": "drafts"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "sha": "next-sha" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let version = store(&server)
        .with_branch("drafts")
        .put(put_request(Some("old-sha")))
        .await
        .unwrap();

    assert_eq!(version, FileVersion::new("next-sha"));
}

#[tokio::test]
async fn put_409_is_version_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "hello.md does not match abc123"
        })))
        .mount(&server)
        .await;

    let err = store(&server)
        .put(put_request(Some("abc123")))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RemoteError::VersionConflict {
            path: "hello.md".to_string()
        }
    );
}

#[tokio::test]
async fn put_422_missing_sha_is_version_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&server)
        .await;

    let err = store(&server).put(put_request(None)).await.unwrap_err();

    assert!(err.is_version_conflict());
}

#[tokio::test]
async fn put_422_other_validation_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request. Branch not found."
        })))
        .mount(&server)
        .await;

    let err = store(&server).put(put_request(None)).await.unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert!(!err.is_version_conflict());
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let store = GitHubFileStore::new(SecretString::new("t".into()), "octocat", "blog")
        .with_api_base("http://127.0.0.1:1");

    let err = store.get("hello.md").await.unwrap_err();

    assert!(matches!(err, RemoteError::Network(_)));
}
