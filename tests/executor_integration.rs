//! Integration tests for the authenticated request executor.
//!
//! Each test runs against a local wiremock server standing in for the
//! GitHub or GitLab API.

use forgelink::auth::AccessToken;
use forgelink::forge::{
    ApiClient, Domain, ForgeError, ForgeWarning, Platform, MAX_PAGES, MAX_REDIRECT_REPAIRS,
};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROVIDERS: &str = "\t1. `GITHUB_TOKEN` environment variable\n\t2. Content of the `~/.github-token` file";

fn token(platform: Platform) -> AccessToken {
    AccessToken::new("tok", format!("`{}` environment variable", platform.token_env_var()))
}

fn github(server: &MockServer, with_token: bool) -> ApiClient {
    let token = with_token.then(|| token(Platform::GitHub));
    ApiClient::new(Domain::default_for(Platform::GitHub), token, PROVIDERS)
        .unwrap()
        .with_base_url(server.uri())
}

fn gitlab(server: &MockServer) -> ApiClient {
    ApiClient::new(
        Domain::default_for(Platform::GitLab),
        Some(token(Platform::GitLab)),
        PROVIDERS,
    )
    .unwrap()
    .with_base_url(server.uri())
}

// =============================================================================
// Headers
// =============================================================================

mod headers {
    use super::*;

    #[tokio::test]
    async fn github_request_carries_auth_and_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer tok"))
            .and(header("accept", "application/vnd.github+json"))
            .and(header("x-github-api-version", "2022-11-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "bob" })))
            .expect(1)
            .mount(&server)
            .await;

        let response = github(&server, true)
            .execute(Method::GET, "/user", None)
            .await
            .unwrap();

        assert_eq!(response.data, json!({ "login": "bob" }));
        assert!(response.warnings.is_empty());
    }

    #[tokio::test]
    async fn anonymous_request_has_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
            .mount(&server)
            .await;

        github(&server, false)
            .execute(Method::GET, "/repos/o/r", None)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn gitlab_paths_are_prefixed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "bob" })))
            .expect(1)
            .mount(&server)
            .await;

        let response = gitlab(&server)
            .execute(Method::GET, "/user", None)
            .await
            .unwrap();

        assert_eq!(response.data["username"], "bob");
    }

    #[tokio::test]
    async fn empty_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/o/r/pulls/1/requested_reviewers"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = github(&server, true)
            .execute(
                Method::POST,
                "/repos/o/r/pulls/1/requested_reviewers",
                Some(&json!({ "reviewers": ["alice"] })),
            )
            .await
            .unwrap();

        assert!(response.data.is_null());
    }
}

// =============================================================================
// Pagination
// =============================================================================

mod pagination {
    use super::*;

    #[tokio::test]
    async fn pages_are_concatenated_in_order() {
        let server = MockServer::start().await;
        let page_url = |page: u32| format!("{}/repos/o/r/pulls?page={}", server.uri(), page);

        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .and(query_param_is_missing("page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "number": 1 }, { "number": 2 }]))
                    .insert_header("Link", format!("<{}>; rel=\"next\"", page_url(2)).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "number": 3 }]))
                    .insert_header(
                        "Link",
                        format!(
                            "<{}>; rel=\"prev\", <{}>; rel=\"next\"",
                            page_url(1),
                            page_url(3)
                        )
                        .as_str(),
                    ),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .and(query_param("page", "3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "number": 4 }]))
                    .insert_header("Link", format!("<{}>; rel=\"prev\"", page_url(2)).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap();

        assert_eq!(
            response.data,
            json!([{ "number": 1 }, { "number": 2 }, { "number": 3 }, { "number": 4 }])
        );
    }

    #[tokio::test]
    async fn single_page_without_link_is_returned_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let response = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap();

        assert_eq!(response.data, json!([]));
    }

    #[tokio::test]
    async fn non_list_page_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "not": "a list" }))
                    .insert_header(
                        "Link",
                        format!("<{}/repos/o/r/pulls?page=2>; rel=\"next\"", server.uri())
                            .as_str(),
                    ),
            )
            .mount(&server)
            .await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::Unexpected(_)));
    }

    #[tokio::test]
    async fn pages_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "number": 1 }]))
                    .insert_header(
                        "Link",
                        format!("<{}/repos/o/r/pulls>; rel=\"next\"", server.uri()).as_str(),
                    ),
            )
            .mount(&server)
            .await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap_err();

        let ForgeError::Unexpected(message) = err else {
            panic!("expected unexpected error, got {:?}", err);
        };
        assert!(message.contains(&format!("within {} requests", MAX_PAGES)));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), MAX_PAGES);
    }

    #[tokio::test]
    async fn next_link_to_other_host_is_not_followed() {
        let server = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "number": 1 }]))
                    .insert_header(
                        "Link",
                        format!("<{}/collect>; rel=\"next\"", elsewhere.uri()).as_str(),
                    ),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "number": 2 }])))
            .mount(&elsewhere)
            .await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap_err();

        let ForgeError::Unexpected(message) = err else {
            panic!("expected unexpected error, got {:?}", err);
        };
        assert!(message.contains("different host"));
        assert!(elsewhere.received_requests().await.unwrap().is_empty());
    }
}

// =============================================================================
// Error taxonomy
// =============================================================================

mod errors {
    use super::*;

    async fn respond(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls/7"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn validation_failed_joins_error_messages() {
        let server = MockServer::start().await;
        respond(
            &server,
            422,
            json!({
                "message": "Validation Failed",
                "errors": [{ "message": "A" }, { "message": "B" }]
            }),
        )
        .await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls/7", None)
            .await
            .unwrap_err();

        assert_eq!(err, ForgeError::Validation("A\nB".to_string()));
    }

    #[tokio::test]
    async fn other_unprocessable_message_is_verbatim() {
        let server = MockServer::start().await;
        respond(&server, 422, json!({ "message": "Other" })).await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls/7", None)
            .await
            .unwrap_err();

        assert_eq!(err, ForgeError::Validation("Other".to_string()));
    }

    #[tokio::test]
    async fn unauthorized_names_token_provider() {
        let server = MockServer::start().await;
        respond(&server, 401, json!({ "message": "Bad credentials" })).await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls/7", None)
            .await
            .unwrap_err();

        let ForgeError::Auth(message) = err else {
            panic!("expected auth error, got {:?}", err);
        };
        assert!(message.starts_with("GitHub API returned `401` HTTP status"));
        assert!(message.contains("`GITHUB_TOKEN` environment variable"));
        assert!(message.contains("`GET /repos/o/r/pulls/7`"));
        assert!(message.contains("forgelink providers --platform github"));
    }

    #[tokio::test]
    async fn forbidden_without_token_asks_for_one() {
        let server = MockServer::start().await;
        respond(&server, 403, json!({ "message": "Forbidden" })).await;

        let err = github(&server, false)
            .execute(Method::GET, "/repos/o/r/pulls/7", None)
            .await
            .unwrap_err();

        let ForgeError::Auth(message) = err else {
            panic!("expected auth error, got {:?}", err);
        };
        assert!(message.contains("`403`"));
        assert!(message.contains("Provide a GitHub token with `repo` access"));
        assert!(message.contains("https://github.com/settings/tokens"));
    }

    #[tokio::test]
    async fn not_found_lists_token_providers() {
        let server = MockServer::start().await;
        respond(&server, 404, json!({ "message": "Not Found" })).await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls/7", None)
            .await
            .unwrap_err();

        let ForgeError::NotFound(message) = err else {
            panic!("expected not-found error, got {:?}", err);
        };
        assert!(message.contains("`404`"));
        assert!(message.contains(PROVIDERS));
        assert!(message.contains("Visit `https://github.com/settings/tokens`"));
    }

    #[tokio::test]
    async fn other_status_is_unexpected_with_request() {
        let server = MockServer::start().await;
        respond(&server, 500, json!({})).await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls/7", None)
            .await
            .unwrap_err();

        let ForgeError::Unexpected(message) = err else {
            panic!("expected unexpected error, got {:?}", err);
        };
        assert!(message.contains("`500`"));
        assert!(message.contains("Internal Server Error"));
        assert!(message.ends_with("Request: `GET /repos/o/r/pulls/7`"));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        // Nothing listens on port 1
        let client = ApiClient::new(Domain::default_for(Platform::GitHub), None, PROVIDERS)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");

        let err = client.execute(Method::GET, "/user", None).await.unwrap_err();

        match err {
            ForgeError::Connection { host, .. } => assert_eq!(host, "127.0.0.1"),
            other => panic!("expected connection error, got {:?}", other),
        }
    }
}

// =============================================================================
// Redirect repair
// =============================================================================

mod redirects {
    use super::*;

    #[tokio::test]
    async fn renamed_repository_is_repaired_with_warning() {
        let server = MockServer::start().await;
        let body = json!({ "head": "feature", "base": "main", "title": "T", "draft": false });

        Mock::given(method("POST"))
            .and(path("/repos/old-org/old-name/pulls"))
            .respond_with(
                ResponseTemplate::new(307)
                    .insert_header("Location", format!("{}/repositories/42/pulls", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "full_name": "new-org/new-name" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repositories/42/pulls"))
            .and(body_json(body.clone()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "number": 5 })))
            .expect(1)
            .mount(&server)
            .await;

        let response = github(&server, true)
            .execute(Method::POST, "/repos/old-org/old-name/pulls", Some(&body))
            .await
            .unwrap();

        assert_eq!(response.data, json!({ "number": 5 }));
        assert_eq!(
            response.warnings,
            vec![ForgeWarning::RepositoryMoved {
                from: "/repos/old-org/old-name/pulls".to_string(),
                to: "new-org/new-name".to_string(),
                new_url: "https://github.com/new-org/new-name.git".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn repeated_redirects_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "full_name": "o/r" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(307)
                    .insert_header("Location", format!("{}/repositories/42/pulls", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap_err();

        let ForgeError::Unexpected(message) = err else {
            panic!("expected unexpected error, got {:?}", err);
        };
        assert!(message.contains(&format!("more than {} times", MAX_REDIRECT_REPAIRS)));
    }

    #[tokio::test]
    async fn location_without_repository_id_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/pulls"))
            .respond_with(
                ResponseTemplate::new(307)
                    .insert_header("Location", format!("{}/somewhere/else", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        let err = github(&server, true)
            .execute(Method::GET, "/repos/o/r/pulls", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::Unexpected(_)));
    }

    #[tokio::test]
    async fn gitlab_does_not_repair_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/1/merge_requests"))
            .respond_with(
                ResponseTemplate::new(307)
                    .insert_header("Location", format!("{}/repositories/42/pulls", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        let err = gitlab(&server)
            .execute(Method::GET, "/projects/1/merge_requests", None)
            .await
            .unwrap_err();

        let ForgeError::Unexpected(message) = err else {
            panic!("expected unexpected error, got {:?}", err);
        };
        assert!(message.starts_with("GitLab API returned `307`"));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}

// =============================================================================
// GraphQL
// =============================================================================

mod graphql {
    use super::*;

    #[tokio::test]
    async fn query_is_posted_with_variables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_json(json!({ "query": "{ viewer { login } }", "variables": { "a": 1 } })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "viewer": { "login": "bob" } } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = github(&server, true)
            .execute_graphql("{ viewer { login } }", Some(json!({ "a": 1 })))
            .await
            .unwrap();

        assert_eq!(response.data.pointer("/data/viewer/login").unwrap(), "bob");
    }

    #[tokio::test]
    async fn errors_array_is_validation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Field 'x' doesn't exist" }]
            })))
            .mount(&server)
            .await;

        let err = gitlab(&server)
            .execute_graphql("{ x }", None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ForgeError::Validation("Field 'x' doesn't exist".to_string())
        );
    }
}
