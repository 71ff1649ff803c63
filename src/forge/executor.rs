//! forge::executor
//!
//! Authenticated request executor shared by every provider client.
//!
//! # Design
//!
//! [`ApiClient`] fires one logical API call and hides three platform
//! mechanics from its callers:
//!
//! - **Pagination**: while a 2xx response carries a `Link` header with a
//!   `rel="next"` URL, the next page is fetched with the same method and
//!   body, and list-shaped pages are concatenated in server order.
//! - **Redirect repair** (GitHub only): a 307 pointing at
//!   `/repositories/<id>/...` means the repository was renamed. The new
//!   name is looked up, the original request is re-issued against the
//!   rewritten path, and a [`ForgeWarning::RepositoryMoved`] is attached to
//!   the successful result.
//! - **Error taxonomy**: every failure is translated into a [`ForgeError`]
//!   carrying an actionable, ready-to-print message.
//!
//! Pagination and redirect repair run in a bounded loop: at most
//! [`MAX_PAGES`] requests and [`MAX_REDIRECT_REPAIRS`] repairs per call.
//!
//! # Example
//!
//! ```ignore
//! use forgelink::forge::{ApiClient, Domain, Platform};
//! use reqwest::Method;
//!
//! let client = ApiClient::new(Domain::default_for(Platform::GitHub), token, providers)?;
//! let response = client.execute(Method::GET, "/repos/octocat/hello/pulls", None).await?;
//! for warning in &response.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, LOCATION, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::platform::{Domain, Platform, GRAPHQL_PATH};
use super::traits::{ForgeError, ForgeWarning};
use crate::auth::AccessToken;

/// Upper bound on requests (pages plus repaired retries) per logical call.
pub const MAX_PAGES: usize = 100;

/// Upper bound on redirect repairs per logical call.
pub const MAX_REDIRECT_REPAIRS: usize = 3;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "forgelink";

/// GitHub REST API version sent with every request.
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Result of one logical API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Parsed payload; concatenated across pages for paginated lists
    pub data: Value,
    /// Non-fatal notices produced while serving the call
    pub warnings: Vec<ForgeWarning>,
}

/// HTTP executor bound to one domain and one (optional) token.
pub struct ApiClient {
    /// HTTP client with automatic redirects disabled
    client: Client,
    domain: Domain,
    token: Option<AccessToken>,
    /// Default headers, including authorization when a token is held
    headers: HeaderMap,
    /// Rendered list of token providers, for 404 guidance
    possible_providers: String,
    /// Replaces `https://<api host>` (tests, proxies)
    base_url: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("domain", &self.domain)
            .field("has_token", &self.token.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Create an executor for `domain`.
    ///
    /// `possible_providers` is the rendered list of token sources, quoted in
    /// not-found messages.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Unexpected`] if the token cannot be sent in an
    /// HTTP header or the HTTP client cannot be initialized.
    pub fn new(
        domain: Domain,
        token: Option<AccessToken>,
        possible_providers: impl Into<String>,
    ) -> Result<Self, ForgeError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ForgeError::Unexpected(format!("failed to build HTTP client: {}", e)))?;
        let headers = default_headers(domain.platform(), token.as_ref())?;
        Ok(Self {
            client,
            domain,
            token,
            headers,
            possible_providers: possible_providers.into(),
            base_url: None,
        })
    }

    /// Send requests to `base_url` instead of `https://<api host>`.
    ///
    /// The platform's API path prefix is still applied.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Domain this executor talks to.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Token used for requests, if any.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Full URL for an API path.
    pub fn url_for(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}{}", base, self.domain.api_path_prefix(path), path),
            None => format!("{}{}", self.domain.url_prefix_for(path), path),
        }
    }

    /// Execute one logical API call.
    ///
    /// `path` is relative to the domain's API root. `body` is sent as JSON
    /// with every page request and with a repaired retry.
    ///
    /// # Errors
    ///
    /// See [`ForgeError`]; every HTTP-level failure is classified here.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ForgeError> {
        let mut url = self.url_for(path);
        let mut current_path = path.to_string();
        let mut items: Vec<Value> = Vec::new();
        let mut paginated = false;
        let mut warnings = Vec::new();
        let mut repairs = 0;

        for _ in 0..MAX_PAGES {
            let response = self.send(&method, &url, body).await?;
            let status = response.status();

            if status.is_success() {
                let next = next_page_url(response.headers());
                let data = read_json(&method, &url, response).await?;
                match (next, paginated) {
                    (None, false) => return Ok(ApiResponse { data, warnings }),
                    (None, true) => {
                        items.extend(expect_page(data, &method, &current_path)?);
                        return Ok(ApiResponse {
                            data: Value::Array(items),
                            warnings,
                        });
                    }
                    (Some(next), _) => {
                        // The next link inherits the Authorization header
                        if !same_origin(&url, &next) {
                            return Err(ForgeError::Unexpected(format!(
                                "{} {} returned a pagination link to a different host: `{}`",
                                method, current_path, next
                            )));
                        }
                        items.extend(expect_page(data, &method, &current_path)?);
                        paginated = true;
                        debug!("Following pagination link to {}", next);
                        url = next;
                    }
                }
                continue;
            }

            if status == StatusCode::TEMPORARY_REDIRECT && self.domain.platform().repairs_redirects()
            {
                if repairs == MAX_REDIRECT_REPAIRS {
                    return Err(ForgeError::Unexpected(format!(
                        "{} {} was redirected more than {} times",
                        method, path, MAX_REDIRECT_REPAIRS
                    )));
                }
                repairs += 1;

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let id = repository_id_from_location(&location).ok_or_else(|| {
                    ForgeError::Unexpected(format!(
                        "{} API returned `307` HTTP status for {} {}, \
                         but the `Location` header `{}` does not point at a repository id",
                        self.domain.platform().display_name(),
                        method,
                        current_path,
                        location
                    ))
                })?;
                let full_name = self.repository_full_name(&id).await?;
                let new_path = self.path_from_location(&location);
                debug!("Repository moved to {}, retrying {} {}", full_name, method, new_path);

                warnings.push(ForgeWarning::RepositoryMoved {
                    from: current_path.clone(),
                    new_url: self.domain.repository_web_url(&full_name),
                    to: full_name,
                });
                url = self.url_for(&new_path);
                current_path = new_path;
                continue;
            }

            return Err(self.classify_error(&method, &current_path, response).await);
        }

        Err(ForgeError::Unexpected(format!(
            "{} {} did not complete within {} requests",
            method, path, MAX_PAGES
        )))
    }

    /// Execute a GraphQL query or mutation.
    ///
    /// The body is `{query, variables?}`, always POSTed to the GraphQL
    /// endpoint. A successful response carrying a non-empty `errors` array
    /// is reported as [`ForgeError::Validation`].
    pub async fn execute_graphql(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<ApiResponse, ForgeError> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let response = self.execute(Method::POST, GRAPHQL_PATH, Some(&body)).await?;
        if let Some(errors) = response.data.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(ForgeError::Validation(join_error_messages(errors)));
            }
        }
        Ok(response)
    }

    /// Look up the current `owner/name` of a repository by numeric id.
    ///
    /// A single request: no pagination or redirect handling.
    pub async fn repository_full_name(&self, id: &str) -> Result<String, ForgeError> {
        let path = format!("/repositories/{}", id);
        let url = self.url_for(&path);
        let response = self.send(&Method::GET, &url, None).await?;
        if !response.status().is_success() {
            return Err(self.classify_error(&Method::GET, &path, response).await);
        }
        let data = read_json(&Method::GET, &url, response).await?;
        data.get("full_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ForgeError::Unexpected(format!("GET {} returned no `full_name`", path))
            })
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, ForgeError> {
        debug!("{} {}", method, url);
        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| ForgeError::Connection {
            host: host_of(url),
            message: e.to_string(),
        })
    }

    /// Turn a redirect `Location` into an API path for this domain.
    fn path_from_location(&self, location: &str) -> String {
        let path = strip_scheme_and_host(location);
        let prefix = self.domain.api_path_prefix(path);
        match path.strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() && rest.starts_with('/') => rest.to_string(),
            _ => path.to_string(),
        }
    }

    async fn classify_error(&self, method: &Method, path: &str, response: Response) -> ForgeError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let platform = self.domain.platform();
        let reason = status.canonical_reason().unwrap_or("Unknown");
        let preamble = format!(
            "{} API returned `{}` HTTP status with error message: `{}`.",
            platform.display_name(),
            status.as_u16(),
            reason
        );

        match status {
            StatusCode::UNPROCESSABLE_ENTITY => ForgeError::Validation(validation_message(&body)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let detail = match &self.token {
                    Some(token) => format!(
                        "Make sure that the {} token provided by {} is valid \
                         and allows for access to `{} {}`.",
                        platform.display_name(),
                        token.provider(),
                        method,
                        path
                    ),
                    None => format!(
                        "You might not have the required permissions for this repository.\n\
                         Provide a {} token with `{}` access.\n\
                         Visit `{}` to generate a new one.",
                        platform.display_name(),
                        platform.required_scope(),
                        self.domain.token_creation_url()
                    ),
                };
                ForgeError::Auth(format!(
                    "{}\n{}\n{}",
                    preamble,
                    detail,
                    other_providers_hint(platform)
                ))
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(format!(
                "{}\nMake sure that a valid {} token is provided; \
                 a token can be provided in one of the following ways:\n{}\n\
                 Visit `{}` to generate a new one.",
                preamble,
                platform.display_name(),
                self.possible_providers,
                self.domain.token_creation_url()
            )),
            _ => ForgeError::Unexpected(format!("{} Request: `{} {}`", preamble, method, path)),
        }
    }
}

fn default_headers(
    platform: Platform,
    token: Option<&AccessToken>,
) -> Result<HeaderMap, ForgeError> {
    let mut headers = HeaderMap::new();
    match platform {
        Platform::GitHub => {
            headers.insert(
                ACCEPT,
                HeaderValue::from_static("application/vnd.github+json"),
            );
            headers.insert(
                "X-GitHub-Api-Version",
                HeaderValue::from_static(GITHUB_API_VERSION),
            );
        }
        Platform::GitLab => {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
    }
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.value())).map_err(|_| {
            ForgeError::Unexpected(format!(
                "the token provided by {} contains characters not allowed in an HTTP header",
                token.provider()
            ))
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn other_providers_hint(platform: Platform) -> String {
    format!(
        "You can also use a different token provider; \
         run `forgelink providers --platform {}` to list them.",
        platform.name()
    )
}

async fn read_json(method: &Method, url: &str, response: Response) -> Result<Value, ForgeError> {
    let text = response.text().await.map_err(|e| ForgeError::Connection {
        host: host_of(url),
        message: e.to_string(),
    })?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        ForgeError::Unexpected(format!(
            "could not parse the response of {} {}: {}",
            method, url, e
        ))
    })
}

/// A page of a paginated listing must be a JSON array.
fn expect_page(data: Value, method: &Method, path: &str) -> Result<Vec<Value>, ForgeError> {
    match data {
        Value::Array(items) => Ok(items),
        other => Err(ForgeError::Unexpected(format!(
            "{} {} is paginated but returned a non-list page: {}",
            method, path, other
        ))),
    }
}

/// URL of the `rel="next"` relation of a `Link` header.
///
/// ```
/// use forgelink::forge::next_page_url_from_link;
///
/// let link = r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#;
/// assert_eq!(next_page_url_from_link(link).as_deref(), Some("https://api.github.com/x?page=2"));
/// ```
pub fn next_page_url_from_link(link: &str) -> Option<String> {
    static NEXT: OnceLock<Option<Regex>> = OnceLock::new();
    let re = NEXT
        .get_or_init(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).ok())
        .as_ref()?;
    re.captures(link).map(|caps| caps[1].to_string())
}

fn next_page_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(next_page_url_from_link)
}

/// Numeric repository id in a GitHub redirect `Location`.
pub fn repository_id_from_location(location: &str) -> Option<String> {
    static REPOSITORY_ID: OnceLock<Option<Regex>> = OnceLock::new();
    let re = REPOSITORY_ID
        .get_or_init(|| Regex::new(r"/repositories/(\d+)(?:[/?]|$)").ok())
        .as_ref()?;
    re.captures(location).map(|caps| caps[1].to_string())
}

/// Whether two absolute URLs share scheme, host and port.
fn same_origin(current: &str, candidate: &str) -> bool {
    match (reqwest::Url::parse(current), reqwest::Url::parse(candidate)) {
        (Ok(a), Ok(b)) => {
            a.scheme() == b.scheme()
                && a.host_str() == b.host_str()
                && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

/// `https://host/a/b` becomes `/a/b`.
fn strip_scheme_and_host(url: &str) -> &str {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match without_scheme {
        Some(rest) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => url,
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Message of a 422 response body.
///
/// GitHub's `Validation Failed` wraps the real reasons in `errors`; GraphQL
/// responses carry only `errors`; GitLab may send `message` as a list.
///
/// ```
/// use forgelink::forge::validation_message;
///
/// let body = r#"{"message":"Validation Failed","errors":[{"message":"A"},{"message":"B"}]}"#;
/// assert_eq!(validation_message(body), "A\nB");
/// assert_eq!(validation_message(r#"{"message":"Other"}"#), "Other");
/// ```
pub fn validation_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "Validation failed".to_string()
        } else {
            trimmed.to_string()
        };
    };

    let message = value.get("message");
    let errors = value.get("errors").and_then(Value::as_array);
    match (message, errors) {
        (Some(Value::String(m)), Some(errors)) if m == "Validation Failed" => {
            join_error_messages(errors)
        }
        (Some(message), _) => text_of(message),
        (None, Some(errors)) => join_error_messages(errors),
        (None, None) => value.to_string(),
    }
}

/// Each entry's `message`, or its whole textual form, one per line.
fn join_error_messages(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|e| match e.get("message") {
            Some(message) => text_of(message),
            None => text_of(e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(text_of).collect::<Vec<_>>().join("\n"),
        other => other.to_string(),
    }
}

/// Serialize a request body.
pub(crate) fn json_body<T: Serialize>(body: &T) -> Result<Value, ForgeError> {
    serde_json::to_value(body)
        .map_err(|e| ForgeError::Unexpected(format!("failed to encode request body: {}", e)))
}

/// Deserialize a response payload into a typed shape.
pub(crate) fn from_data<T: DeserializeOwned>(data: Value, what: &str) -> Result<T, ForgeError> {
    serde_json::from_value(data)
        .map_err(|e| ForgeError::Unexpected(format!("unexpected {} payload: {}", what, e)))
}
