//! forge::github
//!
//! GitHub provider client.
//!
//! # Design
//!
//! A thin [`Forge`] implementation over [`ApiClient`]: every operation
//! resolves the repository base path, issues one executor call (the
//! description template takes a GraphQL query), and extracts fields from
//! the JSON payload. Pagination, redirect repair, and error translation all
//! happen in the executor.
//!
//! The repository is addressed as `/repos/{organization}/{repository}`, or
//! `/repositories/{id}` when only the numeric id is known.
//!
//! # Example
//!
//! ```ignore
//! use forgelink::forge::github::GitHubForge;
//! use forgelink::forge::{ApiClient, Domain, Forge, Namespace, Platform, ProjectRef};
//!
//! let api = ApiClient::new(Domain::default_for(Platform::GitHub), token, providers)?;
//! let project = ProjectRef::from_path(Namespace::parse("octocat")?, "hello-world");
//! let forge = GitHubForge::new(api, project);
//!
//! for pr in forge.list_open_pull_requests().await? {
//!     println!("#{} {}", pr.number, pr.title);
//! }
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::executor::{from_data, json_body, ApiClient, ApiResponse};
use super::platform::{Domain, Platform};
use super::project::ProjectRef;
use super::traits::{CreatePrRequest, Forge, ForgeError, PrState, PullRequest};
use crate::ui::output::{self, Verbosity};

/// Repository file holding the default pull request description.
const TEMPLATE_EXPRESSION: &str = "HEAD:.github/pull_request_template.md";

/// GitHub forge implementation.
#[derive(Debug)]
pub struct GitHubForge {
    api: ApiClient,
    project: ProjectRef,
    /// Verbosity for redirect-repair warnings
    verbosity: Verbosity,
}

impl GitHubForge {
    /// Create a client for `project`, reached through `api`.
    pub fn new(api: ApiClient, project: ProjectRef) -> Self {
        Self {
            api,
            project,
            verbosity: Verbosity::Normal,
        }
    }

    /// Set the verbosity used to surface warnings.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// The underlying executor.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The repository this client targets.
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// Request reviews from `logins` on pull request `number`.
    pub async fn add_reviewers(&self, number: u64, logins: &[String]) -> Result<(), ForgeError> {
        let path = self.repo_path(&format!("/pulls/{}/requested_reviewers", number))?;
        let body = json_body(&RequestReviewersBody { reviewers: logins })?;
        self.call(Method::POST, &path, Some(&body)).await?;
        Ok(())
    }

    /// Current `owner/name` of the repository with numeric `id`.
    pub async fn repository_full_name(&self, id: &str) -> Result<String, ForgeError> {
        self.api.repository_full_name(id).await
    }

    /// `repo base path + suffix`, or an addressing error before any request.
    fn repo_path(&self, suffix: &str) -> Result<String, ForgeError> {
        let base = self.project.api_base_path(self.api.domain().platform())?;
        Ok(format!("{}{}", base, suffix))
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ForgeError> {
        let response = self.api.execute(method, path, body).await?;
        Ok(self.report(response))
    }

    /// Surface warnings, hand back the payload.
    fn report(&self, response: ApiResponse) -> Value {
        for warning in &response.warnings {
            output::warn(warning, self.verbosity);
        }
        response.data
    }

    /// Organization and repository names, looked up by id if needed.
    async fn owner_and_name(&self) -> Result<(String, String), ForgeError> {
        let full_name = match (self.project.full_path(), &self.project.id) {
            (Some(full), _) => full,
            (None, Some(id)) => self.repository_full_name(id).await?,
            (None, None) => {
                return Err(self.project.addressing_error(Platform::GitHub));
            }
        };
        match full_name.split_once('/') {
            Some((owner, name)) => Ok((owner.to_string(), name.to_string())),
            None => Err(ForgeError::Unexpected(format!(
                "`{}` is not an `owner/name` repository name",
                full_name
            ))),
        }
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    fn domain(&self) -> &Domain {
        self.api.domain()
    }

    async fn current_user_login(&self) -> Result<Option<String>, ForgeError> {
        if self.api.token().is_none() {
            return Ok(None);
        }
        let data = self.call(Method::GET, "/user", None).await?;
        let user: GitHubUser = from_data(data, "user")?;
        Ok(Some(user.login))
    }

    async fn create_pull_request(
        &self,
        request: CreatePrRequest,
    ) -> Result<PullRequest, ForgeError> {
        let path = self.repo_path("/pulls")?;
        let body = json_body(&CreatePrBody {
            head: &request.head,
            base: &request.base,
            title: &request.title,
            body: request.description.as_deref(),
            draft: request.draft,
        })?;
        let data = self.call(Method::POST, &path, Some(&body)).await?;
        Ok(from_data::<GitHubPullRequest>(data, "pull request")?.into())
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError> {
        let path = self.repo_path(&format!("/pulls/{}", number))?;
        let data = self.call(Method::GET, &path, None).await?;
        Ok(from_data::<GitHubPullRequest>(data, "pull request")?.into())
    }

    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        let path = self.repo_path("/pulls?state=open&per_page=100")?;
        let data = self.call(Method::GET, &path, None).await?;
        let prs: Vec<GitHubPullRequest> = from_data(data, "pull request list")?;
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    async fn retarget_pull_request(
        &self,
        number: u64,
        base: &str,
    ) -> Result<PullRequest, ForgeError> {
        let path = self.repo_path(&format!("/pulls/{}", number))?;
        let body = json_body(&UpdateBaseBody { base })?;
        let data = self.call(Method::PATCH, &path, Some(&body)).await?;
        Ok(from_data::<GitHubPullRequest>(data, "pull request")?.into())
    }

    async fn description_template(&self) -> Result<Option<String>, ForgeError> {
        let (owner, name) = self.owner_and_name().await?;
        let query = format!(
            r#"query($owner: String!, $name: String!) {{
                repository(owner: $owner, name: $name) {{
                    object(expression: "{}") {{
                        ... on Blob {{ text }}
                    }}
                }}
            }}"#,
            TEMPLATE_EXPRESSION
        );
        let response = self
            .api
            .execute_graphql(&query, Some(json!({ "owner": owner, "name": name })))
            .await?;
        let data = self.report(response);
        Ok(data
            .pointer("/data/repository/object/text")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    head: &'a str,
    base: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    draft: bool,
}

/// Request body for changing a PR's base.
#[derive(Serialize)]
struct UpdateBaseBody<'a> {
    base: &'a str,
}

/// Request body for requesting reviewers.
#[derive(Serialize)]
struct RequestReviewersBody<'a> {
    reviewers: &'a [String],
}

/// GitHub user format.
#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

/// GitHub PR format, shared by the single and list endpoints.
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
    state: String,
    #[serde(default)]
    draft: bool,
    head: GitHubRef,
    base: GitHubRef,
    title: String,
    body: Option<String>,
    /// Only on the single-PR endpoint
    merged: Option<bool>,
    merged_at: Option<String>,
    user: Option<GitHubUser>,
}

/// GitHub ref (head/base) format.
#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

impl From<GitHubPullRequest> for PullRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        let state = if pr.merged.unwrap_or(false) || pr.merged_at.is_some() {
            PrState::Merged
        } else if pr.state == "closed" {
            PrState::Closed
        } else {
            PrState::Open
        };

        PullRequest {
            number: pr.number,
            url: pr.html_url,
            state,
            is_draft: pr.draft,
            head: pr.head.ref_name,
            base: pr.base.ref_name,
            title: pr.title,
            description: pr.body,
            author: pr.user.map(|u| u.login).unwrap_or_default(),
        }
    }
}
