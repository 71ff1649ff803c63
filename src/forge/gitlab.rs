//! forge::gitlab
//!
//! GitLab provider client.
//!
//! # Design
//!
//! Same shape as the GitHub client: resolve the project base path, make one
//! executor call, map the JSON. GitLab calls change requests "merge
//! requests" and numbers them by project-scoped `iid`.
//!
//! The project is addressed as `/projects/{id}` when the numeric id is
//! known, otherwise as `/projects/{namespace%2Fpath}`. Drafts are expressed
//! with the `Draft: ` title prefix.
//!
//! GitLab never renumbers renamed projects under `/repositories/<id>`, so a
//! 307 from GitLab is reported as an unexpected error by the executor.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::executor::{from_data, json_body, ApiClient, ApiResponse};
use super::platform::{Domain, Platform};
use super::project::ProjectRef;
use super::traits::{CreatePrRequest, Forge, ForgeError, PrState, PullRequest};
use crate::ui::output::{self, Verbosity};

/// Repository file holding the default merge request description.
const TEMPLATE_PATH: &str = ".gitlab/merge_request_templates/Default.md";

/// Title prefix marking a merge request as draft.
const DRAFT_PREFIX: &str = "Draft: ";

/// GitLab forge implementation.
#[derive(Debug)]
pub struct GitLabForge {
    api: ApiClient,
    project: ProjectRef,
    verbosity: Verbosity,
}

impl GitLabForge {
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

    /// The project this client targets.
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// `namespace/path` of the project, looked up by id if needed.
    pub async fn project_full_path(&self) -> Result<String, ForgeError> {
        if let Some(full) = self.project.full_path() {
            return Ok(full);
        }
        let Some(id) = &self.project.id else {
            return Err(self.project.addressing_error(Platform::GitLab));
        };
        let data = self
            .call(Method::GET, &format!("/projects/{}", id), None)
            .await?;
        let project: GitLabProject = from_data(data, "project")?;
        Ok(project.path_with_namespace)
    }

    fn project_path(&self, suffix: &str) -> Result<String, ForgeError> {
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

    fn report(&self, response: ApiResponse) -> Value {
        for warning in &response.warnings {
            output::warn(warning, self.verbosity);
        }
        response.data
    }
}

#[async_trait]
impl Forge for GitLabForge {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn domain(&self) -> &Domain {
        self.api.domain()
    }

    async fn current_user_login(&self) -> Result<Option<String>, ForgeError> {
        if self.api.token().is_none() {
            return Ok(None);
        }
        let data = self.call(Method::GET, "/user", None).await?;
        let user: GitLabUser = from_data(data, "user")?;
        Ok(Some(user.username))
    }

    async fn create_pull_request(
        &self,
        request: CreatePrRequest,
    ) -> Result<PullRequest, ForgeError> {
        let path = self.project_path("/merge_requests")?;
        let title = if request.draft {
            format!("{}{}", DRAFT_PREFIX, request.title)
        } else {
            request.title
        };
        let body = json_body(&CreateMrBody {
            source_branch: &request.head,
            target_branch: &request.base,
            title: &title,
            description: request.description.as_deref(),
        })?;
        let data = self.call(Method::POST, &path, Some(&body)).await?;
        Ok(from_data::<GitLabMergeRequest>(data, "merge request")?.into())
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError> {
        let path = self.project_path(&format!("/merge_requests/{}", number))?;
        let data = self.call(Method::GET, &path, None).await?;
        Ok(from_data::<GitLabMergeRequest>(data, "merge request")?.into())
    }

    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        let path = self.project_path("/merge_requests?state=opened&per_page=100")?;
        let data = self.call(Method::GET, &path, None).await?;
        let mrs: Vec<GitLabMergeRequest> = from_data(data, "merge request list")?;
        Ok(mrs.into_iter().map(PullRequest::from).collect())
    }

    async fn retarget_pull_request(
        &self,
        number: u64,
        base: &str,
    ) -> Result<PullRequest, ForgeError> {
        let path = self.project_path(&format!("/merge_requests/{}", number))?;
        let body = json_body(&UpdateTargetBody {
            target_branch: base,
        })?;
        let data = self.call(Method::PUT, &path, Some(&body)).await?;
        Ok(from_data::<GitLabMergeRequest>(data, "merge request")?.into())
    }

    async fn description_template(&self) -> Result<Option<String>, ForgeError> {
        let full_path = self.project_full_path().await?;
        let query = format!(
            r#"query($fullPath: ID!) {{
                project(fullPath: $fullPath) {{
                    repository {{
                        blobs(paths: ["{}"]) {{
                            nodes {{ rawTextBlob }}
                        }}
                    }}
                }}
            }}"#,
            TEMPLATE_PATH
        );
        let response = self
            .api
            .execute_graphql(&query, Some(json!({ "fullPath": full_path })))
            .await?;
        let data = self.report(response);
        Ok(data
            .pointer("/data/project/repository/blobs/nodes/0/rawTextBlob")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating an MR.
#[derive(Serialize)]
struct CreateMrBody<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Request body for changing an MR's target.
#[derive(Serialize)]
struct UpdateTargetBody<'a> {
    target_branch: &'a str,
}

#[derive(Deserialize)]
struct GitLabUser {
    username: String,
}

#[derive(Deserialize)]
struct GitLabProject {
    path_with_namespace: String,
}

/// GitLab MR format.
#[derive(Deserialize)]
struct GitLabMergeRequest {
    iid: u64,
    web_url: String,
    state: String,
    #[serde(default)]
    draft: bool,
    /// Older instances only report this
    #[serde(default)]
    work_in_progress: bool,
    source_branch: String,
    target_branch: String,
    title: String,
    description: Option<String>,
    author: Option<GitLabUser>,
}

impl From<GitLabMergeRequest> for PullRequest {
    fn from(mr: GitLabMergeRequest) -> Self {
        let state = match mr.state.as_str() {
            "merged" => PrState::Merged,
            "closed" | "locked" => PrState::Closed,
            _ => PrState::Open,
        };

        PullRequest {
            number: mr.iid,
            url: mr.web_url,
            state,
            is_draft: mr.draft || mr.work_in_progress,
            head: mr.source_branch,
            base: mr.target_branch,
            title: mr.title,
            description: mr.description,
            author: mr.author.map(|a| a.username).unwrap_or_default(),
        }
    }
}
