// fisand-net/src/gitlab.rs
//! GitLab v4 repository API: tree listings, file contents and group projects.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fisand_common::config::Config;
use fisand_common::error::{FisandError, Result};
use fisand_common::model::{EntryKind, FetchTarget, Project, TreeEntry};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::http::{build_http_client, get_checked, next_page};
use crate::remote::RemoteRepository;
use crate::validation::validate_host_url;

const PER_PAGE: u32 = 100;

/// Body of `GET /projects/:id/repository/files/:path`.
#[derive(Debug, Deserialize)]
pub struct FileResponse {
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileResponse {
    /// Decodes `content`, which GitLab sends base64 encoded unless told otherwise.
    pub fn decode(&self, file_path: &str) -> Result<Vec<u8>> {
        if self.encoding.as_deref() == Some("text") {
            return Ok(self.content.clone().into_bytes());
        }
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map_err(|e| FisandError::Decode(file_path.to_string(), e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    host: Url,
    project_id: Option<u64>,
}

impl GitLabClient {
    /// Builds a client from the configuration snapshot.
    ///
    /// Fails with a `Config` error when the token is missing, before any
    /// request is made.
    pub fn new(config: &Config) -> Result<Self> {
        let host = validate_host_url(&config.host)?;
        let client = build_http_client(config.token()?)?;
        Ok(Self {
            client,
            host,
            project_id: config.project_id,
        })
    }

    pub fn with_project(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn project_id(&self) -> Result<u64> {
        self.project_id.ok_or_else(|| {
            FisandError::Config("Workspace project has not been resolved".to_string())
        })
    }

    /// `{host}/api/v4/<segments>`; each segment is percent-encoded on its own,
    /// so a file path segment keeps its slashes encoded as `%2F`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FisandError::Validation(format!("Host URL {} cannot be a base", self.host))
            })?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments);
        Ok(url)
    }

    pub fn tree_url(&self, target: &FetchTarget, page: u32) -> Result<Url> {
        let project_id = self.project_id()?.to_string();
        let mut url = self.endpoint(&["projects", &project_id, "repository", "tree"])?;
        url.query_pairs_mut()
            .append_pair("path", &target.remote_path())
            .append_pair("ref", &target.reference)
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    pub fn file_url(&self, file_path: &str, reference: &str) -> Result<Url> {
        let project_id = self.project_id()?.to_string();
        let mut url =
            self.endpoint(&["projects", &project_id, "repository", "files", file_path])?;
        url.query_pairs_mut().append_pair("ref", reference);
        Ok(url)
    }

    pub fn group_projects_url(&self, group_id: &str, page: u32) -> Result<Url> {
        let mut url = self.endpoint(&["groups", group_id, "projects"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Fetches every page of a paginated listing, following `x-next-page`.
    async fn get_all_pages<T, F>(&self, url_for_page: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(u32) -> Result<Url>,
    {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let url = url_for_page(page)?;
            let response = get_checked(&self.client, url.clone()).await?;
            let next = next_page(response.headers());
            let mut batch: Vec<T> = response
                .json()
                .await
                .map_err(|e| FisandError::Decode(url.to_string(), e.to_string()))?;
            items.append(&mut batch);
            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn list_group_projects(&self, group_id: &str) -> Result<Vec<Project>> {
        let projects = self
            .get_all_pages(|page| self.group_projects_url(group_id, page))
            .await?;
        debug!("Group {} has {} projects", group_id, projects.len());
        Ok(projects)
    }

    /// Id of the group project named `workspace`.
    pub async fn resolve_project_id(&self, group_id: &str, workspace: &str) -> Result<u64> {
        let projects = self.list_group_projects(group_id).await?;
        projects
            .iter()
            .find(|p| p.name == workspace)
            .map(|p| p.id)
            .ok_or_else(|| {
                FisandError::Config(format!(
                    "Workspace '{workspace}' is not a project of group {group_id}"
                ))
            })
    }

    /// Names of the modules available under the package root at `reference`.
    pub async fn list_modules(&self, reference: &str) -> Result<Vec<String>> {
        let root = FetchTarget::new("", Some(reference));
        let entries = self.list_tree(&root).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::Tree)
            .map(|e| e.name)
            .collect())
    }
}

#[async_trait]
impl RemoteRepository for GitLabClient {
    async fn list_tree(&self, target: &FetchTarget) -> Result<Vec<TreeEntry>> {
        debug!("Listing tree {}", target);
        self.get_all_pages(|page| self.tree_url(target, page)).await
    }

    async fn fetch_file(&self, file_path: &str, reference: &str) -> Result<Vec<u8>> {
        debug!("Fetching file {} at {}", file_path, reference);
        let url = self.file_url(file_path, reference)?;
        let response = get_checked(&self.client, url.clone()).await?;
        let body: FileResponse = response
            .json()
            .await
            .map_err(|e| FisandError::Decode(url.to_string(), e.to_string()))?;
        body.decode(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> GitLabClient {
        let mut config = Config::new("/work");
        config.host = host.to_string();
        config.token = Some("glpat-test".to_string());
        GitLabClient::new(&config).unwrap().with_project(42)
    }

    #[test]
    fn new_requires_token() {
        let err = GitLabClient::new(&Config::new("/work")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn tree_url_targets_package_path() {
        let target = FetchTarget::new("ui/src", Some("v2"));
        let url = client("https://gitlab.com").tree_url(&target, 2).unwrap();
        assert_eq!(url.path(), "/api/v4/projects/42/repository/tree");
        assert_eq!(
            url.query(),
            Some("path=packages%2Fui%2Fsrc&ref=v2&per_page=100&page=2")
        );
    }

    #[test]
    fn file_url_encodes_path_as_one_segment() {
        let url = client("https://git.example.com/")
            .file_url("packages/ui/package.json", "master")
            .unwrap();
        assert_eq!(
            url.path(),
            "/api/v4/projects/42/repository/files/packages%2Fui%2Fpackage.json"
        );
        assert_eq!(url.query(), Some("ref=master"));
    }

    #[test]
    fn endpoint_keeps_host_subpath() {
        let url = client("https://example.com/gitlab")
            .group_projects_url("7", 1)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/gitlab/api/v4/groups/7/projects?per_page=100&page=1"
        );
    }

    #[test]
    fn urls_need_resolved_project() {
        let mut config = Config::new("/work");
        config.token = Some("t".to_string());
        let unresolved = GitLabClient::new(&config).unwrap();
        assert!(unresolved.file_url("packages/ui/a.ts", "master").is_err());
    }

    #[test]
    fn file_content_is_base64_decoded() {
        let body: FileResponse = serde_json::from_str(
            r#"{"file_name": "index.ts", "encoding": "base64", "content": "ZXhwb3J0IHt9\nCg=="}"#,
        )
        .unwrap();
        assert_eq!(body.decode("index.ts").unwrap(), b"export {}\n");
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let body = FileResponse {
            content: "%%%".to_string(),
            encoding: None,
        };
        assert!(matches!(
            body.decode("index.ts"),
            Err(FisandError::Decode(_, _))
        ));
    }
}
