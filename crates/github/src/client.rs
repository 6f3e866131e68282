use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use octocrab::models::Repository;
use octocrab::Octocrab;
use sitesmith_core::{GeneratedFileSet, PublishResult};
use tracing::{debug, info, warn};

use crate::error::{GitHubError, Result};
use crate::liveness::{wait_until_live, HttpProbe, LivenessProbe, DEFAULT_PROBE_TIMEOUT};
use crate::publisher::Publisher;
use crate::types::{
    create_message, update_message, CreateRepoBody, EnablePagesBody, PagesSource,
    PublisherConfig,
};

pub struct GitHubPublisher {
    octocrab: Octocrab,
    config: PublisherConfig,
    probe: Arc<dyn LivenessProbe>,
}

impl GitHubPublisher {
    pub fn new(token: &str, config: PublisherConfig) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;
        Self::from_octocrab(octocrab, config)
    }

    /// Talks to the API at `base_uri` instead of `api.github.com`, e.g. a
    /// GitHub Enterprise host.
    pub fn with_base_uri(token: &str, config: PublisherConfig, base_uri: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(base_uri)
            .map_err(|e| GitHubError::Config(e.to_string()))?
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;
        Self::from_octocrab(octocrab, config)
    }

    fn from_octocrab(octocrab: Octocrab, config: PublisherConfig) -> Result<Self> {
        if config.owner.trim().is_empty() {
            return Err(GitHubError::Config("Repository owner is empty".to_string()));
        }

        let probe = Arc::new(HttpProbe::new(DEFAULT_PROBE_TIMEOUT)?);

        Ok(Self {
            octocrab,
            config,
            probe,
        })
    }

    pub fn with_probe(mut self, probe: Arc<dyn LivenessProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }
}

impl GitHubPublisher {
    /// Deletes `name` when it exists. Failures are logged, never returned.
    async fn delete_if_exists(&self, name: &str) {
        let repos = self.octocrab.repos(&self.config.owner, name);

        match repos.get().await {
            Ok(_) => {
                warn!("Repository {} already exists, deleting", name);
                if let Err(e) = repos.delete().await {
                    warn!("Failed to delete repository {}: {}", name, e);
                }
                tokio::time::sleep(self.config.delete_settle).await;
            }
            Err(_) => debug!("Repository {} does not exist yet", name),
        }
    }

    async fn create_repository(&self, name: &str) -> Result<Repository> {
        info!("Creating repository: {}", name);

        let repo: Repository = self
            .octocrab
            .post("/user/repos", Some(&CreateRepoBody::public(name)))
            .await?;

        Ok(repo)
    }

    async fn get_repository(&self, name: &str) -> Result<Repository> {
        self.octocrab
            .repos(&self.config.owner, name)
            .get()
            .await
            .map_err(|e| {
                debug!("Repository lookup failed: {}", e);
                GitHubError::RepoNotFound {
                    owner: self.config.owner.clone(),
                    repo: name.to_string(),
                }
            })
    }

    async fn create_file(&self, name: &str, path: &str, content: &str) -> Result<()> {
        self.octocrab
            .repos(&self.config.owner, name)
            .create_file(path, create_message(path), content)
            .send()
            .await
            .map_err(|e| GitHubError::FileWrite {
                path: path.to_string(),
                reason: GitHubError::from(e).to_string(),
            })?;

        info!("Added {}", path);
        Ok(())
    }

    async fn update_file(&self, name: &str, path: &str, content: &str, sha: &str) -> Result<()> {
        self.octocrab
            .repos(&self.config.owner, name)
            .update_file(path, update_message(path), content, sha)
            .send()
            .await
            .map_err(|e| GitHubError::FileWrite {
                path: path.to_string(),
                reason: GitHubError::from(e).to_string(),
            })?;

        info!("Updated {}", path);
        Ok(())
    }

    /// Blob SHA of `path`, or `None` when the file does not exist.
    async fn current_file_sha(&self, name: &str, path: &str) -> Option<String> {
        match self
            .octocrab
            .repos(&self.config.owner, name)
            .get_content()
            .path(path)
            .send()
            .await
        {
            Ok(contents) => contents.items.into_iter().next().map(|item| item.sha),
            Err(e) => {
                debug!("No existing {} in {}: {}", path, name, e);
                None
            }
        }
    }

    /// Enables Pages for `name`. 201 and 409 (already enabled) both count as
    /// success; anything else is logged and tolerated.
    async fn enable_pages(&self, name: &str) {
        info!("Enabling GitHub Pages for {}", name);

        let route = format!("/repos/{}/{}/pages", self.config.owner, name);
        let body = EnablePagesBody {
            source: PagesSource {
                branch: &self.config.branch,
                path: "/",
            },
        };

        match self.octocrab._post(route, Some(&body)).await {
            Ok(response) => match response.status().as_u16() {
                201 | 409 => info!("GitHub Pages enabled"),
                status => warn!("Unexpected Pages response status: {}", status),
            },
            Err(e) => warn!("Error enabling Pages (may already be enabled): {}", e),
        }

        tokio::time::sleep(self.config.pages_settle).await;
    }

    async fn latest_commit_sha(&self, name: &str) -> Result<String> {
        let page = self
            .octocrab
            .repos(&self.config.owner, name)
            .list_commits()
            .per_page(1)
            .send()
            .await?;

        page.items
            .into_iter()
            .next()
            .map(|commit| commit.sha)
            .ok_or_else(|| GitHubError::NoCommits(name.to_string()))
    }

    async fn publish_result(&self, name: &str, repo: &Repository) -> Result<PublishResult> {
        let revision_id = self.latest_commit_sha(name).await?;
        let project_url = repo
            .html_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| self.config.repo_web_url(name));

        Ok(PublishResult {
            project_url,
            revision_id,
            public_url: self.config.pages_url(name),
        })
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    async fn create_project(&self, name: &str, files: GeneratedFileSet) -> Result<PublishResult> {
        self.delete_if_exists(name).await;

        let repo = self.create_repository(name).await?;

        info!("Adding {} files to {}", files.len(), name);
        for (path, content) in files {
            self.create_file(name, &path, &content).await?;
        }

        self.enable_pages(name).await;

        self.publish_result(name, &repo).await
    }

    async fn update_project(&self, name: &str, files: GeneratedFileSet) -> Result<PublishResult> {
        let repo = self.get_repository(name).await?;
        info!("Updating repository: {}", name);

        for (path, content) in files {
            match self.current_file_sha(name, &path).await {
                Some(sha) => self.update_file(name, &path, &content, &sha).await?,
                None => self.create_file(name, &path, &content).await?,
            }
        }

        self.publish_result(name, &repo).await
    }

    async fn wait_until_live(&self, public_url: &str, timeout: Duration) -> bool {
        info!("Waiting for {} to go live", public_url);
        wait_until_live(
            self.probe.as_ref(),
            public_url,
            timeout,
            self.config.poll_interval,
        )
        .await
    }
}
