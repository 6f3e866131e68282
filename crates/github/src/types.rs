use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_PAGES_HOST: &str = "github.io";
pub const DEFAULT_BRANCH: &str = "main";

/// Public Pages address of repository `name` owned by `owner`.
///
/// Known before anything is published, so callers can hand it out early.
pub fn pages_url(owner: &str, pages_host: &str, name: &str) -> String {
    format!("https://{}.{}/{}/", owner, pages_host, name)
}

pub fn create_message(path: &str) -> String {
    format!("Add {}", path)
}

pub fn update_message(path: &str) -> String {
    format!("Update {}", path)
}

/// Settings for [`crate::GitHubPublisher`].
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Account that owns the published repositories; must match the token.
    pub owner: String,
    pub pages_host: String,
    /// Branch Pages serves from.
    pub branch: String,
    /// Pause after deleting a repository before recreating it.
    pub delete_settle: Duration,
    /// Pause after enabling Pages so the site can be provisioned.
    pub pages_settle: Duration,
    /// Interval between liveness probes.
    pub poll_interval: Duration,
}

impl PublisherConfig {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            pages_host: DEFAULT_PAGES_HOST.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            delete_settle: Duration::from_secs(2),
            pages_settle: Duration::from_secs(5),
            poll_interval: Duration::from_secs(10),
        }
    }

    pub fn with_pages_host(mut self, host: impl Into<String>) -> Self {
        self.pages_host = host.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_settle_delays(mut self, delete_settle: Duration, pages_settle: Duration) -> Self {
        self.delete_settle = delete_settle;
        self.pages_settle = pages_settle;
        self
    }

    pub fn pages_url(&self, name: &str) -> String {
        pages_url(&self.owner, &self.pages_host, name)
    }

    pub fn repo_web_url(&self, name: &str) -> String {
        format!("https://github.com/{}/{}", self.owner, name)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRepoBody<'a> {
    pub name: &'a str,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}

impl<'a> CreateRepoBody<'a> {
    pub fn public(name: &'a str) -> Self {
        Self {
            name,
            description: format!("Auto-generated app for task {}", name),
            private: false,
            auto_init: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PagesSource<'a> {
    pub branch: &'a str,
    pub path: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnablePagesBody<'a> {
    pub source: PagesSource<'a>,
}
