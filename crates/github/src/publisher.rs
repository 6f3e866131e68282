use std::time::Duration;

use async_trait::async_trait;
use sitesmith_core::{GeneratedFileSet, PublishResult};

use crate::error::Result;

/// Hosting backend that turns a file set into a publicly served static site.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `files` as a brand-new project called `name`, replacing any
    /// project that already carries that name. Any file write failure aborts
    /// the whole call.
    async fn create_project(&self, name: &str, files: GeneratedFileSet) -> Result<PublishResult>;

    /// Overwrites or adds each file of `files` in the existing project `name`.
    async fn update_project(&self, name: &str, files: GeneratedFileSet) -> Result<PublishResult>;

    /// Polls `public_url` until it answers with a success status or `timeout`
    /// elapses. Never fails; unreachability is reported as `false`.
    async fn wait_until_live(&self, public_url: &str, timeout: Duration) -> bool;
}
