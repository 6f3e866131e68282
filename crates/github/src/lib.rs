//! Publishing generated sites to GitHub repositories served by GitHub Pages.

pub mod client;
pub mod error;
pub mod liveness;
pub mod publisher;
pub mod types;

pub use client::GitHubPublisher;
pub use error::{GitHubError, Result};
pub use liveness::{wait_until_live, HttpProbe, LivenessProbe, ProbeOutcome};
pub use publisher::Publisher;
pub use types::{pages_url, PublisherConfig};
