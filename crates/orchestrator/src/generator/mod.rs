//! Content generation: prompt the model once and turn its answer into files.

pub mod attachments;
pub mod fences;
pub mod license;
pub mod prompts;

use std::sync::Arc;

use llm::CompletionModel;
use sitesmith_core::{
    Attachment, GeneratedFileSet, DOCUMENTATION_FILE, ENTRY_POINT_FILE, LICENSE_FILE,
};
use tracing::{info, warn};

use crate::error::Result;
use attachments::{AttachmentResolver, DecodedAttachment};
use fences::{first_block_tagged, parse_fenced_blocks};

const ENTRY_POINT_TAGS: &[&str] = &["html"];
const DOCUMENTATION_TAGS: &[&str] = &["markdown", "md"];

pub struct SiteGenerator {
    model: Arc<dyn CompletionModel>,
    resolver: AttachmentResolver,
}

impl SiteGenerator {
    pub fn new(model: Arc<dyn CompletionModel>) -> Result<Self> {
        Ok(Self {
            model,
            resolver: AttachmentResolver::new()?,
        })
    }

    /// Generates the site files for a task. Only a failed model call is an
    /// error; missing blocks in the answer just leave those files out.
    pub async fn generate(
        &self,
        brief: &str,
        checks: &[String],
        attachments: &[Attachment],
        task_id: &str,
    ) -> Result<GeneratedFileSet> {
        let decoded = self.resolver.resolve(attachments).await;
        let prompt = prompts::build_prompt(task_id, brief, checks, &decoded);

        info!(task_id, attachments = decoded.len(), "Calling language model");
        let response = self.model.complete(&prompt).await?;

        let files = assemble_files(&response, decoded);
        info!(task_id, files = files.len(), "Generated site files");
        Ok(files)
    }
}

/// Builds the file set from a model answer plus the resolved attachments.
pub fn assemble_files(response: &str, attachments: Vec<DecodedAttachment>) -> GeneratedFileSet {
    let blocks = parse_fenced_blocks(response);
    let mut files = GeneratedFileSet::new();

    match first_block_tagged(&blocks, ENTRY_POINT_TAGS) {
        Some(html) => {
            files.insert(ENTRY_POINT_FILE, html);
        }
        None => warn!("Model answer has no html block, {} omitted", ENTRY_POINT_FILE),
    }

    match first_block_tagged(&blocks, DOCUMENTATION_TAGS) {
        Some(readme) => {
            files.insert(DOCUMENTATION_FILE, readme);
        }
        None => warn!("Model answer has no markdown block, {} omitted", DOCUMENTATION_FILE),
    }

    files.insert(LICENSE_FILE, license::MIT_LICENSE);

    // Attachments win over anything the model produced under the same name.
    for attachment in attachments {
        files.insert(attachment.name, attachment.content);
    }

    files
}
