//! Turning task attachments into text the prompt and the site can carry.

use std::time::Duration;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use reqwest::Client;
use sitesmith_core::Attachment;
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote attachments larger than this are skipped.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Accepts payloads with or without trailing `=` padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttachment {
    pub name: String,
    pub content: String,
}

/// Decodes bytes as UTF-8, dropping invalid sequences instead of replacing
/// them.
pub fn utf8_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());

    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the very end.
                    None => return out,
                }
            }
        }
    }
}

/// Decodes a `data:` URI into text. Returns `None` when the URI has no `,`
/// separator or its base64 payload is malformed.
pub fn decode_data_uri(uri: &str) -> Option<String> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;

    if header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = LENIENT_BASE64.decode(cleaned.as_bytes()).ok()?;
        Some(utf8_ignoring_invalid(&bytes))
    } else {
        Some(payload.to_string())
    }
}

/// Resolves attachments to text. Inline `data:` URIs are decoded locally;
/// any other URL is fetched with a `GET`. Attachments that cannot be resolved
/// are skipped with a warning rather than failing the task.
#[derive(Clone)]
pub struct AttachmentResolver {
    client: Client,
    max_bytes: usize,
}

impl AttachmentResolver {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| OrchestratorError::Config(e.to_string()))?;
        Ok(Self {
            client,
            max_bytes: MAX_ATTACHMENT_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub async fn resolve(&self, attachments: &[Attachment]) -> Vec<DecodedAttachment> {
        let mut decoded = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            let name = attachment.name.trim().trim_start_matches('/');
            if name.is_empty() {
                warn!(url = %truncate(&attachment.url), "Skipping attachment without a name");
                continue;
            }

            let content = if attachment.is_data_uri() {
                let content = decode_data_uri(&attachment.url);
                if content.is_none() {
                    warn!(attachment = name, "Skipping attachment with malformed data URI");
                }
                content
            } else {
                self.fetch(name, &attachment.url).await
            };

            if let Some(content) = content {
                debug!(attachment = name, bytes = content.len(), "Resolved attachment");
                decoded.push(DecodedAttachment {
                    name: name.to_string(),
                    content,
                });
            }
        }

        decoded
    }

    async fn fetch(&self, name: &str, url: &str) -> Option<String> {
        info!(attachment = name, url, "Fetching remote attachment");

        let mut response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    attachment = name,
                    url,
                    error = %e,
                    "Failed to fetch attachment, skipping"
                );
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                attachment = name,
                url,
                status = status.as_u16(),
                "Attachment fetch returned error status, skipping"
            );
            return None;
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                warn!(
                    attachment = name,
                    url,
                    bytes = length,
                    max_bytes = self.max_bytes,
                    "Attachment too large, skipping"
                );
                return None;
            }
        }

        // The declared length may be absent or wrong.
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > self.max_bytes {
                        warn!(
                            attachment = name,
                            url,
                            max_bytes = self.max_bytes,
                            "Attachment too large, skipping"
                        );
                        return None;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => return Some(utf8_ignoring_invalid(&body)),
                Err(e) => {
                    warn!(
                        attachment = name,
                        url,
                        error = %e,
                        "Failed to read attachment body, skipping"
                    );
                    return None;
                }
            }
        }
    }
}

fn truncate(url: &str) -> &str {
    match url.char_indices().nth(64) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}
