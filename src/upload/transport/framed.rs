//! Legacy framed transport: a synthetic form posted into a hidden,
//! uniquely named response frame.
//!
//! The response document is parked in the frame slot and its body text is
//! scraped for the pipeline; when a response filter is configured the full
//! document is kept instead, since filters may need markup the body
//! extraction would strip. The frame and the form are torn down on every
//! outcome unless `keep_frames` asks for diagnostics artifacts. HTTP
//! status is not observable on this path and there is no abort signal:
//! only success and failure exist, and failure means the response frame
//! could not be read.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::TransportFailure;
use crate::upload::item::{Payload, QueueItem};
use crate::upload::options::UploadOptions;
use crate::upload::transport::{SubmitContext, Transport, TransportOutcome};

/// Captured response document of one framed submission.
#[derive(Debug, Clone, Default)]
pub struct FrameDoc {
    pub document: Option<String>,
}

/// Document-scoped registry of hidden response frames. Each uploader
/// instance owns its registry; no instance touches another's frames.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    frames: DashMap<String, FrameDoc>,
}

impl FrameRegistry {
    fn acquire(&self) -> String {
        let name = format!("upload-frame-{}", Uuid::new_v4().simple());
        self.frames.insert(name.clone(), FrameDoc::default());
        name
    }

    fn store(&self, name: &str, document: String) {
        if let Some(mut slot) = self.frames.get_mut(name) {
            slot.document = Some(document);
        }
    }

    fn remove(&self, name: &str) {
        self.frames.remove(name);
    }

    /// Diagnostics access to a kept frame.
    pub fn get(&self, name: &str) -> Option<FrameDoc> {
        self.frames.get(name).map(|slot| slot.clone())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Removes the frame on every exit path unless artifacts are kept.
struct FrameGuard<'a> {
    registry: &'a FrameRegistry,
    name: String,
    keep: bool,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.keep {
            self.registry.remove(&self.name);
        }
    }
}

/// Inner HTML of the document's `<body>`, or the whole document when no
/// body markup is present (plain-text backends).
fn extract_body_text(document: &str) -> String {
    let lower = document.to_ascii_lowercase();
    let Some(open) = lower.find("<body") else {
        return document.to_string();
    };
    let Some(open_end) = lower[open..].find('>') else {
        return document.to_string();
    };
    let content_start = open + open_end + 1;
    let content_end = lower[content_start..]
        .find("</body>")
        .map_or(document.len(), |i| content_start + i);
    document[content_start..content_end].trim().to_string()
}

pub struct FramedTransport {
    client: reqwest::Client,
    endpoint: String,
    keep_frames: bool,
}

impl FramedTransport {
    pub fn new(client: reqwest::Client, options: &UploadOptions) -> Self {
        Self {
            client,
            endpoint: options.endpoint.clone(),
            keep_frames: options.keep_frames,
        }
    }
}

#[async_trait]
impl Transport for FramedTransport {
    async fn submit(&self, item: &mut QueueItem, ctx: SubmitContext<'_>) -> TransportOutcome {
        let (content_type, body) = match &item.payload {
            Payload::Form(payload) => payload.encode(),
            Payload::Multipart(payload) => payload.encode(),
        };

        let frame_name = ctx.frames.acquire();
        item.frame_name = Some(frame_name.clone());
        let _guard = FrameGuard {
            registry: ctx.frames,
            name: frame_name.clone(),
            keep: self.keep_frames,
        };

        let document = match self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
        {
            Ok(response) => match response.text().await {
                Ok(text) => Some(text),
                Err(err) => {
                    tracing::debug!(error = %err, "frame document unreadable");
                    None
                }
            },
            Err(err) => {
                tracing::debug!(error = %err, "framed submission failed");
                None
            }
        };

        // The form is emptied alongside the frame removal.
        if !self.keep_frames {
            if let Some(form) = item.payload.as_form_mut() {
                form.clear();
            }
        }

        // An unreadable frame is a wire-level failure; the response stays
        // unset and the pipeline never runs for this item.
        let Some(document) = document else {
            return TransportOutcome::Failed(TransportFailure::UnreadableFrame);
        };

        ctx.frames.store(&frame_name, document.clone());
        item.raw_response = Some(if ctx.hooks.response_filter.is_some() {
            document
        } else {
            extract_body_text(&document)
        });

        TransportOutcome::Success
    }

    fn supports_progress(&self) -> bool {
        false
    }
}
