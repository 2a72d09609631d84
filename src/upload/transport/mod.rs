//! Transport strategies: how one queue item is physically delivered.
//!
//! Two strategies exist. The streaming multipart transport observes byte
//! progress and honors cancellation; the framed transport emulates a
//! legacy form navigation into a hidden response frame and can signal
//! neither. Both expose the same completion contract, selected exactly
//! once at construction time and fixed for the instance's lifetime.

mod framed;
mod multipart;

pub use framed::{FrameRegistry, FramedTransport};
pub use multipart::MultipartTransport;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::TransportFailure;
use crate::upload::item::QueueItem;
use crate::upload::options::{Hooks, UploadOptions};

/// Terminal outcome of one submitted item. Exactly one is produced per
/// submission; on success the raw response text has been written into the
/// item (it may still be absent when the frame was unreadable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    Success,
    Failed(TransportFailure),
    Aborted,
}

/// Per-submission collaborators handed down by the queue manager.
pub struct SubmitContext<'a> {
    pub hooks: &'a Hooks,
    pub cancel: CancellationToken,
    pub frames: &'a FrameRegistry,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one item and report its terminal outcome. Progress
    /// notifications, where supported, fire before the outcome.
    async fn submit(&self, item: &mut QueueItem, ctx: SubmitContext<'_>) -> TransportOutcome;

    /// Whether this strategy produces byte-level progress.
    fn supports_progress(&self) -> bool;
}

/// Build the HTTP client, attempting cross-site credential inclusion when
/// asked. A builder failure is swallowed and the plain client is used.
fn client_for(options: &UploadOptions) -> reqwest::Client {
    if options.send_credentials {
        if let Ok(client) = reqwest::Client::builder().cookie_store(true).build() {
            return client;
        }
        tracing::debug!("credential-enabled client rejected by runtime, continuing without");
    }
    reqwest::Client::new()
}

/// Select the transport for an instance: streaming multipart unless the
/// legacy path is forced. Never re-evaluated mid-session.
pub fn select(options: &UploadOptions) -> Arc<dyn Transport> {
    let client = client_for(options);
    if options.force_framed {
        Arc::new(FramedTransport::new(client, options))
    } else {
        Arc::new(MultipartTransport::new(client, options))
    }
}
