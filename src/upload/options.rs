//! Configuration surface for one uploader instance.
//!
//! Options are immutable once the instance is built. Extension points live
//! in an explicit optional-handler map so "no handler configured" and
//! "handler declined" stay distinguishable.

use std::fmt;
use std::sync::Arc;

use crate::upload::item::{QueueItem, TransferState};

/// How a success response body is interpreted before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Attempt a JSON decode; a decode failure degrades to an empty object.
    #[default]
    Structured,
    /// Hand the raw text through untouched.
    Raw,
}

/// What a new committed selection does to the existing queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePolicy {
    /// Append to the tail; items upload in commit order.
    #[default]
    Append,
    /// Discard the queued tail and start a fresh one-item queue. An item
    /// already in flight keeps running to its terminal outcome.
    Replace,
}

pub type ItemHook = Arc<dyn Fn(&QueueItem) + Send + Sync>;
pub type EnqueueHook = Arc<dyn Fn(&mut QueueItem) -> bool + Send + Sync>;
pub type FilterHook = Arc<dyn Fn(&QueueItem) -> String + Send + Sync>;
pub type ProgressHook = Arc<dyn Fn(&TransferState) + Send + Sync>;
pub type NamesHook = Arc<dyn Fn(&str) + Send + Sync>;
pub type TriggerHook = Arc<dyn Fn() + Send + Sync>;

/// Optional-handler map covering every extension point.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Receives the fully-formed item before it joins the queue and may
    /// veto admission by returning `false`. The only gate beyond the
    /// validator; the hook may also stage extra form fields on the item.
    pub pre_enqueue: Option<EnqueueHook>,
    /// Transforms the raw response before decoding is finalized.
    pub response_filter: Option<FilterHook>,
    /// Terminal success (the decoded result was truthy).
    pub on_done: Option<ItemHook>,
    /// Transport failure, non-success status, or falsy decoded result.
    pub on_error: Option<ItemHook>,
    /// Explicit cancellation, streaming path only.
    pub on_abort: Option<ItemHook>,
    /// Byte-level progress, streaming path only.
    pub on_progress: Option<ProgressHook>,
    /// Extension rejection; receives the offending names comma-joined.
    pub on_accept_error: Option<NamesHook>,
    /// Size-ceiling rejection; receives the offending names comma-joined.
    pub on_oversize: Option<NamesHook>,
    /// Manual trigger pressed while no valid selection is staged.
    pub on_trigger_error: Option<TriggerHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_enqueue", &self.pre_enqueue.is_some())
            .field("response_filter", &self.response_filter.is_some())
            .field("on_done", &self.on_done.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_abort", &self.on_abort.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_accept_error", &self.on_accept_error.is_some())
            .field("on_oversize", &self.on_oversize.is_some())
            .field("on_trigger_error", &self.on_trigger_error.is_some())
            .finish()
    }
}

/// Full configuration for one uploader instance.
#[derive(Clone, Debug)]
pub struct UploadOptions {
    /// Field name the files are transmitted under.
    pub field_name: String,
    /// Destination endpoint for the upload request.
    pub endpoint: String,
    /// Force the legacy framed transport even though streaming is available.
    pub force_framed: bool,
    /// Keep response frames and forms after completion, for diagnostics.
    pub keep_frames: bool,
    /// Best-effort cross-site credential inclusion. Setup failures are
    /// swallowed, not surfaced.
    pub send_credentials: bool,
    /// Append vs replace-on-new-selection.
    pub queue_policy: QueuePolicy,
    /// Submit automatically on a valid commit; otherwise a manual trigger
    /// drives submission.
    pub auto_submit: bool,
    /// Whether a manual trigger control exists for this instance.
    pub manual_trigger: bool,
    /// Class name the host applies to a disabled manual trigger.
    pub disabled_class: String,
    /// How success payloads are interpreted.
    pub decode_mode: DecodeMode,
    /// Comma-separated extension allow-list, e.g. `"jpg,png"`.
    pub accept_types: Option<String>,
    /// Explicit advisory accept value; wins over the hint table.
    pub accept_hint: Option<String>,
    /// Allow committing more than one file per selection.
    pub multi_select: bool,
    /// Size ceiling in megabytes.
    pub max_file_size_mb: Option<u64>,
    /// Extension points.
    pub hooks: Hooks,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            field_name: String::new(),
            endpoint: String::new(),
            force_framed: false,
            keep_frames: false,
            send_credentials: false,
            queue_policy: QueuePolicy::Append,
            auto_submit: true,
            manual_trigger: false,
            disabled_class: "disabled".to_string(),
            decode_mode: DecodeMode::Structured,
            accept_types: None,
            accept_hint: None,
            multi_select: false,
            max_file_size_mb: None,
            hooks: Hooks::default(),
        }
    }
}

impl UploadOptions {
    /// Minimal useful configuration: a field name and an endpoint.
    pub fn new(field_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}
