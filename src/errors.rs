//! Failure taxonomy for the upload pipeline.
//!
//! Every failure is terminal for its own queue item; the queue always
//! proceeds. There is no retry policy anywhere in the crate.

use thiserror::Error;

/// Why a committed selection was rejected before touching the queue.
///
/// A batch is discarded in full: partial admission of a multi-file
/// selection is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Names that did not match the extension allow-list.
    pub wrong_type: Vec<String>,
    /// Names whose reported size exceeded the configured ceiling.
    pub oversize: Vec<String>,
}

impl ValidationFailure {
    pub fn is_empty(&self) -> bool {
        self.wrong_type.is_empty() && self.oversize.is_empty()
    }

    /// Comma-joined offending names, the shape the rejection hooks receive.
    pub fn joined_wrong_type(&self) -> String {
        self.wrong_type.join(",")
    }

    pub fn joined_oversize(&self) -> String {
        self.oversize.join(",")
    }
}

/// Wire-level failure reported by a transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("network failure: {0}")]
    Network(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("response frame unreadable")]
    UnreadableFrame,
}

/// Terminal error attached to a queue item before the error hook fires.
///
/// Validation rejections never produce one of these: a rejected selection
/// is discarded before a queue item exists, reported as a
/// `ValidationFailure` through the commit outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The transport could not deliver the item.
    #[error(transparent)]
    Transport(#[from] TransportFailure),
    /// Explicitly cancelled while in flight (streaming path only).
    #[error("upload aborted")]
    Aborted,
    /// The wire transfer succeeded but the response resolved to a falsy
    /// result after filtering and decoding.
    #[error("backend reported no usable result")]
    Application,
}
