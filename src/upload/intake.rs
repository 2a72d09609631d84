//! Selection intake: the thin surface where the host stages a file
//! selection before it is committed.
//!
//! Exactly one live intake exists per uploader instance. The framed
//! transport path physically consumes the staged selection into the
//! outgoing form, so the intake is recreated afterwards; the generation
//! counter tracks those recreations and the change handling is considered
//! re-armed on every bump.

use crate::upload::item::Selection;
use crate::upload::mime;
use crate::upload::options::UploadOptions;

#[derive(Debug)]
pub struct SelectionIntake {
    accept: Option<String>,
    multiple: bool,
    generation: u64,
    staged: Option<Selection>,
}

impl SelectionIntake {
    pub fn new(options: &UploadOptions) -> Self {
        // An explicit hint wins; otherwise the allow-list is resolved
        // against the MIME hint table.
        let accept = options.accept_hint.clone().or_else(|| {
            options
                .accept_types
                .as_deref()
                .and_then(mime::accept_hint)
        });
        Self {
            accept,
            multiple: options.multi_select,
            generation: 0,
            staged: None,
        }
    }

    /// Advisory accept string for the host's file picker.
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// How many times this intake has been recreated.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stage a selection, truncating to one file when multi-select is off.
    pub fn stage(&mut self, selection: Selection) {
        let selection = match selection {
            Selection::Files(mut files) if !self.multiple && files.len() > 1 => {
                files.truncate(1);
                Selection::Files(files)
            }
            other => other,
        };
        self.staged = Some(selection);
    }

    /// Consume the staged selection for commit.
    pub fn take(&mut self) -> Option<Selection> {
        self.staged.take()
    }

    /// Discard whatever is staged (validation rejected the batch).
    pub fn discard(&mut self) {
        self.staged = None;
    }

    /// Recreate the intake after the form path relocated its selection.
    pub fn recreate(&mut self) {
        self.staged = None;
        self.generation += 1;
    }
}
