#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use uplift::errors::TransportFailure;
use uplift::upload::item::{QueueItem, Selection, StagedFile, TransferState};
use uplift::upload::options::{Hooks, UploadOptions};
use uplift::upload::transport::{SubmitContext, Transport, TransportOutcome};

/// One staged file of the given size.
pub fn staged(name: &str, size: usize) -> StagedFile {
    StagedFile::new(name, Bytes::from(vec![b'x'; size]))
}

pub fn selection(names: &[&str]) -> Selection {
    Selection::Files(names.iter().map(|n| staged(n, 8)).collect())
}

/// Options wired to a throwaway endpoint; tests relying on real HTTP
/// override the endpoint with their server address.
pub fn test_options() -> UploadOptions {
    UploadOptions::new("attachment", "http://127.0.0.1:0/upload")
}

/// Everything the hook recorder observes, in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Done(Vec<String>),
    Error(Vec<String>),
    Abort(Vec<String>),
    Progress(TransferState),
    AcceptError(String),
    Oversize(String),
    TriggerError,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Hooks that record every dispatch into a shared log.
pub fn recording_hooks() -> (Hooks, EventLog) {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = Hooks::default();

    let l = Arc::clone(&log);
    hooks.on_done = Some(Arc::new(move |item: &QueueItem| {
        l.lock().unwrap().push(Event::Done(item.file_names.clone()));
    }));
    let l = Arc::clone(&log);
    hooks.on_error = Some(Arc::new(move |item: &QueueItem| {
        l.lock().unwrap().push(Event::Error(item.file_names.clone()));
    }));
    let l = Arc::clone(&log);
    hooks.on_abort = Some(Arc::new(move |item: &QueueItem| {
        l.lock().unwrap().push(Event::Abort(item.file_names.clone()));
    }));
    let l = Arc::clone(&log);
    hooks.on_progress = Some(Arc::new(move |state: &TransferState| {
        l.lock().unwrap().push(Event::Progress(*state));
    }));
    let l = Arc::clone(&log);
    hooks.on_accept_error = Some(Arc::new(move |names: &str| {
        l.lock().unwrap().push(Event::AcceptError(names.to_string()));
    }));
    let l = Arc::clone(&log);
    hooks.on_oversize = Some(Arc::new(move |names: &str| {
        l.lock().unwrap().push(Event::Oversize(names.to_string()));
    }));
    let l = Arc::clone(&log);
    hooks.on_trigger_error = Some(Arc::new(move || {
        l.lock().unwrap().push(Event::TriggerError);
    }));

    (hooks, log)
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

/// Scripted behavior for one mock submission.
#[derive(Debug, Clone)]
pub enum Script {
    /// Terminal success with the given raw response text.
    Success(String),
    /// Terminal transport failure.
    Fail(TransportFailure),
    /// Never resolves: a stalled network request.
    Stall,
    /// Pends until the submission is cancelled, then reports the abort.
    AbortOnCancel,
}

/// Transport double that records every submission and plays back a
/// scripted outcome per item (defaulting to `{"ok":true}` success).
pub struct MockTransport {
    script: Mutex<VecDeque<Script>>,
    submitted: Mutex<Vec<Vec<String>>>,
}

impl MockTransport {
    pub fn scripted(script: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            submitted: Mutex::new(Vec::new()),
        })
    }

    pub fn always_ok() -> Arc<Self> {
        Self::scripted([])
    }

    /// File names of every submission, in submission order.
    pub fn submissions(&self) -> Vec<Vec<String>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn submit(&self, item: &mut QueueItem, ctx: SubmitContext<'_>) -> TransportOutcome {
        self.submitted.lock().unwrap().push(item.file_names.clone());

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Success("{\"ok\":true}".to_string()));

        match step {
            Script::Success(text) => {
                item.raw_response = Some(text);
                TransportOutcome::Success
            }
            Script::Fail(failure) => TransportOutcome::Failed(failure),
            Script::Stall => {
                std::future::pending::<()>().await;
                unreachable!("stalled submission never resolves")
            }
            Script::AbortOnCancel => {
                ctx.cancel.cancelled().await;
                TransportOutcome::Aborted
            }
        }
    }

    fn supports_progress(&self) -> bool {
        true
    }
}
