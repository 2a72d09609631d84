//! Queued multi-file upload component.
//!
//! One `Uploader` instance owns an ordered FIFO queue of committed file
//! selections and drives them through a transport selected once at
//! construction. At most one item is ever in flight; completion advances
//! the queue and immediately submits the next head, so callbacks fire in
//! strict commit order. Instances bound to different keys are fully
//! independent.

pub mod intake;
pub mod item;
pub mod mime;
pub mod options;
pub mod response;
pub mod transport;
pub mod validate;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::errors::{UploadError, ValidationFailure};
use crate::upload::intake::SelectionIntake;
use crate::upload::item::{build_item, enqueue, QueueItem, Selection};
use crate::upload::options::UploadOptions;
use crate::upload::transport::{FrameRegistry, SubmitContext, Transport, TransportOutcome};
use crate::upload::validate::{Policy, Verdict};

/// What happened to a committed selection before any transport ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Admitted and queued (and possibly already submitted).
    Enqueued,
    /// Discarded in full by the validator; the queue was not touched.
    Rejected(ValidationFailure),
    /// Admitted by the validator but declined by the pre-enqueue hook.
    Vetoed,
    /// Nothing was selected.
    Empty,
}

struct Inner {
    options: UploadOptions,
    transport: Arc<dyn Transport>,
    queue: Mutex<VecDeque<QueueItem>>,
    /// The sole concurrency gate: true while one item is in flight.
    in_flight: AtomicBool,
    abort: Mutex<Option<CancellationToken>>,
    trigger_armed: AtomicBool,
    intake: Mutex<SelectionIntake>,
    frames: FrameRegistry,
}

/// Cheap-clone handle over one upload component instance.
#[derive(Clone)]
pub struct Uploader {
    inner: Arc<Inner>,
}

impl Uploader {
    /// Build an instance; the transport strategy is fixed here for the
    /// instance's lifetime and never re-evaluated.
    pub fn new(options: UploadOptions) -> Self {
        let transport = transport::select(&options);
        Self::with_transport(options, transport)
    }

    /// Build an instance around an externally supplied transport. This is
    /// the seam the contract tests script outcomes through.
    pub fn with_transport(options: UploadOptions, transport: Arc<dyn Transport>) -> Self {
        let intake = SelectionIntake::new(&options);
        Self {
            inner: Arc::new(Inner {
                options,
                transport,
                queue: Mutex::new(VecDeque::new()),
                in_flight: AtomicBool::new(false),
                abort: Mutex::new(None),
                trigger_armed: AtomicBool::new(false),
                intake: Mutex::new(intake),
                frames: FrameRegistry::default(),
            }),
        }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.inner.options
    }

    /// Advisory accept string for the host's file picker.
    pub fn accept(&self) -> Option<String> {
        self.inner.intake.lock().unwrap().accept().map(str::to_string)
    }

    /// How many times the input surface has been recreated.
    pub fn intake_generation(&self) -> u64 {
        self.inner.intake.lock().unwrap().generation()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().unwrap().len()
    }

    pub fn is_idle(&self) -> bool {
        !self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Response frames kept for diagnostics (framed path only).
    pub fn frames(&self) -> &FrameRegistry {
        &self.inner.frames
    }

    /// Whether the manual trigger is currently disabled.
    pub fn trigger_disabled(&self) -> bool {
        !self.inner.trigger_armed.load(Ordering::SeqCst)
    }

    /// Class name the host should apply to the trigger right now.
    pub fn trigger_class(&self) -> Option<&str> {
        if self.trigger_disabled() {
            Some(&self.inner.options.disabled_class)
        } else {
            None
        }
    }

    /// Commit a file selection: validate, build a queue item, offer it to
    /// the pre-enqueue hook, enqueue, and (in auto-submit mode) start
    /// transmitting.
    pub async fn select(&self, selection: Selection) -> CommitOutcome {
        if selection.is_empty() {
            return CommitOutcome::Empty;
        }

        let options = &self.inner.options;
        let selection = {
            let mut intake = self.inner.intake.lock().unwrap();
            intake.stage(selection);
            intake.take().expect("selection staged above")
        };

        let policy = Policy {
            accept_types: options.accept_types.as_deref(),
            max_file_size_mb: options.max_file_size_mb,
        };
        if let Verdict::Reject(failure) = validate::check(&selection, &policy) {
            self.inner.intake.lock().unwrap().discard();
            if !failure.wrong_type.is_empty() {
                if let Some(hook) = &options.hooks.on_accept_error {
                    hook(&failure.joined_wrong_type());
                }
            } else if let Some(hook) = &options.hooks.on_oversize {
                hook(&failure.joined_oversize());
            }
            return CommitOutcome::Rejected(failure);
        }

        // A valid selection arms the manual trigger even when the
        // pre-enqueue hook later declines the item.
        if !options.auto_submit && options.manual_trigger {
            self.inner.trigger_armed.store(true, Ordering::SeqCst);
        }

        let streaming = self.inner.transport.supports_progress();
        let mut item = build_item(selection, options, streaming);
        if !streaming {
            // The form path relocated the staged selection into the
            // outgoing form; the input surface is recreated from scratch.
            self.inner.intake.lock().unwrap().recreate();
        }

        if let Some(hook) = &options.hooks.pre_enqueue {
            if !hook(&mut item) {
                return CommitOutcome::Vetoed;
            }
        }

        enqueue(
            &mut self.inner.queue.lock().unwrap(),
            item,
            options.queue_policy,
        );

        if options.auto_submit {
            self.submit().await;
        }
        CommitOutcome::Enqueued
    }

    /// Manual trigger press: submits when armed, otherwise reports the
    /// empty-trigger condition.
    pub async fn trigger(&self) {
        if self.inner.trigger_armed.load(Ordering::SeqCst) {
            self.submit().await;
        } else if let Some(hook) = &self.inner.options.hooks.on_trigger_error {
            hook();
        }
    }

    /// Cancel the in-flight transfer, if any. Only the streaming path can
    /// observe the cancellation; it then advances the queue exactly as a
    /// failure would.
    pub fn abort(&self) {
        if let Some(token) = self.inner.abort.lock().unwrap().as_ref() {
            token.cancel();
        }
    }

    /// Drive the queue. No-op unless Idle with a non-empty queue; once
    /// entered, runs items head-first until the queue drains, handing each
    /// terminal outcome to the response pipeline or the matching hook.
    pub async fn submit(&self) {
        if self.inner.queue.lock().unwrap().is_empty() {
            return;
        }
        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            return;
        }

        loop {
            // The head is detached at submission time: a replace-policy
            // commit swaps only the queued tail, and this item completes
            // orphaned with its callbacks still firing.
            let next = self.inner.queue.lock().unwrap().pop_front();
            let Some(mut item) = next else {
                self.inner.in_flight.store(false, Ordering::SeqCst);
                // A commit may have raced the drain; re-enter if so.
                if self.inner.queue.lock().unwrap().is_empty() {
                    break;
                }
                if self.inner.in_flight.swap(true, Ordering::SeqCst) {
                    break;
                }
                continue;
            };

            let cancel = CancellationToken::new();
            *self.inner.abort.lock().unwrap() = Some(cancel.clone());

            let outcome = self
                .inner
                .transport
                .submit(
                    &mut item,
                    SubmitContext {
                        hooks: &self.inner.options.hooks,
                        cancel,
                        frames: &self.inner.frames,
                    },
                )
                .await;

            *self.inner.abort.lock().unwrap() = None;

            match outcome {
                TransportOutcome::Success => {
                    response::process(
                        &mut item,
                        &self.inner.options.hooks,
                        self.inner.options.decode_mode,
                    );
                }
                TransportOutcome::Failed(failure) => {
                    tracing::debug!(files = ?item.file_names, error = %failure, "upload failed");
                    item.failure = Some(UploadError::Transport(failure));
                    if let Some(hook) = &self.inner.options.hooks.on_error {
                        hook(&item);
                    }
                }
                TransportOutcome::Aborted => {
                    item.failure = Some(UploadError::Aborted);
                    if let Some(hook) = &self.inner.options.hooks.on_abort {
                        hook(&item);
                    }
                }
            }
        }

        // Queue drained: a configured manual trigger goes back to
        // disabled until the next valid selection.
        if !self.inner.options.auto_submit && self.inner.options.manual_trigger {
            self.inner.trigger_armed.store(false, Ordering::SeqCst);
        }
    }
}

/// Host-facing binding table. Binding is idempotent per key: rebinding an
/// already-bound key is a no-op that returns the existing instance, so no
/// duplicate surfaces or handlers can appear.
#[derive(Default)]
pub struct UploadRegistry {
    bound: DashMap<String, Uploader>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, key: &str, options: UploadOptions) -> Uploader {
        self.bound
            .entry(key.to_string())
            .or_insert_with(|| Uploader::new(options))
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Uploader> {
        self.bound.get(key).map(|u| u.clone())
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.bound.contains_key(key)
    }
}
