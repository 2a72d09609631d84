//! Streaming multipart transport: the modern path.
//!
//! POSTs the item's binary multipart container to the endpoint, reporting
//! byte progress while the body streams out and honoring cancellation.
//! Status 200 or 304 is success; any other status is a transport failure
//! with no response processing.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use reqwest::header::CONTENT_TYPE;

use crate::errors::TransportFailure;
use crate::upload::item::{Payload, QueueItem, TransferState};
use crate::upload::options::UploadOptions;
use crate::upload::transport::{SubmitContext, Transport, TransportOutcome};

const PROGRESS_CHUNK: usize = 64 * 1024;

pub struct MultipartTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl MultipartTransport {
    pub fn new(client: reqwest::Client, options: &UploadOptions) -> Self {
        Self {
            client,
            endpoint: options.endpoint.clone(),
        }
    }

    /// Chunked body stream that counts transmitted bytes, notifies the
    /// progress hook, and fails fast once the submission is cancelled.
    fn progress_body(
        body: Bytes,
        shared: Arc<Mutex<TransferState>>,
        ctx: &SubmitContext<'_>,
    ) -> reqwest::Body {
        let total = body.len() as u64;
        let hook = ctx.hooks.on_progress.clone();
        let cancel = ctx.cancel.clone();

        let chunks: Vec<Bytes> = body
            .chunks(PROGRESS_CHUNK)
            .map(|chunk| Bytes::copy_from_slice(chunk))
            .collect();

        let counted = stream::iter(chunks.into_iter().map(move |chunk| {
            if cancel.is_cancelled() {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "upload aborted"));
            }

            let state = {
                let mut state = shared.lock().expect("transfer state lock");
                state.loaded += chunk.len() as u64;
                state.total = total;
                state.percent = if total == 0 {
                    100
                } else {
                    ((state.loaded as f64) * 100.0 / (total as f64)).round() as u8
                };
                *state
            };
            if let Some(hook) = &hook {
                hook(&state);
            }
            Ok(chunk)
        }));

        reqwest::Body::wrap_stream(counted)
    }
}

#[async_trait]
impl Transport for MultipartTransport {
    async fn submit(&self, item: &mut QueueItem, ctx: SubmitContext<'_>) -> TransportOutcome {
        let (content_type, body) = match &item.payload {
            Payload::Multipart(payload) => payload.encode(),
            Payload::Form(payload) => payload.encode(),
        };
        let total = body.len() as u64;

        // Progress only streams when a hook is listening; the total is
        // always computable here since the body is pre-encoded.
        let shared = Arc::new(Mutex::new(TransferState::default()));
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, content_type)
            .header(reqwest::header::CONTENT_LENGTH, total);
        let request = if ctx.hooks.on_progress.is_some() {
            request.body(Self::progress_body(body, Arc::clone(&shared), &ctx))
        } else {
            request.body(body)
        };

        // Cancellation races the request itself, not just the body
        // stream: an abort lands even when the body has already been
        // transmitted and the response is still pending.
        let response = tokio::select! {
            _ = ctx.cancel.cancelled() => return TransportOutcome::Aborted,
            result = request.send() => match result {
                Ok(response) => response,
                Err(err) => {
                    if ctx.cancel.is_cancelled() {
                        return TransportOutcome::Aborted;
                    }
                    tracing::debug!(error = %err, "multipart submission failed");
                    return TransportOutcome::Failed(TransportFailure::Network(err.to_string()));
                }
            },
        };

        if ctx.hooks.on_progress.is_some() {
            item.transfer = Some(*shared.lock().expect("transfer state lock"));
        }

        let status = response.status().as_u16();
        if status != 200 && status != 304 {
            return TransportOutcome::Failed(TransportFailure::Status(status));
        }

        tokio::select! {
            _ = ctx.cancel.cancelled() => TransportOutcome::Aborted,
            result = response.text() => match result {
                Ok(text) => {
                    item.raw_response = Some(text);
                    TransportOutcome::Success
                }
                Err(err) => TransportOutcome::Failed(TransportFailure::Network(err.to_string())),
            },
        }
    }

    fn supports_progress(&self) -> bool {
        true
    }
}
