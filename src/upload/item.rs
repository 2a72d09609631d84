//! Queue items: one committed selection's transfer unit, including its
//! transport-appropriate payload container.

use bytes::Bytes;
use uuid::Uuid;

use crate::errors::UploadError;
use crate::upload::options::{QueuePolicy, UploadOptions};

/// One file staged for upload with full metadata.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub size: u64,
    pub contents: Bytes,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        let contents = contents.into();
        Self {
            name: name.into(),
            size: contents.len() as u64,
            contents,
        }
    }
}

/// A committed file selection.
///
/// `PathOnly` is the down-level shape: the runtime could not report
/// per-file metadata, so only the textual path is known. Size validation
/// is skipped for it and extension validation inspects the path string.
#[derive(Debug, Clone)]
pub enum Selection {
    Files(Vec<StagedFile>),
    PathOnly(String),
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Files(files) => files.is_empty(),
            Selection::PathOnly(path) => path.is_empty(),
        }
    }
}

/// Byte-level progress of an in-flight transfer. Populated only on the
/// streaming path, where progress is observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferState {
    pub percent: u8,
    pub loaded: u64,
    pub total: u64,
}

/// Binary multipart container for the streaming transport.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    pub field_name: String,
    pub files: Vec<StagedFile>,
}

impl MultipartPayload {
    /// Encode the container as a `multipart/form-data` body. Returns the
    /// `Content-Type` header value and the encoded bytes; the byte length
    /// is the computable progress total.
    pub fn encode(&self) -> (String, Bytes) {
        let boundary = format!("uplift-{}", Uuid::new_v4().simple());
        let mut body = Vec::new();

        for file in &self.files {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    self.field_name, file.name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(&file.contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        (
            format!("multipart/form-data; boundary={boundary}"),
            Bytes::from(body),
        )
    }
}

/// Synthetic form for the framed transport: the staged files moved out of
/// the intake plus any caller-staged hidden fields.
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    pub field_name: String,
    pub files: Vec<StagedFile>,
    fields: Vec<(String, String)>,
}

impl FormPayload {
    /// Stage a hidden field: creates it, or updates the existing field of
    /// the same name.
    pub fn append(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|(n, _)| n == name) {
            field.1 = value.to_string();
        } else {
            self.fields.push((name.to_string(), value.to_string()));
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Encode form fields and files as one `multipart/form-data` body,
    /// the wire shape of a native form navigation.
    pub fn encode(&self) -> (String, Bytes) {
        let boundary = format!("uplift-{}", Uuid::new_v4().simple());
        let mut body = Vec::new();

        for (name, value) in &self.fields {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        for file in &self.files {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    self.field_name, file.name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(&file.contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        (
            format!("multipart/form-data; boundary={boundary}"),
            Bytes::from(body),
        )
    }

    /// Tear the form down after the response has been captured.
    pub fn clear(&mut self) {
        self.files.clear();
        self.fields.clear();
    }
}

/// Transport payload, opaque to the queue manager and meaningful only to
/// the transport selected at construction time.
#[derive(Debug, Clone)]
pub enum Payload {
    Multipart(MultipartPayload),
    Form(FormPayload),
}

impl Payload {
    pub fn as_form_mut(&mut self) -> Option<&mut FormPayload> {
        match self {
            Payload::Form(form) => Some(form),
            Payload::Multipart(_) => None,
        }
    }
}

/// The unit of work: created at commit time, consumed exactly once by a
/// transport, discarded when the manager advances past it.
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// Originating selection identifier, display only.
    pub file_path: String,
    /// All committed file names, display only.
    pub file_names: Vec<String>,
    /// Whether byte-level progress will be observable for this item.
    pub supports_progress: bool,
    pub payload: Payload,
    /// Final progress state, streaming path only.
    pub transfer: Option<TransferState>,
    /// Response-pipeline stages, filled in order; each may be absent when
    /// the preceding stage was skipped or failed.
    pub raw_response: Option<String>,
    pub filtered_response: Option<String>,
    pub decoded: Option<serde_json::Value>,
    /// Terminal error, set before the error hook fires.
    pub failure: Option<UploadError>,
    /// Response frame name, framed path only; survives with `keep_frames`.
    pub frame_name: Option<String>,
}

impl QueueItem {
    /// The response text the pipeline should operate on: filtered when a
    /// filter ran, raw otherwise.
    pub fn effective_response(&self) -> Option<&str> {
        self.filtered_response
            .as_deref()
            .or(self.raw_response.as_deref())
    }
}

/// Trailing file name of a textual path, tolerant of both separator
/// conventions.
pub fn file_name_of(path: &str) -> String {
    let unified = path.replace('/', "\\");
    match unified.rsplit_once('\\') {
        Some((_, name)) => name.to_string(),
        None => unified,
    }
}

/// Build one queue item from a committed selection.
///
/// The streaming path packs every file into a binary multipart container;
/// the framed path moves the files into a detached form so the committed
/// selection survives the intake being recreated.
pub fn build_item(selection: Selection, options: &UploadOptions, use_streaming: bool) -> QueueItem {
    let (file_path, files) = match selection {
        Selection::Files(files) => {
            let path = files.first().map(|f| f.name.clone()).unwrap_or_default();
            (path, files)
        }
        Selection::PathOnly(path) => {
            let staged = StagedFile::new(file_name_of(&path), Bytes::new());
            (path, vec![staged])
        }
    };

    let file_names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let payload = if use_streaming {
        Payload::Multipart(MultipartPayload {
            field_name: options.field_name.clone(),
            files,
        })
    } else {
        Payload::Form(FormPayload {
            field_name: options.field_name.clone(),
            files,
            ..FormPayload::default()
        })
    };

    QueueItem {
        file_path,
        file_names,
        supports_progress: use_streaming,
        payload,
        transfer: None,
        raw_response: None,
        filtered_response: None,
        decoded: None,
        failure: None,
        frame_name: None,
    }
}

/// Append vs replace-singleton enqueue discipline.
pub fn enqueue(queue: &mut std::collections::VecDeque<QueueItem>, item: QueueItem, policy: QueuePolicy) {
    match policy {
        QueuePolicy::Append => queue.push_back(item),
        QueuePolicy::Replace => {
            queue.clear();
            queue.push_back(item);
        }
    }
}
