//! End-to-end transport coverage against a live in-process HTTP backend:
//! streaming multipart with progress, framed submissions with body
//! scraping, and wire-failure mapping.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::post;
use axum::Router;
use common::{events, recording_hooks, selection, staged, Event};
use uplift::errors::{TransportFailure, UploadError};
use uplift::upload::item::{QueueItem, Selection};
use uplift::upload::options::UploadOptions;
use uplift::upload::{CommitOutcome, Uploader};

/// One multipart part as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
struct Part {
    name: String,
    file_name: Option<String>,
    text: String,
}

type Received = Arc<Mutex<Vec<Part>>>;

async fn drain(received: &Received, multipart: &mut Multipart) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        received.lock().unwrap().push(Part {
            name,
            file_name,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
}

async fn accept_json(State(received): State<Received>, mut multipart: Multipart) -> &'static str {
    drain(&received, &mut multipart).await;
    "{\"ok\":true}"
}

async fn accept_html(
    State(received): State<Received>,
    mut multipart: Multipart,
) -> Html<&'static str> {
    drain(&received, &mut multipart).await;
    Html("<html><head></head><body>{\"ok\":true}</body></html>")
}

/// Ephemeral backend; returns its base URL and the parts it received.
async fn spawn_backend() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/upload", post(accept_json))
        .route("/upload-html", post(accept_html))
        .route("/upload-empty", post(|| async { "" }))
        .route(
            "/upload-fail",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/upload-slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{\"ok\":true}"
            }),
        )
        .with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

#[tokio::test]
async fn streaming_upload_round_trips_and_reports_progress() {
    let (base, received) = spawn_backend().await;
    let (hooks, log) = recording_hooks();
    let mut options = UploadOptions::new("attachment", format!("{base}/upload"));
    options.hooks = hooks;

    let uploader = Uploader::new(options);
    let outcome = uploader
        .select(Selection::Files(vec![staged("photo.png", 200_000)]))
        .await;
    assert_eq!(outcome, CommitOutcome::Enqueued);

    let log = events(&log);
    assert_eq!(
        log.last(),
        Some(&Event::Done(vec!["photo.png".to_string()]))
    );

    let progress: Vec<_> = log
        .iter()
        .filter_map(|e| match e {
            Event::Progress(state) => Some(*state),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0].loaded <= w[1].loaded));
    let last = progress.last().unwrap();
    assert_eq!(last.percent, 100);
    assert_eq!(last.loaded, last.total);

    let parts = received.lock().unwrap().clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "attachment");
    assert_eq!(parts[0].file_name.as_deref(), Some("photo.png"));
    assert_eq!(parts[0].text.len(), 200_000);
}

#[tokio::test]
async fn server_error_status_maps_to_status_failure() {
    let (base, _received) = spawn_backend().await;
    let (mut hooks, log) = recording_hooks();

    let failure_matched = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&failure_matched);
    hooks.on_error = Some(Arc::new(move |item: &QueueItem| {
        *flag.lock().unwrap() = matches!(
            item.failure,
            Some(UploadError::Transport(TransportFailure::Status(500)))
        ) && item.decoded.is_none();
    }));

    let mut options = UploadOptions::new("attachment", format!("{base}/upload-fail"));
    options.hooks = hooks;

    Uploader::new(options).select(selection(&["a.png"])).await;

    // Response processing is skipped entirely on a non-success status.
    assert!(*failure_matched.lock().unwrap());
    assert!(!events(&log).iter().any(|e| matches!(e, Event::Done(_))));
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_network_failure() {
    let mut hooks = uplift::upload::options::Hooks::default();
    let failure_matched = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&failure_matched);
    hooks.on_error = Some(Arc::new(move |item: &QueueItem| {
        *flag.lock().unwrap() = matches!(
            item.failure,
            Some(UploadError::Transport(TransportFailure::Network(_)))
        );
    }));

    let mut options = UploadOptions::new("attachment", "http://127.0.0.1:9/upload");
    options.hooks = hooks;

    Uploader::new(options).select(selection(&["a.png"])).await;

    assert!(*failure_matched.lock().unwrap());
}

#[tokio::test]
async fn abort_cancels_an_in_flight_streaming_upload() {
    let (base, _received) = spawn_backend().await;
    let (hooks, log) = recording_hooks();
    let mut options = UploadOptions::new("attachment", format!("{base}/upload-slow"));
    options.hooks = hooks;

    let uploader = Uploader::new(options);
    let driver = uploader.clone();
    let in_flight = tokio::spawn(async move {
        driver.select(selection(&["a.png"])).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The body has fully streamed by now; the abort must still land while
    // the response is pending.
    uploader.abort();
    tokio::time::timeout(Duration::from_secs(2), in_flight)
        .await
        .expect("abort should resolve the submission")
        .unwrap();

    let log = events(&log);
    assert!(log.contains(&Event::Abort(vec!["a.png".to_string()])));
    assert!(!log
        .iter()
        .any(|e| matches!(e, Event::Done(_) | Event::Error(_))));
    assert!(uploader.is_idle());
}

#[tokio::test]
async fn abort_lands_without_a_progress_hook() {
    let (base, _received) = spawn_backend().await;

    let aborted = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&aborted);
    let mut hooks = uplift::upload::options::Hooks::default();
    hooks.on_abort = Some(Arc::new(move |item: &QueueItem| {
        *flag.lock().unwrap() = matches!(item.failure, Some(UploadError::Aborted));
    }));

    let mut options = UploadOptions::new("attachment", format!("{base}/upload-slow"));
    options.hooks = hooks;

    let uploader = Uploader::new(options);
    let driver = uploader.clone();
    let in_flight = tokio::spawn(async move {
        driver.select(selection(&["a.png"])).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    uploader.abort();
    tokio::time::timeout(Duration::from_secs(2), in_flight)
        .await
        .expect("abort should resolve the submission")
        .unwrap();

    assert!(*aborted.lock().unwrap());
}

#[tokio::test]
async fn framed_upload_scrapes_the_frame_body() {
    let (base, received) = spawn_backend().await;
    let (hooks, log) = recording_hooks();
    let mut options = UploadOptions::new("attachment", format!("{base}/upload-html"));
    options.force_framed = true;
    options.hooks = hooks;

    let uploader = Uploader::new(options);
    assert_eq!(uploader.intake_generation(), 0);

    uploader.select(selection(&["doc.txt"])).await;

    // Markup is stripped down to the body text before decoding, so the
    // wrapped JSON still dispatches done.
    assert_eq!(events(&log), vec![Event::Done(vec!["doc.txt".to_string()])]);
    assert!(uploader.frames().is_empty());
    // The framed path rebuilds the input surface after every commit.
    assert_eq!(uploader.intake_generation(), 1);

    let parts = received.lock().unwrap().clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].file_name.as_deref(), Some("doc.txt"));
}

#[tokio::test]
async fn keep_frames_retains_the_response_document() {
    let (base, _received) = spawn_backend().await;
    let (mut hooks, _log) = recording_hooks();

    let frame_name = Arc::new(Mutex::new(None::<String>));
    let captured = Arc::clone(&frame_name);
    hooks.on_done = Some(Arc::new(move |item: &QueueItem| {
        *captured.lock().unwrap() = item.frame_name.clone();
    }));

    let mut options = UploadOptions::new("attachment", format!("{base}/upload-html"));
    options.force_framed = true;
    options.keep_frames = true;
    options.hooks = hooks;

    let uploader = Uploader::new(options);
    uploader.select(selection(&["doc.txt"])).await;

    let name = frame_name.lock().unwrap().clone().unwrap();
    assert_eq!(uploader.frames().len(), 1);
    let document = uploader.frames().get(&name).unwrap().document.unwrap();
    assert!(document.contains("<body>"));
}

#[tokio::test]
async fn framed_empty_body_is_an_application_error() {
    let (base, _received) = spawn_backend().await;
    let (mut hooks, log) = recording_hooks();

    let failure_matched = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&failure_matched);
    hooks.on_error = Some(Arc::new(move |item: &QueueItem| {
        *flag.lock().unwrap() = matches!(item.failure, Some(UploadError::Application));
    }));

    let mut options = UploadOptions::new("attachment", format!("{base}/upload-empty"));
    options.force_framed = true;
    options.hooks = hooks;

    Uploader::new(options).select(selection(&["doc.txt"])).await;

    assert!(*failure_matched.lock().unwrap());
    assert!(!events(&log).iter().any(|e| matches!(e, Event::Done(_))));
}

#[tokio::test]
async fn framed_unreadable_response_is_a_transport_failure() {
    let failure_matched = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&failure_matched);
    let mut hooks = uplift::upload::options::Hooks::default();
    hooks.on_error = Some(Arc::new(move |item: &QueueItem| {
        *flag.lock().unwrap() = matches!(
            item.failure,
            Some(UploadError::Transport(TransportFailure::UnreadableFrame))
        ) && item.raw_response.is_none();
    }));

    let mut options = UploadOptions::new("attachment", "http://127.0.0.1:9/upload");
    options.force_framed = true;
    options.hooks = hooks;

    let uploader = Uploader::new(options);
    uploader.select(selection(&["doc.txt"])).await;

    assert!(*failure_matched.lock().unwrap());
    assert!(uploader.frames().is_empty());
}

#[tokio::test]
async fn hidden_form_fields_reach_the_backend() {
    let (base, received) = spawn_backend().await;
    let mut options = UploadOptions::new("attachment", format!("{base}/upload"));
    options.force_framed = true;
    options.hooks.pre_enqueue = Some(Arc::new(|item: &mut QueueItem| {
        if let Some(form) = item.payload.as_form_mut() {
            form.append("token", "secret");
        }
        true
    }));

    Uploader::new(options).select(selection(&["doc.txt"])).await;

    let parts = received.lock().unwrap().clone();
    assert_eq!(
        parts[0],
        Part {
            name: "token".to_string(),
            file_name: None,
            text: "secret".to_string(),
        }
    );
    assert_eq!(parts[1].name, "attachment");
    assert_eq!(parts[1].file_name.as_deref(), Some("doc.txt"));
}
