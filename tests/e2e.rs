//! End-to-end tests for format-converter.
//!
//! Each test starts an in-process mock of the conversion backend (axum, bound
//! to an ephemeral port) and drives the real HTTP client against it. The mock
//! answers according to the conversion type id in the path:
//!
//! | id                            | answer                                          |
//! |-------------------------------|-------------------------------------------------|
//! | `image-format`                | 200 `image/png`, `filename="out.png"`           |
//! | `json-csv`                    | 200 `application/json` `{"error":"bad file"}`   |
//! | `video-gif`                   | 502 HTML body                                   |
//! | `image-to-text-ocr`           | 422 `application/json` `{"error":"no text found"}` |
//! | `markdown-rtf`                | 200 `application/octet-stream`, no disposition  |
//! | `image-to-searchable-pdf-ocr` | 200 `application/pdf`, `filename=scan.pdf`      |
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use format_converter::{
    catalog, ConversionProgressCallback, ConversionSession, ConvertError, Converter,
    ConverterConfig, ProgressCallback, SessionPhase, UploadedFile,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ── Mock backend ─────────────────────────────────────────────────────────────

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ReceivedRequest {
    type_id: String,
    fields: Vec<ReceivedField>,
}

impl ReceivedRequest {
    fn field(&self, name: &str) -> Option<&ReceivedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(|f| String::from_utf8_lossy(&f.data).into_owned())
    }
}

#[derive(Clone, Default)]
struct Backend {
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    delay: Duration,
}

impl Backend {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last(&self) -> ReceivedRequest {
        self.received
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend received no request")
    }
}

fn scripted_reply(type_id: &str) -> Response {
    match type_id {
        "image-format" => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CONTENT_DISPOSITION, r#"attachment; filename="out.png""#),
            ],
            PNG_BYTES.to_vec(),
        )
            .into_response(),
        "json-csv" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"bad file"}"#,
        )
            .into_response(),
        "video-gif" => (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>upstream exploded</body></html>",
        )
            .into_response(),
        "image-to-text-ocr" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"no text found"}"#,
        )
            .into_response(),
        "markdown-rtf" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            b"{\\rtf1 hello}".to_vec(),
        )
            .into_response(),
        "image-to-searchable-pdf-ocr" => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (header::CONTENT_DISPOSITION, "attachment; filename=scan.pdf"),
            ],
            b"%PDF-1.7".to_vec(),
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, "unknown route").into_response(),
    }
}

async fn handle_convert(
    State(backend): State<Backend>,
    Path(type_id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);

    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        fields.push(ReceivedField {
            name,
            file_name,
            data,
        });
    }
    backend.received.lock().unwrap().push(ReceivedRequest {
        type_id: type_id.clone(),
        fields,
    });

    tokio::time::sleep(backend.delay).await;
    scripted_reply(&type_id)
}

/// Start the mock backend; returns its base URL.
async fn spawn_backend(delay: Duration) -> (String, Backend) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let backend = Backend {
        delay,
        ..Backend::default()
    };
    let app = Router::new()
        .route("/api/convert/{id}", post(handle_convert))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), backend)
}

fn converter_for(base_url: &str, download_dir: &TempDir) -> Converter {
    let config = ConverterConfig::builder()
        .base_url(base_url)
        .download_dir(download_dir.path())
        .build()
        .unwrap();
    Converter::new(config).unwrap()
}

fn upload(name: &str) -> UploadedFile {
    UploadedFile::new(name, b"source bytes".to_vec())
}

fn saved_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Records every progress value and the outcome callbacks.
#[derive(Default)]
struct Recorder {
    values: Mutex<Vec<u8>>,
    starts: AtomicUsize,
    completes: AtomicUsize,
    errors: AtomicUsize,
}

impl ConversionProgressCallback for Recorder {
    fn on_conversion_start(&self, _conversion_type: &str, _file_name: &str, _size_bytes: u64) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_progress(&self, percent: u8) {
        self.values.lock().unwrap().push(percent);
    }

    fn on_conversion_complete(&self, _filename: &str, _size_bytes: u64) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_conversion_error(&self, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn assert_progress_shape(values: &[u8]) {
    assert_eq!(values.first(), Some(&0), "progress must start at 0: {values:?}");
    assert!(
        values.windows(2).all(|w| w[0] <= w[1]),
        "progress must never decrease: {values:?}"
    );
    assert_eq!(values.last(), Some(&100), "progress must end at 100: {values:?}");
    assert_eq!(
        values.iter().filter(|&&v| v == 100).count(),
        1,
        "100 must be reported exactly once: {values:?}"
    );
    assert!(
        values[..values.len() - 1].iter().all(|&v| v <= 90),
        "progress must stay at or below the ceiling before completion: {values:?}"
    );
}

// ── Selection ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_selection_sends_nothing() {
    let (url, backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    let err = session.convert(&converter).await.unwrap_err();
    assert!(matches!(err, ConvertError::MissingSelection));

    let err = converter
        .convert(None, Some(&upload("a.json")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::MissingSelection));

    let err = converter
        .convert(catalog::find("json-csv"), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::MissingSelection));

    assert_eq!(backend.hits(), 0);
    assert!(saved_files(&dir).is_empty());
}

// ── Request shape ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_image_format_sends_fallback_target_format() {
    let (url, backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    converter
        .convert(catalog::find("image-format"), Some(&upload("photo.heic")), None)
        .await
        .unwrap();

    let req = backend.last();
    assert_eq!(req.type_id, "image-format");
    assert_eq!(req.text("target_format").as_deref(), Some("png"));

    let file = req.field("file").expect("file field");
    assert_eq!(file.file_name.as_deref(), Some("photo.heic"));
    assert_eq!(file.data, b"source bytes");
}

#[tokio::test]
async fn test_image_format_sends_chosen_target_format() {
    let (url, backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    session.select_type("image-format").unwrap();
    session.select_file(upload("photo.avif"));
    session.set_target_format("webp");
    session.convert(&converter).await.unwrap();

    assert_eq!(backend.last().text("target_format").as_deref(), Some("webp"));
}

#[tokio::test]
async fn test_other_types_send_only_the_file() {
    let (url, backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let _ = converter
        .convert(catalog::find("json-csv"), Some(&upload("a.json")), Some("png"))
        .await;

    let req = backend.last();
    assert_eq!(req.type_id, "json-csv");
    assert!(req.field("target_format").is_none());
    let names: Vec<&str> = req.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["file"]);
}

// ── Response branching ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_json_on_success_is_an_error_not_a_download() {
    let (url, _backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    session.select_type("json-csv").unwrap();
    session.select_file(upload("data.json"));
    let err = session.convert(&converter).await.unwrap_err();

    assert!(matches!(err, ConvertError::ServerReported { status: 200, .. }));
    assert_eq!(session.error(), Some("bad file"));
    assert!(session.result().is_none());
    assert_eq!(session.phase(), SessionPhase::Failed);
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn test_binary_reply_is_saved_under_disposition_name() {
    let (url, _backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    session.select_type("image-format").unwrap();
    session.select_file(upload("photo.heic"));
    let info = session.convert(&converter).await.unwrap();

    assert_eq!(info.filename, "out.png");
    assert_eq!(info.path, dir.path().join("out.png"));
    assert_eq!(info.size_bytes, PNG_BYTES.len() as u64);
    assert_eq!(info.content_type.as_deref(), Some("image/png"));
    assert_eq!(std::fs::read(&info.path).unwrap(), PNG_BYTES);

    assert_eq!(session.result(), Some(&info));
    assert!(session.error().is_none());
    assert_eq!(session.phase(), SessionPhase::Done);
    assert_eq!(saved_files(&dir), vec!["out.png"]);
}

#[tokio::test]
async fn test_unquoted_disposition_and_missing_disposition() {
    let (url, _backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let pdf = converter
        .convert(
            catalog::find("image-to-searchable-pdf-ocr"),
            Some(&upload("scan.jpg")),
            None,
        )
        .await
        .unwrap();
    assert_eq!(pdf.filename, "scan.pdf");

    let rtf = converter
        .convert(catalog::find("markdown-rtf"), Some(&upload("notes.md")), None)
        .await
        .unwrap();
    assert_eq!(rtf.filename, "converted_file");

    assert_eq!(saved_files(&dir), vec!["converted_file", "scan.pdf"]);
}

#[tokio::test]
async fn test_failure_status_with_unparseable_body_reports_status() {
    let (url, _backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    session.select_type("video-gif").unwrap();
    session.select_file(upload("clip.mp4"));
    let err = session.convert(&converter).await.unwrap_err();

    assert!(matches!(err, ConvertError::UnparseableServerError { status: 502 }));
    let shown = session.error().unwrap();
    assert!(shown.contains("502"), "got: {shown}");
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_failure_status_with_json_error_uses_its_message() {
    let (url, _backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let err = converter
        .convert(catalog::find("image-to-text-ocr"), Some(&upload("blank.png")), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::ServerReported { status: 422, .. }));
    assert_eq!(err.to_string(), "no text found");
}

#[tokio::test]
async fn test_network_failure() {
    // Grab a free port, then close it so the connection is refused.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let dir = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = ConverterConfig::builder()
        .base_url(format!("http://127.0.0.1:{port}"))
        .download_dir(dir.path())
        .progress_callback(Arc::clone(&recorder) as ProgressCallback)
        .build()
        .unwrap();
    let converter = Converter::new(config).unwrap();

    let err = converter
        .convert(catalog::find("json-csv"), Some(&upload("a.json")), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::NetworkFailure { .. }));
    assert_progress_shape(&recorder.values.lock().unwrap());
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.completes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_request_timeout_is_a_network_failure() {
    let (url, backend) = spawn_backend(Duration::from_secs(3)).await;
    let dir = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = ConverterConfig::builder()
        .base_url(&url)
        .download_dir(dir.path())
        .request_timeout_secs(1)
        .progress_callback(Arc::clone(&recorder) as ProgressCallback)
        .build()
        .unwrap();
    let converter = Converter::new(config).unwrap();

    let started = std::time::Instant::now();
    let err = converter
        .convert(catalog::find("image-format"), Some(&upload("photo.heic")), None)
        .await
        .unwrap_err();

    match err {
        ConvertError::NetworkFailure { ref reason } => {
            assert!(reason.starts_with("request timed out"), "got: {reason}")
        }
        other => panic!("expected NetworkFailure, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(backend.hits(), 1);
    assert_progress_shape(&recorder.values.lock().unwrap());
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
    assert!(saved_files(&dir).is_empty());
}

// ── Session behaviour ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_file_clears_error_before_next_submission() {
    let (url, backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    session.select_type("json-csv").unwrap();
    session.select_file(upload("broken.json"));
    session.convert(&converter).await.unwrap_err();
    assert_eq!(session.error(), Some("bad file"));
    assert_eq!(session.progress(), 100);

    session.select_file(upload("fixed.json"));
    assert!(session.error().is_none());
    assert!(session.result().is_none());
    assert_eq!(session.progress(), 0);
    assert_eq!(session.phase(), SessionPhase::FileReady);

    // Re-submitting is allowed from the recovered state.
    session.convert(&converter).await.unwrap_err();
    assert_eq!(backend.hits(), 2);
    let file = backend.last().field("file").cloned().unwrap();
    assert_eq!(file.file_name.as_deref(), Some("fixed.json"));
}

#[tokio::test]
async fn test_reset_after_success() {
    let (url, _backend) = spawn_backend(Duration::ZERO).await;
    let dir = TempDir::new().unwrap();
    let converter = converter_for(&url, &dir);

    let mut session = ConversionSession::new();
    session.select_type("image-format").unwrap();
    session.select_file(upload("photo.heic"));
    session.convert(&converter).await.unwrap();

    session.reset();
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.result().is_none());
    assert!(session.file().is_none());
    assert_eq!(session.progress(), 0);
    // The saved file outlives the session.
    assert!(dir.path().join("out.png").exists());
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_progress_is_monotonic_and_completes_once() {
    let (url, _backend) = spawn_backend(Duration::from_millis(300)).await;
    let dir = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = ConverterConfig::builder()
        .base_url(&url)
        .download_dir(dir.path())
        .progress_interval_ms(20)
        .progress_callback(Arc::clone(&recorder) as ProgressCallback)
        .build()
        .unwrap();
    let converter = Converter::new(config).unwrap();

    converter
        .convert(catalog::find("image-format"), Some(&upload("photo.heic")), None)
        .await
        .unwrap();

    let values = recorder.values.lock().unwrap().clone();
    assert_progress_shape(&values);
    assert!(
        values.iter().any(|&v| v > 0 && v < 100),
        "a 300ms exchange should show intermediate progress: {values:?}"
    );
    assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.completes.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 0);

    // The timer is gone: nothing more arrives after completion.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(recorder.values.lock().unwrap().len(), values.len());
}

#[tokio::test]
async fn test_progress_completes_on_server_error_too() {
    let (url, _backend) = spawn_backend(Duration::from_millis(100)).await;
    let dir = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = ConverterConfig::builder()
        .base_url(&url)
        .download_dir(dir.path())
        .progress_interval_ms(10)
        .progress_callback(Arc::clone(&recorder) as ProgressCallback)
        .build()
        .unwrap();
    let converter = Converter::new(config).unwrap();

    let mut session = ConversionSession::new();
    session.select_type("video-gif").unwrap();
    session.select_file(upload("clip.mov"));
    session.convert(&converter).await.unwrap_err();

    assert_progress_shape(&recorder.values.lock().unwrap());
    assert_eq!(session.progress(), 100);
    assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
}
