//! # format-converter
//!
//! Client for a remote file-conversion service: pick a conversion category
//! (JSON ↔ CSV, image formats, video → GIF, OCR…), upload one file, and save
//! the converted file the service sends back.
//!
//! The conversion itself happens on the backend. This crate owns the catalog
//! of categories, the session state around an attempt, the multipart request,
//! a cosmetic progress indicator, and the branching between an error reply
//! and a downloadable artifact.
//!
//! ## Flow
//!
//! ```text
//! catalog ──▶ session ──▶ request ──▶ POST /api/convert/{id} ──▶ response ──▶ download
//!  (pick)    (type+file)  (multipart)                          (JSON error │ artifact)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use format_converter::{ConversionSession, Converter, ConverterConfig, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(ConverterConfig::default())?;
//!
//!     let mut session = ConversionSession::new();
//!     session.select_type("image-format")?;
//!     session.select_file(UploadedFile::from_path("photo.heic").await?);
//!     session.set_target_format("jpg");
//!
//!     let saved = session.convert(&converter).await?;
//!     println!("saved {}", saved.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! format-converter = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{Accent, ConversionType, Icon, IMAGE_FORMAT_ID};
pub use config::{ConverterConfig, ConverterConfigBuilder, DEFAULT_BASE_URL, DEFAULT_TARGET_FORMAT};
pub use convert::{convert, convert_sync, Converter};
pub use error::ConvertError;
pub use pipeline::download::DownloadInfo;
pub use pipeline::intake::UploadedFile;
pub use pipeline::request::ConversionRequest;
pub use pipeline::response::{Artifact, ServerReply};
pub use progress::{
    ConversionProgressCallback, NoopProgressCallback, ProgressCallback, SimulatedProgress,
};
pub use session::{ConversionSession, ConversionStatus, SessionPhase};
