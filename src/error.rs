//! Error type for the format-converter library.
//!
//! Every failure of a conversion attempt is terminal for that attempt: nothing
//! is retried automatically. The session keeps the rendered message so a front
//! end can show it verbatim, and the caller decides whether to re-submit or
//! reset.
//!
//! The five variants at the top are the outcomes of talking to the backend.
//! The rest cover local concerns (reading the upload, writing the artifact,
//! configuration).

use std::path::PathBuf;
use thiserror::Error;

/// Message used when the backend signals failure without saying why.
pub const GENERIC_FAILURE: &str = "conversion failed";

/// All errors returned by the format-converter library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Conversion outcomes ───────────────────────────────────────────────
    /// No conversion type or no file was chosen; nothing was sent.
    #[error("Select a conversion type and upload a file first")]
    MissingSelection,

    /// The request could not complete (DNS, connect, TLS, body read…).
    #[error("Network error during conversion: {reason}")]
    NetworkFailure { reason: String },

    /// The backend answered with a JSON error payload.
    ///
    /// `status` is the HTTP status of that answer; it may well be 2xx, since
    /// the backend reports some failures with a success status.
    #[error("{message}")]
    ServerReported { status: u16, message: String },

    /// Non-2xx answer whose body carried no readable error message.
    #[error("conversion failed: HTTP {status}")]
    UnparseableServerError { status: u16 },

    /// The attempt was dropped before the backend answered.
    #[error("conversion cancelled before the service answered")]
    Cancelled,

    // ── Selection errors ──────────────────────────────────────────────────
    /// The id does not name an entry of the catalog.
    #[error("Unknown conversion type '{id}'\nRun `fconv list` to see the available types.")]
    UnknownConversionType { id: String },

    // ── Local I/O errors ──────────────────────────────────────────────────
    /// The file to upload does not exist.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file to upload.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file to upload exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the converted artifact to the download directory.
    #[error("Failed to write converted file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// `true` for errors produced by the backend rather than by the client.
    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            ConvertError::ServerReported { .. } | ConvertError::UnparseableServerError { .. }
        )
    }

    /// HTTP status attached to a backend error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ConvertError::ServerReported { status, .. }
            | ConvertError::UnparseableServerError { status } => Some(*status),
            _ => None,
        }
    }
}
