//! Response classification.
//!
//! The backend overloads its status codes: a 2xx answer may still be a
//! failure, signalled by a JSON content type. The declared content type, not
//! the status alone, decides between an error and an artifact:
//!
//! | Status | Content type       | Outcome                                        |
//! |--------|--------------------|------------------------------------------------|
//! | 2xx    | `application/json` | error, message from `error` or the generic one |
//! | 2xx    | anything else      | artifact, named from `Content-Disposition`     |
//! | other  | any                | error from a JSON `error`, else the HTTP status |

use crate::error::{ConvertError, GENERIC_FAILURE};
use serde::Deserialize;
use tracing::warn;

/// Name given to an artifact when the response does not carry one.
pub const FALLBACK_FILENAME: &str = "converted_file";

/// The converted file returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Bare file name, safe to join onto a directory.
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// What a backend answer means.
#[derive(Debug)]
pub enum ServerReply {
    Error(ConvertError),
    Artifact(Artifact),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ServerReply {
    /// Classify a fully-read response.
    pub fn classify(
        status: u16,
        content_type: Option<&str>,
        content_disposition: Option<&str>,
        body: Vec<u8>,
    ) -> Self {
        if (200..300).contains(&status) {
            if content_type.is_some_and(is_json) {
                let message = error_message(&body).unwrap_or_else(|| {
                    warn!("JSON reply without an error message, using the generic one");
                    GENERIC_FAILURE.to_string()
                });
                return ServerReply::Error(ConvertError::ServerReported { status, message });
            }

            let filename = content_disposition
                .and_then(filename_from_disposition)
                .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
            return ServerReply::Artifact(Artifact {
                filename,
                content_type: content_type.map(str::to_string),
                bytes: body,
            });
        }

        match error_message(&body) {
            Some(message) => ServerReply::Error(ConvertError::ServerReported { status, message }),
            None => ServerReply::Error(ConvertError::UnparseableServerError { status }),
        }
    }

    pub fn into_result(self) -> Result<Artifact, ConvertError> {
        match self {
            ServerReply::Artifact(a) => Ok(a),
            ServerReply::Error(e) => Err(e),
        }
    }
}

/// Whether a `Content-Type` value declares JSON.
pub fn is_json(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("application/json")
}

/// The non-empty `error` string of a JSON body, if there is one.
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

/// Extract `filename=` from a `Content-Disposition` value.
///
/// Quotes are stripped and the value is cut at the next parameter. Any
/// directory part is discarded, so the result can be joined onto a download
/// directory without escaping it. Returns `None` when no usable name is left.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `header`.
    let start = header.to_ascii_lowercase().find("filename=")? + "filename=".len();
    let rest = header[start..].trim_start();

    let raw = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or(""),
        None => rest.split(';').next().unwrap_or(""),
    };

    let name = raw
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    match name {
        "" | "." | ".." => None,
        n => Some(n.to_string()),
    }
}
