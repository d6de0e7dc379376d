//! Interaction state for one user's upload-and-convert attempt.
//!
//! ```text
//!            select_type        select_file          convert
//!   Idle ───────────────▶ TypeSelected ───────▶ FileReady ───────▶ Converting
//!    ▲                                              ▲                  │
//!    │                                              │         ┌────────┴────────┐
//!    │ reset (from anywhere)                        │         ▼                 ▼
//!    └──────────────────────────────────────────    │       Done             Failed
//!                                                   └── select_file / clear_result
//! ```
//!
//! `convert` takes `&mut self`, so a session can never have two attempts in
//! flight. A finished attempt keeps the type and the file, so the user may
//! re-submit straight from `Done` or `Failed`.

use crate::catalog::{self, ConversionType};
use crate::convert::Converter;
use crate::error::ConvertError;
use crate::pipeline::download::DownloadInfo;
use crate::pipeline::intake::UploadedFile;
use serde::Serialize;
use tracing::debug;

/// Three-state progress of the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    #[default]
    Idle,
    Converting,
    Done,
}

/// Where the session stands, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    Idle,
    TypeSelected,
    FileReady,
    Converting,
    Done,
    Failed,
}

/// Transient client-side state for one conversion.
#[derive(Debug, Default)]
pub struct ConversionSession {
    selected_type: Option<&'static ConversionType>,
    file: Option<UploadedFile>,
    target_format: Option<String>,
    status: ConversionStatus,
    progress: u8,
    error: Option<String>,
    result: Option<DownloadInfo>,
}

impl ConversionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose a category from the catalog by id.
    pub fn select_type(&mut self, id: &str) -> Result<&'static ConversionType, ConvertError> {
        let conversion_type = catalog::lookup(id)?;
        self.selected_type = Some(conversion_type);
        self.error = None;
        self.result = None;
        debug!("Selected conversion type '{}'", id);
        Ok(conversion_type)
    }

    /// Take `file` as the upload, discarding any earlier outcome.
    pub fn select_file(&mut self, file: UploadedFile) {
        debug!("Selected file '{}' ({})", file.name(), file.size_label());
        self.file = Some(file);
        self.error = None;
        self.result = None;
        self.progress = 0;
        self.status = ConversionStatus::Idle;
    }

    /// Take the first file of a picker or drop event. Returns `false` (and
    /// changes nothing) when the list is empty.
    pub fn accept_files(&mut self, files: impl IntoIterator<Item = UploadedFile>) -> bool {
        match files.into_iter().next() {
            Some(file) => {
                self.select_file(file);
                true
            }
            None => false,
        }
    }

    /// Target sub-format for image conversions. Blank clears it.
    pub fn set_target_format(&mut self, format: impl Into<String>) {
        let format = format.into();
        self.target_format = if format.trim().is_empty() {
            None
        } else {
            Some(format)
        };
    }

    /// Hide the last result but keep the type and the file.
    pub fn clear_result(&mut self) {
        self.result = None;
        self.status = ConversionStatus::Idle;
    }

    /// Back to the initial state, dropping the file and any result.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether `convert` would send a request.
    pub fn can_convert(&self) -> bool {
        self.selected_type.is_some()
            && self.file.is_some()
            && self.status != ConversionStatus::Converting
    }

    /// Run one attempt.
    ///
    /// On return, exactly one of [`error`](Self::error) and
    /// [`result`](Self::result) is set and progress is 100, except for
    /// [`ConvertError::MissingSelection`], which records the error and leaves
    /// status and progress untouched. Dropping the future before it resolves
    /// leaves the session `Failed` with [`ConvertError::Cancelled`].
    pub async fn convert(&mut self, converter: &Converter) -> Result<DownloadInfo, ConvertError> {
        self.result = None;
        if self.selected_type.is_none() || self.file.is_none() {
            let err = ConvertError::MissingSelection;
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.status = ConversionStatus::Converting;
        self.progress = 0;
        self.error = None;

        let attempt = InFlight {
            session: self,
            settled: false,
        };
        let outcome = converter
            .convert(
                attempt.session.selected_type,
                attempt.session.file.as_ref(),
                attempt.session.target_format.as_deref(),
            )
            .await;
        attempt.settle(outcome)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.status == ConversionStatus::Converting {
            return SessionPhase::Converting;
        }
        if self.status == ConversionStatus::Done {
            if self.error.is_some() {
                return SessionPhase::Failed;
            }
            if self.result.is_some() {
                return SessionPhase::Done;
            }
        }
        match (self.selected_type, &self.file) {
            (None, _) => SessionPhase::Idle,
            (Some(_), None) => SessionPhase::TypeSelected,
            (Some(_), Some(_)) => SessionPhase::FileReady,
        }
    }

    pub fn selected_type(&self) -> Option<&'static ConversionType> {
        self.selected_type
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn target_format(&self) -> Option<&str> {
        self.target_format.as_deref()
    }

    pub fn status(&self) -> ConversionStatus {
        self.status
    }

    /// 0 before an attempt and 100 once it has finished.
    ///
    /// The session does not track the intermediate ticks; install a
    /// [`ConversionProgressCallback`](crate::progress::ConversionProgressCallback)
    /// on the config to observe live values.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&DownloadInfo> {
        self.result.as_ref()
    }

    pub fn is_converting(&self) -> bool {
        self.status == ConversionStatus::Converting
    }
}

/// Marks the session as converting for as long as it lives.
///
/// If the `convert` future is dropped before the converter returns (a
/// timeout, a `select!` branch, an aborted task), the session ends up
/// `Failed` with [`ConvertError::Cancelled`] instead of staying `Converting`.
struct InFlight<'a> {
    session: &'a mut ConversionSession,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(
        mut self,
        outcome: Result<DownloadInfo, ConvertError>,
    ) -> Result<DownloadInfo, ConvertError> {
        self.settled = true;
        let session = &mut *self.session;
        session.progress = 100;
        session.status = ConversionStatus::Done;
        match outcome {
            Ok(info) => {
                session.result = Some(info.clone());
                Ok(info)
            }
            Err(e) => {
                session.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        debug!("Conversion dropped before completion");
        self.session.progress = 100;
        self.session.status = ConversionStatus::Done;
        self.session.result = None;
        self.session.error = Some(ConvertError::Cancelled.to_string());
    }
}
