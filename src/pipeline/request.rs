//! Request construction: validate the selection and build the multipart body.
//!
//! The wire contract is small and exact:
//!
//! ```text
//! POST {base-url}/api/convert/{conversion-type-id}
//! Content-Type: multipart/form-data
//!
//!   file           the uploaded bytes, with their file name
//!   target_format  image-format only; the chosen sub-format or the fallback
//! ```

use crate::catalog::ConversionType;
use crate::error::ConvertError;
use crate::pipeline::intake::UploadedFile;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Multipart field carrying the image target sub-format.
pub const TARGET_FORMAT_FIELD: &str = "target_format";

/// A validated conversion request, ready to be sent.
#[derive(Debug, Clone)]
pub struct ConversionRequest<'a> {
    conversion_type: &'a ConversionType,
    file: &'a UploadedFile,
    target_format: Option<String>,
}

impl<'a> ConversionRequest<'a> {
    /// Check the preconditions and resolve the target format.
    ///
    /// Fails with [`ConvertError::MissingSelection`] unless both a type and a
    /// file are present. For categories that take a target format, a missing
    /// or blank `target_format` is replaced by `fallback_target_format`; for
    /// every other category it is dropped.
    pub fn new(
        conversion_type: Option<&'a ConversionType>,
        file: Option<&'a UploadedFile>,
        target_format: Option<&str>,
        fallback_target_format: &str,
    ) -> Result<Self, ConvertError> {
        let (conversion_type, file) = match (conversion_type, file) {
            (Some(t), Some(f)) => (t, f),
            _ => return Err(ConvertError::MissingSelection),
        };

        let requested = target_format.map(str::trim).filter(|t| !t.is_empty());
        let target_format = if conversion_type.takes_target_format() {
            Some(requested.unwrap_or(fallback_target_format).to_string())
        } else {
            if let Some(t) = requested {
                warn!(
                    "Ignoring target format '{}': '{}' does not take one",
                    t, conversion_type.id
                );
            }
            None
        };

        Ok(Self {
            conversion_type,
            file,
            target_format,
        })
    }

    pub fn conversion_type(&self) -> &'a ConversionType {
        self.conversion_type
    }

    pub fn file(&self) -> &'a UploadedFile {
        self.file
    }

    /// Value of the `target_format` field, when the request carries one.
    pub fn target_format(&self) -> Option<&str> {
        self.target_format.as_deref()
    }

    /// Build the multipart body.
    pub fn to_form(&self) -> Form {
        let part = Part::bytes(self.file.bytes().to_vec()).file_name(self.file.name().to_string());
        let mut form = Form::new().part(FILE_FIELD, part);
        if let Some(ref target) = self.target_format {
            form = form.text(TARGET_FORMAT_FIELD, target.clone());
        }
        debug!(
            "Built form for '{}': file '{}' ({} bytes), target_format={:?}",
            self.conversion_type.id,
            self.file.name(),
            self.file.size(),
            self.target_format
        );
        form
    }
}
