//! Conversion entry points.
//!
//! [`Converter`] owns the HTTP client and the configuration and runs one
//! attempt end to end: validate the selection, post the multipart body,
//! drive the simulated progress, classify the answer and save the artifact.
//! The free functions [`convert`] and [`convert_sync`] are one-shot
//! shortcuts for callers that do not keep a `Converter` around.

use crate::catalog::ConversionType;
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::pipeline::download::{save_artifact, DownloadInfo};
use crate::pipeline::intake::UploadedFile;
use crate::pipeline::request::ConversionRequest;
use crate::pipeline::response::{Artifact, ServerReply};
use crate::progress::SimulatedProgress;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Client for the conversion backend.
///
/// Cheap to share by reference; the underlying `reqwest::Client` pools
/// connections across attempts.
#[derive(Debug, Clone)]
pub struct Converter {
    http: reqwest::Client,
    config: ConverterConfig,
}

/// A response read to the end, before classification.
struct RawResponse {
    status: u16,
    content_type: Option<String>,
    content_disposition: Option<String>,
    body: Vec<u8>,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Result<Self, ConvertError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert `file` with `conversion_type` and save the result.
    ///
    /// # Errors
    /// - [`ConvertError::MissingSelection`] when either input is `None`;
    ///   nothing is sent in that case.
    /// - [`ConvertError::NetworkFailure`], [`ConvertError::ServerReported`],
    ///   [`ConvertError::UnparseableServerError`] for failed exchanges.
    /// - [`ConvertError::OutputWriteFailed`] when the artifact cannot be saved.
    pub async fn convert(
        &self,
        conversion_type: Option<&ConversionType>,
        file: Option<&UploadedFile>,
        target_format: Option<&str>,
    ) -> Result<DownloadInfo, ConvertError> {
        let request = ConversionRequest::new(
            conversion_type,
            file,
            target_format,
            &self.config.fallback_target_format,
        )?;

        let result = match self.submit(&request).await {
            Ok(artifact) => save_artifact(artifact, &self.config.download_dir).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(info) => {
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_conversion_complete(&info.filename, info.size_bytes);
                }
            }
            Err(e) => {
                warn!("Conversion '{}' failed: {}", request.conversion_type().id, e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_conversion_error(&e.to_string());
                }
            }
        }
        result
    }

    /// Send a prepared request and return the artifact without saving it.
    ///
    /// Runs the simulated progress for the duration of the exchange and
    /// forces it to 100 as soon as the response (or the failure) is in.
    pub async fn submit(&self, request: &ConversionRequest<'_>) -> Result<Artifact, ConvertError> {
        let conversion_type = request.conversion_type();
        let file = request.file();
        let url = self.config.endpoint(conversion_type.id);
        let callback = self.config.progress_callback.clone();

        if let Some(ref cb) = callback {
            cb.on_conversion_start(conversion_type.id, file.name(), file.size());
        }
        info!(
            "Submitting '{}' ({} bytes) as '{}' to {}",
            file.name(),
            file.size(),
            conversion_type.id,
            url
        );

        let started = Instant::now();
        let progress = SimulatedProgress::start(
            self.config.progress_step,
            Duration::from_millis(self.config.progress_interval_ms),
            self.config.progress_ceiling,
            callback,
        );
        let exchanged = self.exchange(&url, request).await;
        progress.finish();

        let raw = exchanged?;
        debug!(
            "HTTP {} in {}ms, content-type={:?}, {} bytes",
            raw.status,
            started.elapsed().as_millis(),
            raw.content_type,
            raw.body.len()
        );

        ServerReply::classify(
            raw.status,
            raw.content_type.as_deref(),
            raw.content_disposition.as_deref(),
            raw.body,
        )
        .into_result()
    }

    async fn exchange(
        &self,
        url: &str,
        request: &ConversionRequest<'_>,
    ) -> Result<RawResponse, ConvertError> {
        let response = self
            .http
            .post(url)
            .multipart(request.to_form())
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status().as_u16();
        let content_type = header_text(response.headers(), CONTENT_TYPE);
        let content_disposition = header_text(response.headers(), CONTENT_DISPOSITION);

        let body = response.bytes().await.map_err(network_failure)?.to_vec();

        Ok(RawResponse {
            status,
            content_type,
            content_disposition,
            body,
        })
    }
}

/// One-shot conversion with a throwaway [`Converter`].
pub async fn convert(
    conversion_type: Option<&ConversionType>,
    file: Option<&UploadedFile>,
    target_format: Option<&str>,
    config: &ConverterConfig,
) -> Result<DownloadInfo, ConvertError> {
    Converter::new(config.clone())?
        .convert(conversion_type, file, target_format)
        .await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    conversion_type: Option<&ConversionType>,
    file: Option<&UploadedFile>,
    target_format: Option<&str>,
    config: &ConverterConfig,
) -> Result<DownloadInfo, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(conversion_type, file, target_format, config))
}

/// Header value as text. Raw UTF-8 (e.g. a non-ASCII `filename=`) is kept;
/// invalid bytes become U+FFFD.
fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Flatten a transport error and its causes into one line.
fn network_failure(e: reqwest::Error) -> ConvertError {
    let mut reason = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    let mut source = std::error::Error::source(&e);
    while let Some(s) = source {
        reason.push_str(": ");
        reason.push_str(&s.to_string());
        source = std::error::Error::source(s);
    }
    ConvertError::NetworkFailure { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_selection_fails_before_any_request() {
        // Nothing listens on this address; reaching the network would turn
        // the error into NetworkFailure.
        let config = ConverterConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let converter = Converter::new(config).unwrap();

        let err = converter.convert(None, None, None).await.unwrap_err();
        assert!(matches!(err, ConvertError::MissingSelection));

        let file = UploadedFile::new("a.json", b"{}".to_vec());
        let err = converter.convert(None, Some(&file), None).await.unwrap_err();
        assert!(matches!(err, ConvertError::MissingSelection));
    }

    #[test]
    fn header_text_keeps_utf8_filenames() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            reqwest::header::HeaderValue::from_bytes(
                "attachment; filename=\"résumé.pdf\"".as_bytes(),
            )
            .unwrap(),
        );

        let raw = header_text(&headers, CONTENT_DISPOSITION).unwrap();
        assert_eq!(raw, "attachment; filename=\"résumé.pdf\"");
        assert_eq!(
            crate::pipeline::response::filename_from_disposition(&raw).as_deref(),
            Some("résumé.pdf")
        );
        assert_eq!(header_text(&headers, CONTENT_TYPE), None);
    }

    #[test]
    fn convert_sync_reports_missing_selection() {
        let err = convert_sync(
            crate::catalog::find("json-csv"),
            None,
            None,
            &ConverterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::MissingSelection));
    }
}
