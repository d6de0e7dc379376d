//! Configuration for talking to the conversion backend.
//!
//! Every knob lives in [`ConverterConfig`], built via its
//! [`ConverterConfigBuilder`]. The defaults reproduce the production client:
//! the hard-coded backend, `png` as the image target, a 10 % progress step
//! every 200 ms held at 90 % until the response lands, and no request timeout.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// The production conversion backend.
pub const DEFAULT_BASE_URL: &str = "https://77h9ikc6vnnv.manus.space";

/// Target sub-format sent for image conversions when none was chosen.
pub const DEFAULT_TARGET_FORMAT: &str = "png";

/// Configuration for a [`crate::Converter`].
///
/// # Example
/// ```rust
/// use format_converter::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .base_url("http://localhost:5000")
///     .download_dir("/tmp/converted")
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint("json-csv"), "http://localhost:5000/api/convert/json-csv");
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Scheme + host (+ optional path prefix) of the backend. No trailing slash.
    pub base_url: String,

    /// Sent as `target_format` for image conversions with no explicit target. Default: `png`.
    pub fallback_target_format: String,

    /// Directory converted files are saved into. Default: current directory.
    pub download_dir: PathBuf,

    /// Percentage added on every progress tick. Default: 10.
    pub progress_step: u8,

    /// Milliseconds between progress ticks. Default: 200.
    pub progress_interval_ms: u64,

    /// Highest value the simulated progress reaches before the response
    /// arrives. Always below 100. Default: 90.
    pub progress_ceiling: u8,

    /// Whole-request timeout in seconds. Default: none; the OS socket
    /// timeouts and the backend are the only bound.
    pub request_timeout_secs: Option<u64>,

    /// Receives start / progress / outcome events for each attempt.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fallback_target_format: DEFAULT_TARGET_FORMAT.to_string(),
            download_dir: PathBuf::from("."),
            progress_step: 10,
            progress_interval_ms: 200,
            progress_ceiling: 90,
            request_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("base_url", &self.base_url)
            .field("fallback_target_format", &self.fallback_target_format)
            .field("download_dir", &self.download_dir)
            .field("progress_step", &self.progress_step)
            .field("progress_interval_ms", &self.progress_interval_ms)
            .field("progress_ceiling", &self.progress_ceiling)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the conversion endpoint for a category id.
    pub fn endpoint(&self, conversion_type_id: &str) -> String {
        format!("{}/api/convert/{}", self.base_url, conversion_type_id)
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn fallback_target_format(mut self, format: impl Into<String>) -> Self {
        self.config.fallback_target_format = format.into();
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn progress_step(mut self, step: u8) -> Self {
        self.config.progress_step = step;
        self
    }

    pub fn progress_interval_ms(mut self, ms: u64) -> Self {
        self.config.progress_interval_ms = ms;
        self
    }

    pub fn progress_ceiling(mut self, ceiling: u8) -> Self {
        self.config.progress_ceiling = ceiling;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ConvertError::InvalidConfig(format!(
                "base URL must be an http:// or https:// URL, got '{}'",
                c.base_url
            )));
        }
        if c.fallback_target_format.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "fallback target format must not be empty".into(),
            ));
        }
        if c.progress_step == 0 {
            return Err(ConvertError::InvalidConfig(
                "progress step must be ≥ 1".into(),
            ));
        }
        if c.progress_interval_ms == 0 {
            return Err(ConvertError::InvalidConfig(
                "progress interval must be ≥ 1 ms".into(),
            ));
        }
        if c.progress_ceiling >= 100 {
            return Err(ConvertError::InvalidConfig(format!(
                "progress ceiling must be below 100, got {}",
                c.progress_ceiling
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "request timeout must be ≥ 1 s".into(),
            ));
        }
        Ok(self.config)
    }
}
