//! Progress reporting for a conversion attempt.
//!
//! The backend gives no transfer or processing feedback, so progress is
//! cosmetic: [`SimulatedProgress`] advances a percentage on a fixed timer up
//! to a ceiling and jumps to 100 when the response arrives. It must not be
//! read as real I/O progress.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to receive
//! the events.
//!
//! # Example
//!
//! ```rust
//! use format_converter::{ConversionProgressCallback, ConverterConfig};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl ConversionProgressCallback for LastPercent {
//!     fn on_progress(&self, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ConverterConfig::builder()
//!     .progress_callback(Arc::new(LastPercent(AtomicU8::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Called by the converter as an attempt proceeds.
///
/// Implementations must be `Send + Sync` - `on_progress` is invoked from the
/// timer task, which may run on another worker thread. All methods have
/// default no-op implementations so callers only override what they care
/// about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once when the request is about to be sent.
    ///
    /// # Arguments
    /// * `conversion_type` - catalog id of the category
    /// * `file_name` - name of the uploaded file
    /// * `size_bytes` - size of the uploaded file
    fn on_conversion_start(&self, conversion_type: &str, file_name: &str, size_bytes: u64) {
        let _ = (conversion_type, file_name, size_bytes);
    }

    /// Called with every new percentage, starting at 0 and ending at 100.
    /// Values never decrease within one attempt.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called when the artifact has been saved.
    ///
    /// # Arguments
    /// * `filename` - name of the saved file
    /// * `size_bytes` - size of the saved file
    fn on_conversion_complete(&self, filename: &str, size_bytes: u64) {
        let _ = (filename, size_bytes);
    }

    /// Called when the attempt fails after the request was sent.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Timer-driven progress indicator for one attempt.
///
/// Starts at 0, adds `step` every `interval` until `ceiling`, then idles.
/// [`finish`](Self::finish) cancels the timer and sets 100. Dropping the value
/// without finishing also cancels the timer.
pub struct SimulatedProgress {
    value: Arc<Mutex<u8>>,
    ticker: Option<JoinHandle<()>>,
    callback: Option<ProgressCallback>,
}

impl SimulatedProgress {
    /// Reset to 0 and start ticking. Must be called inside a tokio runtime.
    pub fn start(
        step: u8,
        interval: Duration,
        ceiling: u8,
        callback: Option<ProgressCallback>,
    ) -> Self {
        let value = Arc::new(Mutex::new(0u8));
        if let Some(ref cb) = callback {
            cb.on_progress(0);
        }

        let ticker = tokio::spawn({
            let value = Arc::clone(&value);
            let callback = callback.clone();
            async move {
                loop {
                    tokio::time::sleep(interval).await;
                    let mut v = lock(&value);
                    // Also covers a finish() that raced this tick.
                    if *v >= ceiling {
                        break;
                    }
                    *v = v.saturating_add(step).min(ceiling);
                    if let Some(ref cb) = callback {
                        cb.on_progress(*v);
                    }
                }
            }
        });

        Self {
            value,
            ticker: Some(ticker),
            callback,
        }
    }

    /// Current percentage.
    pub fn value(&self) -> u8 {
        *lock(&self.value)
    }

    /// Stop the timer and force the value to 100. Returns the final value.
    pub fn finish(mut self) -> u8 {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        let mut v = lock(&self.value);
        *v = 100;
        if let Some(ref cb) = self.callback {
            cb.on_progress(100);
        }
        *v
    }
}

impl Drop for SimulatedProgress {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

fn lock(m: &Mutex<u8>) -> MutexGuard<'_, u8> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
