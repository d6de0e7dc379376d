//! Pipeline stages for one conversion attempt.
//!
//! Each submodule implements exactly one step, so each can be tested
//! without the network.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ request ──▶ (HTTP POST) ──▶ response ──▶ download
//! (file)     (multipart)                 (classify)    (save)
//! ```
//!
//! 1. [`intake`]   - hold the one file a session uploads
//! 2. [`request`]  - check the selection and build the multipart body
//! 3. [`response`] - tell an error reply from an artifact by content type
//! 4. [`download`] - write the artifact into the download directory
//!
//! The HTTP exchange itself lives in [`crate::convert::Converter`].

pub mod download;
pub mod intake;
pub mod request;
pub mod response;
