//! Error types for the frame crate.

use thiserror::Error;
use unit_frame_runtime::StoreError;

/// Errors surfaced by providers and configuration loading.
///
/// Rendering never fails; these only come from the edges (messages arriving
/// from the embedded document, the provider stores, the environment).
#[derive(Error, Debug)]
pub enum FrameError {
    /// A cross-frame message of a known type carried an unusable payload
    #[error("Malformed frame message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// The provider's store rejected the action
    #[error("Provider store rejected action: {0}")]
    Store(#[from] StoreError),

    /// A configuration variable could not be parsed
    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig {
        /// Environment variable name
        key: &'static str,
        /// Raw value that failed to parse
        value: String,
    },
}
