//! Crate-wide error taxonomy.
//!
//! Startup failures are fatal and propagate out of `main`; everything else
//! the assistant can hit at runtime is recoverable and is logged by the
//! caller instead of aborting the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("audio device error: {0}")]
    Audio(String),

    #[error("speech recognition error: {0}")]
    Asr(String),

    #[error("language model error: {0}")]
    Llm(String),

    #[error("message bus error: {0}")]
    Bus(String),
}

impl AssistantError {
    /// Startup-time configuration/device/bus failures should abort the
    /// process; everything else is handled in place by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Bus(_))
    }
}
