//! Failure reasons reported by host capabilities.

use thiserror::Error;

/// Errors raised while loading or starting a sound.
///
/// The manager never hands these to its callers. They travel through host
/// callbacks and backend results, and end up in the log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The host has no way to create an audio context.
    #[error("no audio context available")]
    NoContext,
    /// Retrieving the raw bytes of an asset failed.
    #[error("failed to fetch {locator}: {reason}")]
    Fetch {
        /// Locator that was requested.
        locator: String,
        /// Host-provided description of the failure.
        reason: String,
    },
    /// The fetched bytes could not be decoded into PCM.
    #[error("failed to decode audio data: {reason}")]
    Decode {
        /// Decoder-provided description of the failure.
        reason: String,
    },
    /// The host refused to create a buffer source.
    #[error("host could not create a buffer source")]
    SourceUnavailable,
    /// The host created a source but could not start it.
    #[error("failed to start playback: {reason}")]
    Start {
        /// Host-provided description of the failure.
        reason: String,
    },
}

impl AudioError {
    /// Build a [`AudioError::Fetch`] from anything displayable.
    pub fn fetch(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`AudioError::Decode`] from anything displayable.
    pub fn decode(reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            reason: reason.to_string(),
        }
    }

    /// Build a [`AudioError::Start`] from anything displayable.
    pub fn start(reason: impl std::fmt::Display) -> Self {
        Self::Start {
            reason: reason.to_string(),
        }
    }
}
