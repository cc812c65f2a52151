//! Transcript generator collaborator trait.

use crate::types::ChannelId;
use async_trait::async_trait;
use thiserror::Error;

/// Error surfaced by the transcript generator.
#[derive(Debug, Clone, Error)]
#[error("transcript generation failed: {0}")]
pub struct TranscriptError(pub String);

/// Handle to a generated transcript artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRef {
    /// Suggested file name for the artifact.
    pub file_name: String,
    /// Where the artifact was stored or posted.
    pub location: String,
}

/// Produces a single downloadable archive of a channel's conversation.
///
/// Failures here are non-fatal to the lifecycle: deletion proceeds without
/// the archive, and an explicit transcript request reports the failure
/// generically.
#[async_trait]
pub trait TranscriptGenerator: Send + Sync {
    /// Generate a transcript artifact for the channel.
    ///
    /// # Errors
    ///
    /// Returns a [`TranscriptError`] when generation fails.
    async fn archive(&self, channel: ChannelId) -> Result<TranscriptRef, TranscriptError>;
}
