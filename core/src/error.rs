//! Error taxonomy for ticket operations.
//!
//! Validation failures (`NotATicket`, `Unauthorized`, `QuotaExceeded`,
//! `InvalidTransition`, `AlreadyRegistered`) are resolved before any side
//! effect runs and their message is safe to show to the initiating actor.
//! Collaborator and persistence failures are logged in full and reported
//! generically; they never terminate the event loop.

use crate::gateway::GatewayError;
use crate::lifecycle::{Stage, TicketAction};
use crate::quota::QuotaDenied;
use crate::store::StoreError;
use crate::transcript::TranscriptError;
use crate::types::{ChannelId, UserId};
use thiserror::Error;

/// The generic answer shown when the real failure is not the actor's
/// business: collaborator faults, persistence faults, handler crashes.
pub const GENERIC_FAILURE_NOTICE: &str =
    "Something went wrong while handling your request. Staff have been notified.";

/// Any failure a ticket operation can surface.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The operation targets a channel with no ticket record.
    #[error("channel {0} is not a ticket")]
    NotATicket(ChannelId),

    /// The actor lacks the role or privilege the operation requires.
    #[error("user {actor} is not permitted to {action}")]
    Unauthorized {
        /// Who attempted the operation.
        actor: UserId,
        /// What they attempted, phrased for the denial message.
        action: String,
    },

    /// A creation cap was hit.
    #[error(transparent)]
    QuotaExceeded(#[from] QuotaDenied),

    /// The requested lifecycle action is not legal from the ticket's
    /// current stage.
    #[error("cannot {action} a ticket that is {stage}")]
    InvalidTransition {
        /// The ticket's current stage.
        stage: Stage,
        /// The action that was requested.
        action: TicketAction,
    },

    /// The channel is already registered as a ticket (attach only).
    #[error("channel {0} is already registered as a ticket")]
    AlreadyRegistered(ChannelId),

    /// A chat platform call failed.
    #[error("chat platform request failed")]
    Gateway(#[from] GatewayError),

    /// Transcript generation failed where it was the point of the
    /// operation (explicit transcript requests; deletion treats it as
    /// best-effort instead).
    #[error("transcript generation failed")]
    Transcript(#[from] TranscriptError),

    /// A durable write failed. In-memory state may now be ahead of disk;
    /// this is a recognized degraded mode, not a crash.
    #[error("ticket state could not be persisted")]
    Persistence(#[from] StoreError),
}

impl TicketError {
    /// Whether this is a validation failure whose message is meant for the
    /// initiating actor.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotATicket(_)
                | Self::Unauthorized { .. }
                | Self::QuotaExceeded(_)
                | Self::InvalidTransition { .. }
                | Self::AlreadyRegistered(_)
        )
    }

    /// The message shown to the initiating actor.
    ///
    /// Validation failures explain themselves; collaborator and
    /// persistence failures are reported generically while the detail goes
    /// to the log.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_validation() {
            self.to_string()
        } else {
            GENERIC_FAILURE_NOTICE.to_owned()
        }
    }
}
