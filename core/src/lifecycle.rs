//! Ticket lifecycle state machine.
//!
//! A ticket moves through `Open`, `PendingClose`, and `Closed`; the fourth
//! state of the machine, deletion, is terminal and is represented by the
//! record's absence rather than a stage value. `PendingClose` is ephemeral:
//! it exists only for the duration of one close-confirmation exchange and
//! is never persisted, so on restart every non-closed ticket is simply open
//! again.
//!
//! This module holds the pure half of the machine: which action is legal
//! from which stage, and how the confirmed transitions mutate a record.
//! Side effects (permission edits, notices, channel removal) belong to the
//! runtime's ticket service.

use crate::types::{TicketRecord, UserId};
use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle stage of an existing ticket record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Eligible for staff/user interaction.
    Open,
    /// A close confirmation prompt is outstanding.
    PendingClose,
    /// Closed; the requester can no longer send.
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::PendingClose => f.write_str("awaiting close confirmation"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Lifecycle actions addressed to an existing ticket.
///
/// Creation is not listed: it targets no existing record and is gated by
/// quota rather than stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    /// Ask for the ticket to be closed (posts a confirmation prompt).
    RequestClose,
    /// Confirm an outstanding close prompt.
    ConfirmClose,
    /// Discard an outstanding close prompt.
    CancelClose,
    /// Reopen a closed ticket.
    Reopen,
    /// Delete the ticket and, after a grace delay, its channel.
    Delete,
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestClose => f.write_str("close"),
            Self::ConfirmClose => f.write_str("confirm closing"),
            Self::CancelClose => f.write_str("cancel closing"),
            Self::Reopen => f.write_str("reopen"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Whether `action` is legal for a ticket currently at `stage`.
///
/// This is the transition table: `Open` accepts a close request or
/// deletion, `PendingClose` accepts only the confirmation outcome, and
/// `Closed` accepts reopening or deletion.
#[must_use]
pub const fn permits(stage: Stage, action: TicketAction) -> bool {
    matches!(
        (stage, action),
        (Stage::Open, TicketAction::RequestClose | TicketAction::Delete)
            | (
                Stage::PendingClose,
                TicketAction::ConfirmClose | TicketAction::CancelClose
            )
            | (Stage::Closed, TicketAction::Reopen | TicketAction::Delete)
    )
}

/// Derive the stage of a record, given whether a close prompt is pending
/// for its channel.
#[must_use]
pub const fn stage_of(record: &TicketRecord, pending_close: bool) -> Stage {
    if record.closed {
        Stage::Closed
    } else if pending_close {
        Stage::PendingClose
    } else {
        Stage::Open
    }
}

/// Apply a confirmed close to the record.
pub const fn apply_close(record: &mut TicketRecord, by: UserId, at: DateTime<Utc>) {
    record.closed = true;
    record.closed_at = Some(at);
    record.closed_by = Some(by);
}

/// Apply a reopen to the record. The `closed_*` fields from the previous
/// close are kept, never cleared.
pub const fn apply_reopen(record: &mut TicketRecord, by: UserId, at: DateTime<Utc>) {
    record.closed = false;
    record.reopened_at = Some(at);
    record.reopened_by = Some(by);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ChannelId, TicketCategory};
    use chrono::Duration;

    fn record() -> TicketRecord {
        TicketRecord::open(
            ChannelId::from_raw(300_000_000_000_000_001),
            UserId::from_raw(400_000_000_000_000_001),
            TicketCategory::Support,
            Utc::now(),
            None,
        )
    }

    #[test]
    fn transition_table_matches_the_lifecycle() {
        use TicketAction::{CancelClose, ConfirmClose, Delete, Reopen, RequestClose};

        assert!(permits(Stage::Open, RequestClose));
        assert!(permits(Stage::Open, Delete));
        assert!(!permits(Stage::Open, ConfirmClose));
        assert!(!permits(Stage::Open, CancelClose));
        assert!(!permits(Stage::Open, Reopen));

        assert!(permits(Stage::PendingClose, ConfirmClose));
        assert!(permits(Stage::PendingClose, CancelClose));
        assert!(!permits(Stage::PendingClose, RequestClose));
        assert!(!permits(Stage::PendingClose, Reopen));
        assert!(!permits(Stage::PendingClose, Delete));

        assert!(permits(Stage::Closed, Reopen));
        assert!(permits(Stage::Closed, Delete));
        assert!(!permits(Stage::Closed, RequestClose));
        assert!(!permits(Stage::Closed, ConfirmClose));
        assert!(!permits(Stage::Closed, CancelClose));
    }

    #[test]
    fn stage_derivation_prefers_closed_over_pending() {
        let mut ticket = record();
        assert_eq!(stage_of(&ticket, false), Stage::Open);
        assert_eq!(stage_of(&ticket, true), Stage::PendingClose);
        ticket.closed = true;
        assert_eq!(stage_of(&ticket, true), Stage::Closed);
    }

    #[test]
    fn close_sets_metadata_and_reopen_keeps_it() {
        let mut ticket = record();
        let staff = UserId::from_raw(400_000_000_000_000_002);
        let closed_at = Utc::now();
        apply_close(&mut ticket, staff, closed_at);
        assert!(ticket.closed);
        assert_eq!(ticket.closed_at, Some(closed_at));
        assert_eq!(ticket.closed_by, Some(staff));

        let reopened_at = closed_at + Duration::seconds(90);
        apply_reopen(&mut ticket, staff, reopened_at);
        assert!(!ticket.closed);
        assert_eq!(ticket.closed_at, Some(closed_at));
        assert_eq!(ticket.reopened_at, Some(reopened_at));
        assert!(ticket.reopened_at.unwrap() > ticket.closed_at.unwrap());
    }
}
