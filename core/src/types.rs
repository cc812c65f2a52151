//! Domain types for the helpdesk ticket engine.
//!
//! This module contains the platform identifier newtypes, the ticket
//! category enumeration, and the `TicketRecord` that the registry and store
//! manage. Identifiers are snowflake-like tokens issued by the chat
//! platform: they are validated for shape only (15-20 decimal digits,
//! non-zero), never for authenticity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque structured payload captured from a request form at creation.
///
/// The engine stores and echoes this without interpreting the field layout;
/// only the originating panel module knows what the keys mean.
pub type FormData = serde_json::Map<String, serde_json::Value>;

/// Error returned when a platform identifier fails shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed platform identifier {0:?}: expected 15-20 decimal digits")]
pub struct MalformedId(String);

/// Validate the snowflake shape and parse the numeric value.
fn parse_snowflake(raw: &str) -> Result<u64, MalformedId> {
    let well_formed = (15..=20).contains(&raw.len()) && raw.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(MalformedId(raw.to_owned()));
    }
    raw.parse::<u64>()
        .ok()
        .filter(|value| *value != 0)
        .ok_or_else(|| MalformedId(raw.to_owned()))
}

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque handle to the conversation channel hosting a ticket.
///
/// Serializes as its decimal string so the persisted document matches the
/// platform's own representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(u64);

impl ChannelId {
    /// Wrap a raw platform-issued value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for ChannelId {
    type Err = MalformedId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_snowflake(raw).map(Self)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = MalformedId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque requester/staff identity issued by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw platform-issued value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for UserId {
    type Err = MalformedId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_snowflake(raw).map(Self)
    }
}

impl TryFrom<String> for UserId {
    type Error = MalformedId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque authorization role identity issued by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(u64);

impl RoleId {
    /// Wrap a raw platform-issued value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for RoleId {
    type Err = MalformedId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_snowflake(raw).map(Self)
    }
}

impl TryFrom<String> for RoleId {
    type Error = MalformedId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<RoleId> for String {
    fn from(id: RoleId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Error returned when a category identifier does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ticket category {0:?}")]
pub struct UnknownCategory(String);

/// The fixed classification of a ticket's purpose.
///
/// Categories drive routing, staff visibility, and quotas. This is a closed
/// enumeration: adding a category is a compile-time-checked change because
/// policy, quota messages, and label/color lookups all match exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    /// General product or account support.
    Support,
    /// Job applications and hiring inquiries.
    Recruitment,
    /// Partnership and collaboration proposals.
    Partnership,
    /// Event and appearance bookings.
    Booking,
    /// Direct line to the founding team.
    Founders,
    /// Internal HR matters.
    Hr,
}

impl TicketCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Support,
        Self::Recruitment,
        Self::Partnership,
        Self::Booking,
        Self::Founders,
        Self::Hr,
    ];

    /// Stable machine identifier, used in control ids and configuration keys.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Recruitment => "recruitment",
            Self::Partnership => "partnership",
            Self::Booking => "booking",
            Self::Founders => "founders",
            Self::Hr => "hr",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Support => "Support",
            Self::Recruitment => "Recruitment",
            Self::Partnership => "Partnership",
            Self::Booking => "Booking",
            Self::Founders => "Founders",
            Self::Hr => "HR",
        }
    }

    /// Accent color for notices about this category, as 0xRRGGBB.
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::Support => 0x00_58_65_F2,
            Self::Recruitment => 0x00_57_F2_87,
            Self::Partnership => 0x00_EB_45_9E,
            Self::Booking => 0x00_FE_E7_5C,
            Self::Founders => 0x00_ED_42_45,
            Self::Hr => 0x00_95_A5_A6,
        }
    }
}

impl FromStr for TicketCategory {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.id() == raw)
            .ok_or_else(|| UnknownCategory(raw.to_owned()))
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// Actors
// ============================================================================

/// The authenticated initiator of an interaction, as delivered by the
/// platform alongside the event.
///
/// The role set and administrative flag come from the platform's member
/// data, never from anything the actor self-reports inside the event
/// payload.
#[derive(Clone, Debug)]
pub struct Actor {
    /// Platform identity of the actor.
    pub user_id: UserId,
    /// Roles the actor currently holds.
    pub roles: Vec<RoleId>,
    /// Whether the actor carries administrative privilege on the platform.
    pub admin: bool,
}

impl Actor {
    /// An actor with no roles and no administrative privilege.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            roles: Vec::new(),
            admin: false,
        }
    }

    /// Attach the actor's role set.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<RoleId>) -> Self {
        self.roles = roles;
        self
    }

    /// Mark the actor as holding administrative privilege.
    #[must_use]
    pub const fn as_admin(mut self) -> Self {
        self.admin = true;
        self
    }
}

// ============================================================================
// Ticket records
// ============================================================================

/// One active or recently-closed ticket, keyed by its hosting channel.
///
/// Records mutate only through the lifecycle transitions in
/// [`crate::lifecycle`]; the `closed_*`/`reopened_*` fields are set by the
/// matching transition and never cleared afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Hosting channel: primary key, immutable, unique.
    pub channel_id: ChannelId,
    /// Requester identity, immutable after creation.
    pub user_id: UserId,
    /// Request classification.
    pub category: TicketCategory,
    /// When the ticket was created, UTC.
    pub created_at: DateTime<Utc>,
    /// Lifecycle flag: `false` denotes an open ticket.
    pub closed: bool,
    /// When the ticket was last closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Who closed the ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<UserId>,
    /// When the ticket was last reopened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reopened_at: Option<DateTime<Utc>>,
    /// Who reopened the ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reopened_by: Option<UserId>,
    /// True when the ticket was attached to a pre-existing channel rather
    /// than created fresh.
    #[serde(default)]
    pub manually_registered: bool,
    /// Payload captured from the originating request form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<FormData>,
}

impl TicketRecord {
    /// A fresh open ticket created through the normal creation path.
    #[must_use]
    pub const fn open(
        channel_id: ChannelId,
        user_id: UserId,
        category: TicketCategory,
        created_at: DateTime<Utc>,
        form_data: Option<FormData>,
    ) -> Self {
        Self {
            channel_id,
            user_id,
            category,
            created_at,
            closed: false,
            closed_at: None,
            closed_by: None,
            reopened_at: None,
            reopened_by: None,
            manually_registered: false,
            form_data,
        }
    }

    /// An open ticket attached to a pre-existing channel by an administrator.
    #[must_use]
    pub const fn attached(
        channel_id: ChannelId,
        user_id: UserId,
        category: TicketCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::open(channel_id, user_id, category, created_at, None);
        record.manually_registered = true;
        record
    }

    /// Whether the ticket is currently open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.closed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn snowflake_accepts_platform_shaped_ids() {
        let id: ChannelId = "123456789012345678".parse().unwrap();
        assert_eq!(id.get(), 123_456_789_012_345_678);
    }

    #[test]
    fn snowflake_rejects_malformed_ids() {
        assert!("".parse::<ChannelId>().is_err());
        assert!("12345".parse::<ChannelId>().is_err()); // too short
        assert!("123456789012345678901".parse::<ChannelId>().is_err()); // too long
        assert!("12345678901234567x".parse::<ChannelId>().is_err()); // non-digit
        assert!("000000000000000000".parse::<ChannelId>().is_err()); // zero
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = UserId::from_raw(987_654_321_098_765_432);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"987654321098765432\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn category_ids_round_trip() {
        for category in TicketCategory::ALL {
            let parsed: TicketCategory = category.id().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("billing".parse::<TicketCategory>().is_err());
    }

    #[test]
    fn fresh_record_is_open_with_no_close_metadata() {
        let record = TicketRecord::open(
            ChannelId::from_raw(111_111_111_111_111_111),
            UserId::from_raw(222_222_222_222_222_222),
            TicketCategory::Support,
            Utc::now(),
            None,
        );
        assert!(record.is_open());
        assert!(record.closed_at.is_none());
        assert!(record.closed_by.is_none());
        assert!(!record.manually_registered);
    }

    proptest! {
        #[test]
        fn well_shaped_ids_round_trip_through_display(value in 1u64..u64::MAX) {
            let raw = value.to_string();
            prop_assume!((15..=20).contains(&raw.len()));
            let id: UserId = raw.parse().unwrap();
            prop_assert_eq!(id.to_string(), raw);
        }
    }
}
