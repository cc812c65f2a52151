//! Chat platform gateway trait.
//!
//! The engine treats the chat platform as an opaque capability surface:
//! channel creation with permission lists, per-user send-permission edits,
//! message posting with attached controls, and channel deletion. The wire
//! protocol behind these calls is the gateway implementation's concern.

use crate::types::{ChannelId, RoleId, UserId};
use async_trait::async_trait;
use smallvec::SmallVec;
use thiserror::Error;

/// Errors surfaced by the chat platform.
///
/// These are collaborator failures: the router reports them to the user
/// generically while the full detail is logged.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The target channel does not exist on the platform.
    #[error("channel {0} not found on the platform")]
    UnknownChannel(ChannelId),

    /// The platform rejected the request (permissions, limits, validation).
    #[error("platform rejected the request: {0}")]
    Rejected(String),

    /// The request never completed (connection loss, timeout upstream).
    #[error("platform transport failure: {0}")]
    Transport(String),
}

/// Visual style of an attached control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    /// Default action.
    Primary,
    /// Neutral action.
    Secondary,
    /// Destructive action.
    Danger,
}

/// One interactive control attached to a notice.
#[derive(Debug, Clone)]
pub struct Button {
    /// Identifier delivered back in the button-press event.
    pub id: String,
    /// Human-facing label.
    pub label: String,
    /// Visual style.
    pub style: ButtonStyle,
}

impl Button {
    /// Create a button with the given identifier, label, and style.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            style,
        }
    }
}

/// A message posted into a ticket channel, with optional controls.
///
/// Most notices carry at most a handful of buttons, so the control list is
/// inline-allocated.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Message body.
    pub text: String,
    /// Accent color, 0xRRGGBB.
    pub color: Option<u32>,
    /// Interactive controls attached to the message.
    pub buttons: SmallVec<[Button; 4]>,
}

impl Notice {
    /// A plain notice with no controls.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            buttons: SmallVec::new(),
        }
    }

    /// Set the accent color.
    #[must_use]
    pub const fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Attach a control.
    #[must_use]
    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }
}

/// Request to allocate a fresh ticket channel.
#[derive(Debug, Clone)]
pub struct ChannelRequest {
    /// Channel name, e.g. `support-4821`.
    pub name: String,
    /// Channel topic line.
    pub topic: Option<String>,
    /// Users granted view/send on the new channel (the requester).
    pub allow_users: Vec<UserId>,
    /// Roles granted view/send on the new channel (the category's staff).
    pub allow_roles: Vec<RoleId>,
}

/// Capability surface of the chat platform.
///
/// Implementations must be cheap to clone behind an `Arc` and safe to call
/// concurrently. No timeouts are imposed here: a hung call stalls its
/// handler, never the run loop.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Allocate a channel with the requested permission overwrites.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the platform rejects the request or
    /// the transport fails.
    async fn create_channel(&self, request: ChannelRequest) -> Result<ChannelId, GatewayError>;

    /// Whether the channel handle still resolves to a live channel.
    async fn channel_exists(&self, channel: ChannelId) -> bool;

    /// Grant or revoke a user's permission to send in a channel.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the channel is unknown or the edit
    /// is rejected.
    async fn set_send_permission(
        &self,
        channel: ChannelId,
        user: UserId,
        allow: bool,
    ) -> Result<(), GatewayError>;

    /// Post a notice into a channel.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the channel is unknown or the post
    /// is rejected.
    async fn post_notice(&self, channel: ChannelId, notice: Notice) -> Result<(), GatewayError>;

    /// Delete a channel.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] when the channel is unknown or deletion
    /// is rejected.
    async fn delete_channel(&self, channel: ChannelId) -> Result<(), GatewayError>;
}
