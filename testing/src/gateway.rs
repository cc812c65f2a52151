//! Recording fake of the chat platform gateway.

use async_trait::async_trait;
use helpdesk_core::gateway::{ChannelRequest, ChatGateway, GatewayError, Notice};
use helpdesk_core::types::{ChannelId, RoleId, UserId};
use std::collections::HashSet;
use std::sync::Mutex;

/// One call the gateway received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// A channel was allocated.
    CreateChannel {
        /// Requested channel name.
        name: String,
        /// Users granted view/send.
        allow_users: Vec<UserId>,
        /// Roles granted view/send.
        allow_roles: Vec<RoleId>,
    },
    /// A send-permission edit.
    SetSendPermission {
        /// Target channel.
        channel: ChannelId,
        /// Target user.
        user: UserId,
        /// Granted or revoked.
        allow: bool,
    },
    /// A notice was posted.
    PostNotice {
        /// Target channel.
        channel: ChannelId,
        /// Message body.
        text: String,
        /// Ids of the attached controls.
        button_ids: Vec<String>,
    },
    /// A channel was deleted.
    DeleteChannel {
        /// Target channel.
        channel: ChannelId,
    },
}

#[derive(Default)]
struct Inner {
    next_channel: u64,
    live: HashSet<ChannelId>,
    calls: Vec<GatewayCall>,
    fail_create: bool,
    fail_permissions: bool,
    fail_post: bool,
    fail_delete: bool,
}

/// In-memory gateway that records every call and can be told to fail.
///
/// Channels allocated through [`ChatGateway::create_channel`] get
/// sequential ids starting at a fixed snowflake-shaped base; seeded
/// channels count as live for [`ChatGateway::channel_exists`].
pub struct MockGateway {
    inner: Mutex<Inner>,
}

const CHANNEL_BASE: u64 = 900_000_000_000_000_000;

impl MockGateway {
    /// A gateway with no live channels and no injected failures.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Mark a channel as live without going through `create_channel`.
    pub fn seed_channel(&self, channel: ChannelId) {
        self.lock().live.insert(channel);
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Channels currently live.
    #[must_use]
    pub fn live_channels(&self) -> HashSet<ChannelId> {
        self.lock().live.clone()
    }

    /// The most recent send-permission value set for `user` in `channel`.
    #[must_use]
    pub fn send_permission(&self, channel: ChannelId, user: UserId) -> Option<bool> {
        self.lock()
            .calls
            .iter()
            .rev()
            .find_map(|call| match call {
                GatewayCall::SetSendPermission {
                    channel: c,
                    user: u,
                    allow,
                } if *c == channel && *u == user => Some(*allow),
                _ => None,
            })
    }

    /// Texts of every notice posted into `channel`, in order.
    #[must_use]
    pub fn notices(&self, channel: ChannelId) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                GatewayCall::PostNotice {
                    channel: c, text, ..
                } if *c == channel => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Fail subsequent channel creations.
    pub fn fail_creates(&self) {
        self.lock().fail_create = true;
    }

    /// Fail subsequent permission edits.
    pub fn fail_permission_edits(&self) {
        self.lock().fail_permissions = true;
    }

    /// Fail subsequent notice posts.
    pub fn fail_posts(&self) {
        self.lock().fail_post = true;
    }

    /// Fail subsequent channel deletions.
    pub fn fail_deletes(&self) {
        self.lock().fail_delete = true;
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn create_channel(&self, request: ChannelRequest) -> Result<ChannelId, GatewayError> {
        let mut inner = self.lock();
        if inner.fail_create {
            return Err(GatewayError::Rejected("injected create failure".to_owned()));
        }
        inner.next_channel += 1;
        let channel = ChannelId::from_raw(CHANNEL_BASE + inner.next_channel);
        inner.live.insert(channel);
        inner.calls.push(GatewayCall::CreateChannel {
            name: request.name,
            allow_users: request.allow_users,
            allow_roles: request.allow_roles,
        });
        Ok(channel)
    }

    async fn channel_exists(&self, channel: ChannelId) -> bool {
        self.lock().live.contains(&channel)
    }

    async fn set_send_permission(
        &self,
        channel: ChannelId,
        user: UserId,
        allow: bool,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        if inner.fail_permissions {
            return Err(GatewayError::Rejected(
                "injected permission failure".to_owned(),
            ));
        }
        if !inner.live.contains(&channel) {
            return Err(GatewayError::UnknownChannel(channel));
        }
        inner.calls.push(GatewayCall::SetSendPermission {
            channel,
            user,
            allow,
        });
        Ok(())
    }

    async fn post_notice(&self, channel: ChannelId, notice: Notice) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        if inner.fail_post {
            return Err(GatewayError::Transport("injected post failure".to_owned()));
        }
        if !inner.live.contains(&channel) {
            return Err(GatewayError::UnknownChannel(channel));
        }
        inner.calls.push(GatewayCall::PostNotice {
            channel,
            text: notice.text,
            button_ids: notice.buttons.iter().map(|b| b.id.clone()).collect(),
        });
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        if inner.fail_delete {
            return Err(GatewayError::Rejected("injected delete failure".to_owned()));
        }
        if !inner.live.remove(&channel) {
            return Err(GatewayError::UnknownChannel(channel));
        }
        inner.calls.push(GatewayCall::DeleteChannel { channel });
        Ok(())
    }
}
