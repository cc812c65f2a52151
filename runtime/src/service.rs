//! Ticket lifecycle service.
//!
//! Executes the lifecycle transitions with their side effects: channel
//! allocation, permission edits, notices, transcript archival, and the
//! grace-delayed channel removal after deletion. Validation (record
//! resolution, stage legality, authorization, quota) happens here before
//! any side effect runs; the pure transition rules live in
//! [`helpdesk_core::lifecycle`].
//!
//! Failure policy follows the availability-over-consistency rule: a
//! registry mutation whose save fails is logged and left applied in memory,
//! and side effects after the authoritative write degrade to warnings
//! rather than failing the caller.

use crate::registry::TicketRegistry;
use crate::router::control;
use helpdesk_core::environment::Clock;
use helpdesk_core::error::TicketError;
use helpdesk_core::gateway::{Button, ButtonStyle, ChannelRequest, ChatGateway, Notice};
use helpdesk_core::lifecycle::{self, TicketAction};
use helpdesk_core::policy::AccessPolicy;
use helpdesk_core::quota::QuotaGuard;
use helpdesk_core::store::StoreError;
use helpdesk_core::transcript::{TranscriptGenerator, TranscriptRef};
use helpdesk_core::types::{Actor, ChannelId, FormData, TicketCategory, TicketRecord, UserId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Executes lifecycle transitions against the registry, gateway, and
/// transcript generator.
pub struct TicketService {
    registry: Arc<TicketRegistry>,
    gateway: Arc<dyn ChatGateway>,
    transcripts: Arc<dyn TranscriptGenerator>,
    policy: AccessPolicy,
    quota: QuotaGuard,
    clock: Arc<dyn Clock>,
    delete_grace: Duration,
    /// Channels with an outstanding close-confirmation prompt. Ephemeral:
    /// scoped to one confirmation exchange, never persisted.
    pending_close: Mutex<HashSet<ChannelId>>,
}

impl TicketService {
    /// Wire up a service from its collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<TicketRegistry>,
        gateway: Arc<dyn ChatGateway>,
        transcripts: Arc<dyn TranscriptGenerator>,
        policy: AccessPolicy,
        quota: QuotaGuard,
        clock: Arc<dyn Clock>,
        delete_grace: Duration,
    ) -> Self {
        Self {
            registry,
            gateway,
            transcripts,
            policy,
            quota,
            clock,
            delete_grace,
            pending_close: Mutex::new(HashSet::new()),
        }
    }

    /// Startup reconciliation: evict records whose channels were deleted
    /// out-of-band while the process was down.
    pub async fn reconcile(&self) {
        match self.registry.prune_dead_channels(self.gateway.as_ref()).await {
            Ok(0) => {}
            Ok(evicted) => info!(evicted, "evicted tickets with missing channels"),
            Err(err) => warn!(%err, "pruned ticket set could not be persisted"),
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Open a new ticket for `requester`.
    ///
    /// Quota is checked against the live registry, the channel is allocated
    /// with view/send for the requester and the category's staff roles, the
    /// record is written, and a welcome notice with the close control is
    /// posted. All entry points (command, panel button, modal submission)
    /// route through here.
    ///
    /// # Errors
    ///
    /// [`TicketError::QuotaExceeded`] when a cap is hit,
    /// [`TicketError::Gateway`] when channel allocation fails. A failure
    /// after the record is written degrades to a warning.
    pub async fn create(
        &self,
        requester: UserId,
        category: TicketCategory,
        form_data: Option<FormData>,
        summary: Option<String>,
    ) -> Result<ChannelId, TicketError> {
        let snapshot = self.registry.snapshot().await;
        self.quota.check(requester, category, snapshot.values())?;

        let request = ChannelRequest {
            name: format!("{}-{:04}", category.id(), requester.get() % 10_000),
            topic: Some(format!("{} ticket for {requester}", category.label())),
            allow_users: vec![requester],
            allow_roles: self.policy.roles_for(category).to_vec(),
        };
        let channel = self.gateway.create_channel(request).await?;

        let record = TicketRecord::open(
            channel,
            requester,
            category,
            self.clock.now(),
            form_data,
        );
        log_unpersisted(self.registry.insert(record).await);

        let mut welcome = format!(
            "Welcome <@{requester}>! Your {} ticket has been opened.",
            category.label()
        );
        let staff = self.policy.roles_for(category);
        if !staff.is_empty() {
            let mentions: Vec<String> =
                staff.iter().map(|role| format!("<@&{role}>")).collect();
            welcome.push_str(&format!(" {} will be with you shortly.", mentions.join(" ")));
        }
        if let Some(summary) = summary {
            welcome.push_str("\n\n");
            welcome.push_str(&summary);
        }
        let notice = Notice::text(welcome)
            .with_color(category.color())
            .with_button(Button::new(control::CLOSE, "Close ticket", ButtonStyle::Danger));
        if let Err(err) = self.gateway.post_notice(channel, notice).await {
            warn!(%channel, %err, "welcome notice could not be posted");
        }

        info!(%channel, %requester, %category, "ticket created");
        Ok(channel)
    }

    // ========================================================================
    // Close flow
    // ========================================================================

    /// Post a close-confirmation prompt for the ticket in `channel`.
    ///
    /// Anyone in the channel may request closing; only the confirmation is
    /// staff-gated. No record mutation happens here.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotATicket`] when the channel has no record,
    /// [`TicketError::InvalidTransition`] when the ticket is not open, and
    /// [`TicketError::Gateway`] when the prompt cannot be posted (the
    /// pending state is rolled back).
    pub async fn request_close(
        &self,
        actor: &Actor,
        channel: ChannelId,
    ) -> Result<(), TicketError> {
        let record = self.require(channel).await?;
        self.check_stage(&record, TicketAction::RequestClose)?;

        self.set_pending(channel, true);
        let prompt = Notice::text(format!(
            "<@{}> asked to close this ticket. Staff, please confirm.",
            actor.user_id
        ))
        .with_button(Button::new(control::CLOSE_CONFIRM, "Confirm close", ButtonStyle::Danger))
        .with_button(Button::new(control::CLOSE_CANCEL, "Keep open", ButtonStyle::Secondary));
        if let Err(err) = self.gateway.post_notice(channel, prompt).await {
            self.set_pending(channel, false);
            return Err(err.into());
        }
        Ok(())
    }

    /// Confirm an outstanding close prompt: revoke the requester's send
    /// permission, mark the record closed, and post the closed notice with
    /// reopen/delete controls.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotATicket`], [`TicketError::InvalidTransition`]
    /// when no prompt is outstanding, [`TicketError::Unauthorized`] for
    /// non-staff actors, and [`TicketError::Gateway`] when the permission
    /// edit fails (the record is left unchanged).
    pub async fn confirm_close(
        &self,
        actor: &Actor,
        channel: ChannelId,
    ) -> Result<(), TicketError> {
        let record = self.require(channel).await?;
        self.check_stage(&record, TicketAction::ConfirmClose)?;
        self.authorize(actor, record.category, TicketAction::ConfirmClose)?;

        self.gateway
            .set_send_permission(channel, record.user_id, false)
            .await?;

        let now = self.clock.now();
        let by = actor.user_id;
        log_unpersisted(
            self.registry
                .update(channel, |r| lifecycle::apply_close(r, by, now))
                .await,
        );
        self.set_pending(channel, false);

        let notice = Notice::text(format!("Ticket closed by <@{by}>."))
            .with_button(Button::new(control::REOPEN, "Reopen", ButtonStyle::Primary))
            .with_button(Button::new(control::DELETE, "Delete", ButtonStyle::Danger));
        if let Err(err) = self.gateway.post_notice(channel, notice).await {
            warn!(%channel, %err, "closed notice could not be posted");
        }

        info!(%channel, closed_by = %by, "ticket closed");
        Ok(())
    }

    /// Discard an outstanding close prompt. No record mutation.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotATicket`] and [`TicketError::InvalidTransition`]
    /// when no prompt is outstanding.
    pub async fn cancel_close(
        &self,
        actor: &Actor,
        channel: ChannelId,
    ) -> Result<(), TicketError> {
        let record = self.require(channel).await?;
        self.check_stage(&record, TicketAction::CancelClose)?;

        self.set_pending(channel, false);
        let ack = Notice::text(format!(
            "<@{}> kept the ticket open.",
            actor.user_id
        ));
        if let Err(err) = self.gateway.post_notice(channel, ack).await {
            warn!(%channel, %err, "cancel acknowledgement could not be posted");
        }
        Ok(())
    }

    // ========================================================================
    // Reopen / delete
    // ========================================================================

    /// Reopen a closed ticket: restore the requester's send permission,
    /// clear `closed`, stamp `reopened_at`/`reopened_by`, and re-post the
    /// standard controls.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotATicket`], [`TicketError::InvalidTransition`]
    /// when the ticket is not closed, [`TicketError::Unauthorized`] for
    /// non-staff actors, and [`TicketError::Gateway`] when the permission
    /// edit fails (the record is left unchanged).
    pub async fn reopen(&self, actor: &Actor, channel: ChannelId) -> Result<(), TicketError> {
        let record = self.require(channel).await?;
        self.check_stage(&record, TicketAction::Reopen)?;
        self.authorize(actor, record.category, TicketAction::Reopen)?;

        self.gateway
            .set_send_permission(channel, record.user_id, true)
            .await?;

        let now = self.clock.now();
        let by = actor.user_id;
        log_unpersisted(
            self.registry
                .update(channel, |r| lifecycle::apply_reopen(r, by, now))
                .await,
        );

        let notice = Notice::text(format!("Ticket reopened by <@{by}>."))
            .with_button(Button::new(control::CLOSE, "Close ticket", ButtonStyle::Danger));
        if let Err(err) = self.gateway.post_notice(channel, notice).await {
            warn!(%channel, %err, "reopen notice could not be posted");
        }

        info!(%channel, reopened_by = %by, "ticket reopened");
        Ok(())
    }

    /// Delete a ticket: archive a transcript best-effort, remove the
    /// record, and remove the channel after the configured grace delay.
    ///
    /// The record is gone before the delay elapses; late events against the
    /// still-visible channel resolve to `NotATicket`.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotATicket`], [`TicketError::InvalidTransition`]
    /// when a close prompt is outstanding, and
    /// [`TicketError::Unauthorized`] for non-staff actors. Transcript and
    /// persistence failures degrade to warnings.
    pub async fn delete(&self, actor: &Actor, channel: ChannelId) -> Result<(), TicketError> {
        let record = self.require(channel).await?;
        self.check_stage(&record, TicketAction::Delete)?;
        self.authorize(actor, record.category, TicketAction::Delete)?;

        match self.transcripts.archive(channel).await {
            Ok(transcript) => {
                info!(%channel, location = %transcript.location, "transcript archived before deletion");
            }
            Err(err) => warn!(%channel, %err, "transcript archival failed, deleting anyway"),
        }

        log_unpersisted(self.registry.remove(channel).await);
        self.set_pending(channel, false);

        let gateway = Arc::clone(&self.gateway);
        let grace = self.delete_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Err(err) = gateway.delete_channel(channel).await {
                warn!(%channel, %err, "deferred channel removal failed");
            }
        });

        info!(%channel, deleted_by = %actor.user_id, "ticket deleted");
        Ok(())
    }

    // ========================================================================
    // Transcripts
    // ========================================================================

    /// Generate a transcript of the ticket in `channel`. Not staff-gated.
    ///
    /// # Errors
    ///
    /// [`TicketError::NotATicket`] when the channel has no record and
    /// [`TicketError::Transcript`] when generation fails.
    pub async fn transcript(&self, channel: ChannelId) -> Result<TranscriptRef, TicketError> {
        let _record = self.require(channel).await?;
        Ok(self.transcripts.archive(channel).await?)
    }

    // ========================================================================
    // Administrative surface
    // ========================================================================

    /// Attach an existing channel to the ticket system as a category/owner
    /// pair. Rejected when the channel is already registered.
    ///
    /// # Errors
    ///
    /// [`TicketError::Unauthorized`] for non-administrators and
    /// [`TicketError::AlreadyRegistered`] when a record already exists.
    pub async fn attach(
        &self,
        actor: &Actor,
        channel: ChannelId,
        category: TicketCategory,
        owner: UserId,
    ) -> Result<(), TicketError> {
        self.require_admin(actor, "attach channels to the ticket system")?;
        if self.registry.get(channel).await.is_some() {
            return Err(TicketError::AlreadyRegistered(channel));
        }

        let record = TicketRecord::attached(channel, owner, category, self.clock.now());
        log_unpersisted(self.registry.insert(record).await);

        let notice = Notice::text(format!(
            "This channel is now registered as a {} ticket for <@{owner}>.",
            category.label()
        ))
        .with_color(category.color())
        .with_button(Button::new(control::CLOSE, "Close ticket", ButtonStyle::Danger));
        if let Err(err) = self.gateway.post_notice(channel, notice).await {
            warn!(%channel, %err, "attach notice could not be posted");
        }

        info!(%channel, %owner, %category, "channel attached as ticket");
        Ok(())
    }

    /// Diagnostic summary: the current channel's ticket status plus
    /// aggregate store statistics.
    ///
    /// # Errors
    ///
    /// [`TicketError::Unauthorized`] for non-administrators.
    pub async fn diagnose(
        &self,
        actor: &Actor,
        channel: ChannelId,
    ) -> Result<String, TicketError> {
        self.require_admin(actor, "inspect ticket diagnostics")?;

        let snapshot = self.registry.snapshot().await;
        let mut report = String::new();

        match snapshot.get(&channel) {
            Some(record) => {
                let stage = lifecycle::stage_of(record, self.is_pending(channel));
                report.push_str(&format!(
                    "This channel hosts a {} ticket for <@{}>, currently {stage}, created {}.\n",
                    record.category.label(),
                    record.user_id,
                    record.created_at.to_rfc3339(),
                ));
                if let (Some(at), Some(by)) = (record.closed_at, record.closed_by) {
                    report.push_str(&format!("Last closed {} by <@{by}>.\n", at.to_rfc3339()));
                }
                if record.manually_registered {
                    report.push_str("Attached to a pre-existing channel.\n");
                }
            }
            None => report.push_str("No ticket is registered for this channel.\n"),
        }

        let open = snapshot.values().filter(|r| r.is_open()).count();
        report.push_str(&format!(
            "\nStore: {} tickets ({open} open, {} closed)\n",
            snapshot.len(),
            snapshot.len() - open,
        ));
        for category in TicketCategory::ALL {
            let total = snapshot.values().filter(|r| r.category == category).count();
            if total > 0 {
                report.push_str(&format!("  {}: {total}\n", category.label()));
            }
        }
        Ok(report)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn require(&self, channel: ChannelId) -> Result<TicketRecord, TicketError> {
        self.registry
            .get(channel)
            .await
            .ok_or(TicketError::NotATicket(channel))
    }

    fn check_stage(
        &self,
        record: &TicketRecord,
        action: TicketAction,
    ) -> Result<(), TicketError> {
        let stage = lifecycle::stage_of(record, self.is_pending(record.channel_id));
        if lifecycle::permits(stage, action) {
            Ok(())
        } else {
            Err(TicketError::InvalidTransition { stage, action })
        }
    }

    fn authorize(
        &self,
        actor: &Actor,
        category: TicketCategory,
        action: TicketAction,
    ) -> Result<(), TicketError> {
        if self.policy.is_staff(actor, category) {
            Ok(())
        } else {
            Err(TicketError::Unauthorized {
                actor: actor.user_id,
                action: format!("{action} {category} tickets"),
            })
        }
    }

    fn require_admin(&self, actor: &Actor, action: &str) -> Result<(), TicketError> {
        if actor.admin {
            Ok(())
        } else {
            Err(TicketError::Unauthorized {
                actor: actor.user_id,
                action: action.to_owned(),
            })
        }
    }

    fn is_pending(&self, channel: ChannelId) -> bool {
        // Poisoning cannot leave the set inconsistent; take it either way.
        match self.pending_close.lock() {
            Ok(pending) => pending.contains(&channel),
            Err(poisoned) => poisoned.into_inner().contains(&channel),
        }
    }

    fn set_pending(&self, channel: ChannelId, pending: bool) {
        let mut set = match self.pending_close.lock() {
            Ok(set) => set,
            Err(poisoned) => poisoned.into_inner(),
        };
        if pending {
            set.insert(channel);
        } else {
            set.remove(&channel);
        }
    }

}

/// Log-and-continue handling for persistence failures after the in-memory
/// mutation has been applied. Memory runs ahead of disk until the next
/// restart; user-visible behavior stays correct.
fn log_unpersisted<T>(result: Result<T, StoreError>) {
    if let Err(err) = result {
        warn!(%err, "ticket state applied in memory but not persisted");
    }
}
