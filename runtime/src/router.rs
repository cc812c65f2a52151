//! Interaction router.
//!
//! Maps each inbound platform event to exactly one handler by event kind
//! and identifier, and isolates handler execution so one failing handler
//! cannot take the process down. Validation errors answer the actor with
//! their own message; collaborator and persistence failures answer
//! generically while the full detail goes to the log.

use crate::service::TicketService;
use helpdesk_core::error::{GENERIC_FAILURE_NOTICE, TicketError};
use helpdesk_core::panel::{ModalSpec, RequestPanel};
use helpdesk_core::types::{Actor, ChannelId, TicketCategory, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Stable identifiers for the ticket-management controls.
pub mod control {
    use helpdesk_core::types::TicketCategory;

    /// Close-request button on an open ticket.
    pub const CLOSE: &str = "ticket:close";
    /// Confirmation button on the close prompt.
    pub const CLOSE_CONFIRM: &str = "ticket:close:confirm";
    /// Cancel button on the close prompt.
    pub const CLOSE_CANCEL: &str = "ticket:close:cancel";
    /// Reopen button on the closed notice.
    pub const REOPEN: &str = "ticket:reopen";
    /// Delete button on the closed notice.
    pub const DELETE: &str = "ticket:delete";
    /// Category select menu on a creation panel.
    pub const OPEN_MENU: &str = "ticket:open-menu";
    /// Prefix of the per-category creation buttons.
    pub const OPEN_PREFIX: &str = "ticket:open:";
    /// Prefix of the per-category request modals.
    pub const FORM_PREFIX: &str = "ticket:form:";

    /// Creation button id for a category.
    #[must_use]
    pub fn open_button(category: TicketCategory) -> String {
        format!("{OPEN_PREFIX}{category}")
    }

    /// Request modal id for a category.
    #[must_use]
    pub fn form_modal(category: TicketCategory) -> String {
        format!("{FORM_PREFIX}{category}")
    }
}

/// One inbound platform event, as delivered by the gateway process.
#[derive(Debug, Clone)]
pub enum Interaction {
    /// Slash-command invocation: `/ticket <subcommand> [args…]`.
    Command {
        /// Command name.
        name: String,
        /// Subcommand and arguments, in order.
        args: Vec<String>,
        /// Channel the command was invoked in.
        channel: ChannelId,
        /// Who invoked it.
        actor: Actor,
    },
    /// Button press.
    Button {
        /// Control identifier.
        id: String,
        /// Channel hosting the control.
        channel: ChannelId,
        /// Who pressed it.
        actor: Actor,
    },
    /// Select-menu choice.
    SelectMenu {
        /// Menu identifier.
        id: String,
        /// Selected values.
        values: Vec<String>,
        /// Channel hosting the menu.
        channel: ChannelId,
        /// Who chose.
        actor: Actor,
    },
    /// Modal submission.
    ModalSubmit {
        /// Modal identifier.
        id: String,
        /// Submitted field values keyed by field id.
        fields: HashMap<String, String>,
        /// Channel the modal was opened from.
        channel: ChannelId,
        /// Who submitted.
        actor: Actor,
    },
}

impl Interaction {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Button { .. } => "button",
            Self::SelectMenu { .. } => "select-menu",
            Self::ModalSubmit { .. } => "modal",
        }
    }

    const fn channel(&self) -> ChannelId {
        match self {
            Self::Command { channel, .. }
            | Self::Button { channel, .. }
            | Self::SelectMenu { channel, .. }
            | Self::ModalSubmit { channel, .. } => *channel,
        }
    }
}

/// The answer delivered back to the initiating actor.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Ephemeral text answer.
    Message(String),
    /// Present a request modal.
    Modal(ModalSpec),
}

/// An inbound event paired with its response slot.
pub type Envelope = (Interaction, oneshot::Sender<Reply>);

/// Dispatches interactions to lifecycle operations.
pub struct Router {
    service: Arc<TicketService>,
    panels: HashMap<TicketCategory, Arc<dyn RequestPanel>>,
}

impl Router {
    /// A router over the given service, with no panels registered yet.
    #[must_use]
    pub fn new(service: Arc<TicketService>) -> Self {
        Self {
            service,
            panels: HashMap::new(),
        }
    }

    /// Register the request panel for its category.
    #[must_use]
    pub fn with_panel(mut self, panel: Arc<dyn RequestPanel>) -> Self {
        self.panels.insert(panel.category(), panel);
        self
    }

    /// Serve events until the channel closes.
    ///
    /// Every event is handled on its own task; a panicking handler is
    /// reported and, because the response slot has not been used yet,
    /// answered with a generic failure notice. The loop itself never
    /// terminates on a handler fault.
    pub async fn serve(self: Arc<Self>, mut events: mpsc::Receiver<Envelope>) {
        while let Some((interaction, respond)) = events.recv().await {
            let router = Arc::clone(&self);
            tokio::spawn(async move {
                let handler = tokio::spawn({
                    let router = Arc::clone(&router);
                    async move { router.dispatch(interaction).await }
                });
                match handler.await {
                    Ok(reply) => {
                        let _ = respond.send(reply);
                    }
                    Err(fault) => {
                        error!(%fault, "interaction handler crashed");
                        let _ = respond.send(Reply::Message(GENERIC_FAILURE_NOTICE.to_owned()));
                    }
                }
            });
        }
    }

    /// Handle one interaction and produce the answer for the actor.
    ///
    /// Never fails outward: errors are resolved into a [`Reply`] here,
    /// with validation failures explained and everything else reported
    /// generically.
    pub async fn dispatch(&self, interaction: Interaction) -> Reply {
        let kind = interaction.kind();
        let channel = interaction.channel();
        info!(kind, %channel, "dispatching interaction");

        match self.handle(interaction).await {
            Ok(reply) => reply,
            Err(err) if err.is_validation() => {
                info!(kind, %channel, %err, "interaction rejected");
                Reply::Message(err.user_message())
            }
            Err(err) => {
                error!(kind, %channel, error = ?err, "interaction handler failed");
                Reply::Message(err.user_message())
            }
        }
    }

    async fn handle(&self, interaction: Interaction) -> Result<Reply, TicketError> {
        match interaction {
            Interaction::Command {
                name,
                args,
                channel,
                actor,
            } => self.handle_command(&name, &args, channel, &actor).await,
            Interaction::Button { id, channel, actor } => {
                self.handle_button(&id, channel, &actor).await
            }
            Interaction::SelectMenu {
                id,
                values,
                channel: _,
                actor,
            } => {
                if id == control::OPEN_MENU {
                    let Some(choice) = values.first() else {
                        return Ok(Reply::Message("Pick a category first.".to_owned()));
                    };
                    self.begin_creation(choice, &actor).await
                } else {
                    warn!(%id, "unknown select menu");
                    Ok(Reply::Message("This menu is no longer supported.".to_owned()))
                }
            }
            Interaction::ModalSubmit {
                id,
                fields,
                channel: _,
                actor,
            } => self.handle_modal(&id, &fields, &actor).await,
        }
    }

    async fn handle_command(
        &self,
        name: &str,
        args: &[String],
        channel: ChannelId,
        actor: &Actor,
    ) -> Result<Reply, TicketError> {
        if name != "ticket" {
            warn!(%name, "unknown command");
            return Ok(Reply::Message(format!("Unknown command {name:?}.")));
        }

        match args.first().map(String::as_str) {
            Some("open") => match args.get(1) {
                Some(raw) => self.begin_creation(raw, actor).await,
                None => Ok(Reply::Message(category_menu_hint())),
            },
            Some("attach") => {
                let (Some(raw_category), Some(raw_owner)) = (args.get(1), args.get(2)) else {
                    return Ok(Reply::Message(
                        "Usage: /ticket attach <category> <owner-id>".to_owned(),
                    ));
                };
                let Ok(category) = raw_category.parse::<TicketCategory>() else {
                    return Ok(Reply::Message(category_menu_hint()));
                };
                let Ok(owner) = raw_owner.parse::<UserId>() else {
                    return Ok(Reply::Message(format!(
                        "{raw_owner:?} is not a valid user id."
                    )));
                };
                self.service.attach(actor, channel, category, owner).await?;
                Ok(Reply::Message(format!(
                    "Channel attached as a {} ticket for <@{owner}>.",
                    category.label()
                )))
            }
            Some("diagnose") => {
                let report = self.service.diagnose(actor, channel).await?;
                Ok(Reply::Message(report))
            }
            Some("transcript") => {
                let transcript = self.service.transcript(channel).await?;
                Ok(Reply::Message(format!(
                    "Transcript ready: {}",
                    transcript.location
                )))
            }
            _ => Ok(Reply::Message(
                "Subcommands: open, attach, diagnose, transcript".to_owned(),
            )),
        }
    }

    async fn handle_button(
        &self,
        id: &str,
        channel: ChannelId,
        actor: &Actor,
    ) -> Result<Reply, TicketError> {
        match id {
            control::CLOSE => {
                self.service.request_close(actor, channel).await?;
                Ok(Reply::Message("Close confirmation posted.".to_owned()))
            }
            control::CLOSE_CONFIRM => {
                self.service.confirm_close(actor, channel).await?;
                Ok(Reply::Message("Ticket closed.".to_owned()))
            }
            control::CLOSE_CANCEL => {
                self.service.cancel_close(actor, channel).await?;
                Ok(Reply::Message("Close request cancelled.".to_owned()))
            }
            control::REOPEN => {
                self.service.reopen(actor, channel).await?;
                Ok(Reply::Message("Ticket reopened.".to_owned()))
            }
            control::DELETE => {
                self.service.delete(actor, channel).await?;
                Ok(Reply::Message(
                    "Ticket deleted. The channel will be removed shortly.".to_owned(),
                ))
            }
            other => {
                if let Some(raw) = other.strip_prefix(control::OPEN_PREFIX) {
                    return self.begin_creation(raw, actor).await;
                }
                warn!(id = %other, "unknown button");
                Ok(Reply::Message("This control is no longer supported.".to_owned()))
            }
        }
    }

    async fn handle_modal(
        &self,
        id: &str,
        fields: &HashMap<String, String>,
        actor: &Actor,
    ) -> Result<Reply, TicketError> {
        let Some(raw) = id.strip_prefix(control::FORM_PREFIX) else {
            warn!(%id, "unknown modal");
            return Ok(Reply::Message("This form is no longer supported.".to_owned()));
        };
        let Ok(category) = raw.parse::<TicketCategory>() else {
            return Ok(Reply::Message(category_menu_hint()));
        };
        let Some(panel) = self.panels.get(&category) else {
            warn!(%category, "modal submitted for a category with no panel");
            return Ok(Reply::Message(GENERIC_FAILURE_NOTICE.to_owned()));
        };

        let form = match panel.extract(fields) {
            Ok(form) => form,
            Err(err) => return Ok(Reply::Message(err.to_string())),
        };
        let summary = panel.summary(&form);
        let channel = self
            .service
            .create(actor.user_id, category, Some(form), Some(summary))
            .await?;
        Ok(Reply::Message(format!(
            "Your {} ticket is ready: <#{channel}>",
            category.label()
        )))
    }

    /// Common entry for every creation path: slash-invocation, panel
    /// button, and menu choice all land here and route through the same
    /// quota check and `create` transition.
    async fn begin_creation(&self, raw: &str, actor: &Actor) -> Result<Reply, TicketError> {
        let Ok(category) = raw.parse::<TicketCategory>() else {
            return Ok(Reply::Message(category_menu_hint()));
        };

        // With a registered panel the form comes first; otherwise the
        // ticket opens immediately without form data.
        if let Some(panel) = self.panels.get(&category) {
            return Ok(Reply::Modal(panel.modal()));
        }
        let channel = self
            .service
            .create(actor.user_id, category, None, None)
            .await?;
        Ok(Reply::Message(format!(
            "Your {} ticket is ready: <#{channel}>",
            category.label()
        )))
    }
}

fn category_menu_hint() -> String {
    let ids: Vec<&str> = TicketCategory::ALL.iter().map(|c| c.id()).collect();
    format!("Pick a valid category: {}", ids.join(", "))
}
