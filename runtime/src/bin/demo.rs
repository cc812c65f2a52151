//! Helpdesk engine demo.
//!
//! Drives the full ticket lifecycle against an in-process gateway:
//! creation through a request form, the close-confirmation exchange,
//! reopening, diagnostics, and deletion with transcript archival.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use async_trait::async_trait;
use helpdesk_core::environment::SystemClock;
use helpdesk_core::gateway::{ChannelRequest, ChatGateway, GatewayError, Notice};
use helpdesk_core::panel::{ModalField, ModalSpec, PanelError, RequestPanel};
use helpdesk_core::quota::QuotaGuard;
use helpdesk_core::transcript::{TranscriptError, TranscriptGenerator, TranscriptRef};
use helpdesk_core::types::{Actor, ChannelId, FormData, TicketCategory, UserId};
use helpdesk_runtime::router::{Interaction, Reply, Router, control};
use helpdesk_runtime::{Config, JsonFileStore, TicketRegistry, TicketService};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gateway that narrates every platform call to stdout.
#[derive(Default)]
struct ConsoleGateway {
    state: Mutex<(u64, HashSet<ChannelId>)>,
}

#[async_trait]
impl ChatGateway for ConsoleGateway {
    async fn create_channel(&self, request: ChannelRequest) -> Result<ChannelId, GatewayError> {
        let channel = {
            let mut state = self.state.lock().map_err(|_| {
                GatewayError::Transport("gateway state poisoned".to_owned())
            })?;
            state.0 += 1;
            let channel = ChannelId::from_raw(900_000_000_000_000_000 + state.0);
            state.1.insert(channel);
            channel
        };
        println!("  [platform] #{} created ({})", request.name, channel);
        Ok(channel)
    }

    async fn channel_exists(&self, channel: ChannelId) -> bool {
        self.state
            .lock()
            .map(|state| state.1.contains(&channel))
            .unwrap_or(false)
    }

    async fn set_send_permission(
        &self,
        channel: ChannelId,
        user: UserId,
        allow: bool,
    ) -> Result<(), GatewayError> {
        let verb = if allow { "granted" } else { "revoked" };
        println!("  [platform] send {verb} for {user} in {channel}");
        Ok(())
    }

    async fn post_notice(&self, channel: ChannelId, notice: Notice) -> Result<(), GatewayError> {
        println!("  [#{channel}] {}", notice.text.replace('\n', " | "));
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), GatewayError> {
        if let Ok(mut state) = self.state.lock() {
            state.1.remove(&channel);
        }
        println!("  [platform] channel {channel} removed");
        Ok(())
    }
}

/// Transcript generator that pretends to upload an archive.
struct DemoTranscripts;

#[async_trait]
impl TranscriptGenerator for DemoTranscripts {
    async fn archive(&self, channel: ChannelId) -> Result<TranscriptRef, TranscriptError> {
        Ok(TranscriptRef {
            file_name: format!("transcript-{channel}.html"),
            location: format!("archive://tickets/{channel}"),
        })
    }
}

/// Support request form with a subject line.
struct SupportPanel;

impl RequestPanel for SupportPanel {
    fn category(&self) -> TicketCategory {
        TicketCategory::Support
    }

    fn modal(&self) -> ModalSpec {
        ModalSpec {
            custom_id: control::form_modal(TicketCategory::Support),
            title: "New support request".to_owned(),
            fields: vec![ModalField {
                id: "subject".to_owned(),
                label: "What do you need help with?".to_owned(),
                required: true,
                multiline: false,
            }],
        }
    }

    fn extract(&self, submitted: &HashMap<String, String>) -> Result<FormData, PanelError> {
        let subject = submitted
            .get("subject")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PanelError::MissingField("subject".to_owned()))?;
        let mut form = FormData::new();
        form.insert("subject".to_owned(), subject.trim().into());
        Ok(form)
    }

    fn summary(&self, data: &FormData) -> String {
        let subject = data
            .get("subject")
            .and_then(|v| v.as_str())
            .unwrap_or("(no subject)");
        format!("**Subject:** {subject}")
    }
}

fn print_reply(step: &str, reply: &Reply) {
    match reply {
        Reply::Message(text) => println!("{step}: {text}"),
        Reply::Modal(spec) => println!("{step}: form {} presented", spec.custom_id),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,helpdesk_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n============================================");
    println!("   Helpdesk Ticket Engine - Live Demo");
    println!("============================================\n");

    let config = Config::from_env();
    let store = Arc::new(JsonFileStore::new(&config.storage.path));
    let registry = Arc::new(TicketRegistry::new(store));
    let gateway: Arc<dyn ChatGateway> = Arc::new(ConsoleGateway::default());
    let service = Arc::new(TicketService::new(
        Arc::clone(&registry),
        Arc::clone(&gateway),
        Arc::new(DemoTranscripts),
        config.staff.access_policy(),
        QuotaGuard::new(config.quota.into()),
        Arc::new(SystemClock),
        config.lifecycle.delete_grace(),
    ));
    service.reconcile().await;

    let router = Router::new(Arc::clone(&service)).with_panel(Arc::new(SupportPanel));

    let requester = Actor::new(UserId::from_raw(400_000_000_000_000_001));
    let staff = Actor::new(UserId::from_raw(400_000_000_000_000_002)).as_admin();
    let panel_channel = ChannelId::from_raw(900_000_000_000_000_000);

    // 1. The requester presses the creation button and submits the form.
    let reply = router
        .dispatch(Interaction::Button {
            id: control::open_button(TicketCategory::Support),
            channel: panel_channel,
            actor: requester.clone(),
        })
        .await;
    print_reply("1. open button", &reply);

    let mut fields = HashMap::new();
    fields.insert("subject".to_owned(), "I cannot access my account".to_owned());
    let reply = router
        .dispatch(Interaction::ModalSubmit {
            id: control::form_modal(TicketCategory::Support),
            fields,
            channel: panel_channel,
            actor: requester.clone(),
        })
        .await;
    print_reply("2. form submitted", &reply);

    let snapshot = registry.snapshot().await;
    let Some(ticket) = snapshot.values().next() else {
        return Err("ticket was not created".into());
    };
    let channel = ticket.channel_id;

    // 2. Close flow: request, confirm, then reopen.
    let reply = router
        .dispatch(Interaction::Button {
            id: control::CLOSE.to_owned(),
            channel,
            actor: requester.clone(),
        })
        .await;
    print_reply("3. close requested", &reply);

    let reply = router
        .dispatch(Interaction::Button {
            id: control::CLOSE_CONFIRM.to_owned(),
            channel,
            actor: staff.clone(),
        })
        .await;
    print_reply("4. close confirmed", &reply);

    let reply = router
        .dispatch(Interaction::Button {
            id: control::REOPEN.to_owned(),
            channel,
            actor: staff.clone(),
        })
        .await;
    print_reply("5. reopened", &reply);

    // 3. Diagnostics, then deletion.
    let reply = router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec!["diagnose".to_owned()],
            channel,
            actor: staff.clone(),
        })
        .await;
    print_reply("6. diagnostics", &reply);

    let reply = router
        .dispatch(Interaction::Button {
            id: control::DELETE.to_owned(),
            channel,
            actor: staff,
        })
        .await;
    print_reply("7. deleted", &reply);

    // Let the grace-delayed channel removal run before exiting.
    tokio::time::sleep(config.lifecycle.delete_grace() + std::time::Duration::from_millis(100))
        .await;

    println!("\nDemo complete.\n");
    Ok(())
}
