//! Interaction dispatch: event → handler mapping, validation reporting,
//! and failure isolation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use helpdesk_core::error::GENERIC_FAILURE_NOTICE;
use helpdesk_core::policy::AccessPolicy;
use helpdesk_core::quota::{QuotaConfig, QuotaGuard};
use helpdesk_core::types::{Actor, ChannelId, TicketCategory, UserId};
use helpdesk_runtime::registry::TicketRegistry;
use helpdesk_runtime::router::{Interaction, Reply, Router, control};
use helpdesk_runtime::service::TicketService;
use helpdesk_testing::{
    MemoryStore, MockGateway, RecordingTranscripts, StubPanel, test_clock,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const STAFF_ROLE: &str = "100000000000000001";

fn requester() -> UserId {
    UserId::from_raw(400_000_000_000_000_001)
}

fn requester_actor() -> Actor {
    Actor::new(requester())
}

fn staff_actor() -> Actor {
    Actor::new(UserId::from_raw(400_000_000_000_000_002))
        .with_roles(vec![STAFF_ROLE.parse().unwrap()])
}

fn admin_actor() -> Actor {
    Actor::new(UserId::from_raw(400_000_000_000_000_004)).as_admin()
}

struct Harness {
    router: Arc<Router>,
    service: Arc<TicketService>,
    registry: Arc<TicketRegistry>,
    gateway: Arc<MockGateway>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let gateway = Arc::new(MockGateway::new());
    let transcripts = Arc::new(RecordingTranscripts::default());
    let registry = Arc::new(TicketRegistry::new(store));
    let policy = AccessPolicy::from_raw(
        TicketCategory::ALL
            .iter()
            .map(|category| (*category, vec![STAFF_ROLE])),
    );
    let service = Arc::new(TicketService::new(
        Arc::clone(&registry),
        Arc::clone(&gateway) as Arc<dyn helpdesk_core::gateway::ChatGateway>,
        transcripts,
        policy,
        QuotaGuard::new(QuotaConfig::default()),
        Arc::new(test_clock()),
        Duration::ZERO,
    ));
    let router = Arc::new(
        Router::new(Arc::clone(&service)).with_panel(Arc::new(StubPanel::new(
            TicketCategory::Support,
        ))),
    );
    Harness {
        router,
        service,
        registry,
        gateway,
    }
}

fn message(reply: &Reply) -> &str {
    match reply {
        Reply::Message(text) => text,
        Reply::Modal(_) => panic!("expected a message reply, got a modal"),
    }
}

async fn open_ticket(h: &Harness) -> ChannelId {
    h.service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn close_buttons_drive_the_confirmation_flow() {
    let h = harness();
    let channel = open_ticket(&h).await;

    let reply = h
        .router
        .dispatch(Interaction::Button {
            id: control::CLOSE.to_owned(),
            channel,
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("confirmation"));

    let reply = h
        .router
        .dispatch(Interaction::Button {
            id: control::CLOSE_CONFIRM.to_owned(),
            channel,
            actor: staff_actor(),
        })
        .await;
    assert_eq!(message(&reply), "Ticket closed.");
    assert!(h.registry.get(channel).await.unwrap().closed);

    let reply = h
        .router
        .dispatch(Interaction::Button {
            id: control::REOPEN.to_owned(),
            channel,
            actor: staff_actor(),
        })
        .await;
    assert_eq!(message(&reply), "Ticket reopened.");
    assert!(!h.registry.get(channel).await.unwrap().closed);
}

#[tokio::test]
async fn controls_on_unregistered_channels_report_not_a_ticket() {
    let h = harness();
    let stray = ChannelId::from_raw(900_000_000_000_000_321);
    h.gateway.seed_channel(stray);

    let reply = h
        .router
        .dispatch(Interaction::Button {
            id: control::CLOSE.to_owned(),
            channel: stray,
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("not a ticket"));
}

#[tokio::test]
async fn unknown_controls_are_answered_not_crashed() {
    let h = harness();
    let channel = open_ticket(&h).await;

    let reply = h
        .router
        .dispatch(Interaction::Button {
            id: "legacy:button".to_owned(),
            channel,
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("no longer supported"));
}

#[tokio::test]
async fn creation_button_opens_the_category_form() {
    let h = harness();
    let panel_channel = ChannelId::from_raw(900_000_000_000_000_100);

    let reply = h
        .router
        .dispatch(Interaction::Button {
            id: control::open_button(TicketCategory::Support),
            channel: panel_channel,
            actor: requester_actor(),
        })
        .await;
    let Reply::Modal(spec) = reply else {
        panic!("expected the request modal");
    };
    assert_eq!(spec.custom_id, control::form_modal(TicketCategory::Support));
}

#[tokio::test]
async fn modal_submission_creates_the_ticket_with_form_data() {
    let h = harness();
    let panel_channel = ChannelId::from_raw(900_000_000_000_000_100);

    let mut fields = HashMap::new();
    fields.insert("subject".to_owned(), "Cannot log in".to_owned());
    let reply = h
        .router
        .dispatch(Interaction::ModalSubmit {
            id: control::form_modal(TicketCategory::Support),
            fields,
            channel: panel_channel,
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("ticket is ready"));

    let snapshot = h.registry.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    let record = snapshot.values().next().unwrap();
    assert_eq!(record.category, TicketCategory::Support);
    assert_eq!(
        record.form_data.as_ref().unwrap()["subject"],
        "Cannot log in"
    );
}

#[tokio::test]
async fn modal_submission_missing_required_fields_is_explained() {
    let h = harness();
    let reply = h
        .router
        .dispatch(Interaction::ModalSubmit {
            id: control::form_modal(TicketCategory::Support),
            fields: HashMap::new(),
            channel: ChannelId::from_raw(900_000_000_000_000_100),
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("required field"));
    assert!(h.registry.snapshot().await.is_empty());
}

#[tokio::test]
async fn menu_choice_without_a_panel_creates_directly() {
    let h = harness();
    let reply = h
        .router
        .dispatch(Interaction::SelectMenu {
            id: control::OPEN_MENU.to_owned(),
            values: vec!["booking".to_owned()],
            channel: ChannelId::from_raw(900_000_000_000_000_100),
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("Booking ticket is ready"));
    assert_eq!(h.registry.snapshot().await.len(), 1);
}

#[tokio::test]
async fn quota_denial_names_the_cap_that_was_hit() {
    let h = harness();
    for _ in 0..3 {
        h.service
            .create(requester(), TicketCategory::Booking, None, None)
            .await
            .unwrap();
    }

    let reply = h
        .router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec!["open".to_owned(), "booking".to_owned()],
            channel: ChannelId::from_raw(900_000_000_000_000_100),
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("3 open booking tickets (limit 3)"));
}

#[tokio::test]
async fn collaborator_failures_are_reported_generically() {
    let h = harness();
    h.gateway.fail_creates();

    let reply = h
        .router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec!["open".to_owned(), "booking".to_owned()],
            channel: ChannelId::from_raw(900_000_000_000_000_100),
            actor: requester_actor(),
        })
        .await;
    assert_eq!(message(&reply), GENERIC_FAILURE_NOTICE);
}

#[tokio::test]
async fn admin_commands_attach_and_diagnose() {
    let h = harness();
    let channel = ChannelId::from_raw(900_000_000_000_000_200);
    h.gateway.seed_channel(channel);

    let reply = h
        .router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec![
                "attach".to_owned(),
                "hr".to_owned(),
                requester().to_string(),
            ],
            channel,
            actor: admin_actor(),
        })
        .await;
    assert!(message(&reply).contains("attached"));
    assert!(h.registry.get(channel).await.unwrap().manually_registered);

    let reply = h
        .router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec!["diagnose".to_owned()],
            channel,
            actor: admin_actor(),
        })
        .await;
    assert!(message(&reply).contains("HR ticket"));

    // Non-admins are turned away with the denial, not the report.
    let reply = h
        .router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec!["diagnose".to_owned()],
            channel,
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("not permitted"));
}

#[tokio::test]
async fn transcript_command_returns_the_artifact_location() {
    let h = harness();
    let channel = open_ticket(&h).await;

    let reply = h
        .router
        .dispatch(Interaction::Command {
            name: "ticket".to_owned(),
            args: vec!["transcript".to_owned()],
            channel,
            actor: requester_actor(),
        })
        .await;
    assert!(message(&reply).contains("archive://tickets/"));
}

#[tokio::test]
async fn serve_answers_each_event_on_its_own_task() {
    let h = harness();
    let channel = open_ticket(&h).await;

    let (events, receiver) = mpsc::channel(8);
    let router = Arc::clone(&h.router);
    let loop_handle = tokio::spawn(router.serve(receiver));

    let (respond, reply) = oneshot::channel();
    events
        .send((
            Interaction::Button {
                id: control::CLOSE.to_owned(),
                channel,
                actor: requester_actor(),
            },
            respond,
        ))
        .await
        .unwrap();

    let reply = reply.await.unwrap();
    assert!(message(&reply).contains("confirmation"));

    drop(events);
    loop_handle.await.unwrap();
}
