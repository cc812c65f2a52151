//! End-to-end lifecycle flows through the ticket service, exercised
//! against the in-memory collaborator fakes.

#![allow(clippy::unwrap_used)]

use chrono::Duration as ChronoDuration;
use helpdesk_core::environment::Clock;
use helpdesk_core::error::TicketError;
use helpdesk_core::policy::AccessPolicy;
use helpdesk_core::quota::{QuotaConfig, QuotaGuard};
use helpdesk_core::types::{Actor, ChannelId, TicketCategory, TicketRecord, UserId};
use helpdesk_runtime::registry::TicketRegistry;
use helpdesk_runtime::service::TicketService;
use helpdesk_testing::{MemoryStore, MockGateway, RecordingTranscripts, SteppingClock, test_clock};
use std::sync::Arc;
use std::time::Duration;

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

fn outsider_actor() -> Actor {
    Actor::new(UserId::from_raw(400_000_000_000_000_003))
}

fn admin_actor() -> Actor {
    Actor::new(UserId::from_raw(400_000_000_000_000_004)).as_admin()
}

struct Harness {
    service: TicketService,
    registry: Arc<TicketRegistry>,
    gateway: Arc<MockGateway>,
    store: Arc<MemoryStore>,
    transcripts: Arc<RecordingTranscripts>,
}

fn harness() -> Harness {
    harness_with_grace(Duration::ZERO)
}

fn harness_with_grace(grace: Duration) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let gateway = Arc::new(MockGateway::new());
    let transcripts = Arc::new(RecordingTranscripts::default());
    let registry = Arc::new(TicketRegistry::new(
        Arc::clone(&store) as Arc<dyn helpdesk_core::store::TicketStore>,
    ));
    let policy = AccessPolicy::from_raw(
        TicketCategory::ALL
            .iter()
            .map(|category| (*category, vec![STAFF_ROLE])),
    );
    let clock = Arc::new(SteppingClock::new(
        test_clock().now(),
        ChronoDuration::seconds(30),
    ));
    let service = TicketService::new(
        Arc::clone(&registry),
        Arc::clone(&gateway) as Arc<dyn helpdesk_core::gateway::ChatGateway>,
        Arc::clone(&transcripts) as Arc<dyn helpdesk_core::transcript::TranscriptGenerator>,
        policy,
        QuotaGuard::new(QuotaConfig::default()),
        clock,
        grace,
    );
    Harness {
        service,
        registry,
        gateway,
        store,
        transcripts,
    }
}

async fn record(h: &Harness, channel: ChannelId) -> TicketRecord {
    h.registry.get(channel).await.unwrap()
}

#[tokio::test]
async fn create_grants_access_and_notifies_staff() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    let ticket = record(&h, channel).await;
    assert!(ticket.is_open());
    assert_eq!(ticket.user_id, requester());
    assert_eq!(ticket.category, TicketCategory::Support);

    // The record is durable before the caller hears back.
    assert!(h.store.saved().contains_key(&channel));

    let calls = h.gateway.calls();
    assert!(matches!(
        &calls[0],
        helpdesk_testing::GatewayCall::CreateChannel { allow_users, allow_roles, .. }
            if allow_users == &vec![requester()] && allow_roles.len() == 1
    ));
    let welcome = &h.gateway.notices(channel)[0];
    assert!(welcome.contains(&format!("<@{}>", requester())));
    assert!(welcome.contains(&format!("<@&{STAFF_ROLE}>")));
}

#[tokio::test]
async fn close_request_then_cancel_leaves_the_record_untouched() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    h.service
        .request_close(&requester_actor(), channel)
        .await
        .unwrap();
    h.service
        .cancel_close(&staff_actor(), channel)
        .await
        .unwrap();

    let ticket = record(&h, channel).await;
    assert!(!ticket.closed);
    assert!(ticket.closed_at.is_none());
    assert!(ticket.closed_by.is_none());
}

#[tokio::test]
async fn close_confirm_reopen_populates_timestamps_in_order() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();
    let staff = staff_actor();

    h.service
        .request_close(&requester_actor(), channel)
        .await
        .unwrap();
    h.service.confirm_close(&staff, channel).await.unwrap();

    let closed = record(&h, channel).await;
    assert!(closed.closed);
    assert_eq!(closed.closed_by, Some(staff.user_id));
    assert_eq!(h.gateway.send_permission(channel, requester()), Some(false));

    h.service.reopen(&staff, channel).await.unwrap();

    let reopened = record(&h, channel).await;
    assert!(!reopened.closed);
    assert!(reopened.closed_at.is_some());
    assert!(reopened.reopened_at.is_some());
    assert!(reopened.reopened_at.unwrap() > reopened.closed_at.unwrap());
    assert_eq!(h.gateway.send_permission(channel, requester()), Some(true));
}

#[tokio::test]
async fn confirm_without_an_outstanding_prompt_is_rejected() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    let err = h
        .service
        .confirm_close(&staff_actor(), channel)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::InvalidTransition { .. }));
    assert!(!record(&h, channel).await.closed);
}

#[tokio::test]
async fn sensitive_transitions_require_staff() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();
    let outsider = outsider_actor();

    h.service
        .request_close(&requester_actor(), channel)
        .await
        .unwrap();
    let err = h
        .service
        .confirm_close(&outsider, channel)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { .. }));
    assert!(!record(&h, channel).await.closed);

    h.service
        .confirm_close(&staff_actor(), channel)
        .await
        .unwrap();
    let err = h.service.reopen(&outsider, channel).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { .. }));
    assert!(record(&h, channel).await.closed);

    let err = h.service.delete(&outsider, channel).await.unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { .. }));
    assert!(h.registry.get(channel).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn delete_removes_the_record_before_the_channel() {
    let h = harness_with_grace(Duration::from_secs(5));
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    h.service.delete(&staff_actor(), channel).await.unwrap();

    // Record and durable copy are gone immediately; the channel survives
    // until the grace delay elapses.
    assert!(h.registry.get(channel).await.is_none());
    assert!(!h.store.saved().contains_key(&channel));
    assert_eq!(h.transcripts.requests(), vec![channel]);
    assert!(h.gateway.live_channels().contains(&channel));

    // A late event inside the grace window resolves to NotATicket.
    let err = h
        .service
        .request_close(&requester_actor(), channel)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::NotATicket(late) if late == channel));

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!h.gateway.live_channels().contains(&channel));
}

#[tokio::test(start_paused = true)]
async fn transcript_failure_does_not_block_deletion() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    h.transcripts.fail_all();
    h.service.delete(&staff_actor(), channel).await.unwrap();
    assert!(h.registry.get(channel).await.is_none());
}

#[tokio::test]
async fn quota_is_enforced_against_the_live_registry() {
    let h = harness();
    for _ in 0..3 {
        h.service
            .create(requester(), TicketCategory::Support, None, None)
            .await
            .unwrap();
    }

    let err = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::QuotaExceeded(_)));

    // A different category is still allowed.
    h.service
        .create(requester(), TicketCategory::Booking, None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_persistence_degrades_instead_of_failing_the_user() {
    let h = harness();
    h.store.fail_next_save();

    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    // In memory the ticket exists; disk never saw it.
    assert!(h.registry.get(channel).await.is_some());
    assert!(h.store.saved().is_empty());
}

#[tokio::test]
async fn failed_channel_allocation_leaves_no_state_behind() {
    let h = harness();
    h.gateway.fail_creates();

    let err = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Gateway(_)));
    assert!(h.registry.snapshot().await.is_empty());
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn failed_permission_edit_leaves_the_record_unchanged() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();
    h.service
        .request_close(&requester_actor(), channel)
        .await
        .unwrap();

    h.gateway.fail_permission_edits();
    let err = h
        .service
        .confirm_close(&staff_actor(), channel)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Gateway(_)));
    assert!(!record(&h, channel).await.closed);
}

#[tokio::test]
async fn attach_registers_an_existing_channel_once() {
    let h = harness();
    let channel = ChannelId::from_raw(900_000_000_000_000_777);
    h.gateway.seed_channel(channel);

    let err = h
        .service
        .attach(&outsider_actor(), channel, TicketCategory::Hr, requester())
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { .. }));

    h.service
        .attach(&admin_actor(), channel, TicketCategory::Hr, requester())
        .await
        .unwrap();
    let ticket = record(&h, channel).await;
    assert!(ticket.manually_registered);
    assert_eq!(ticket.category, TicketCategory::Hr);

    let err = h
        .service
        .attach(&admin_actor(), channel, TicketCategory::Hr, requester())
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::AlreadyRegistered(c) if c == channel));
}

#[tokio::test]
async fn diagnose_reports_channel_status_and_store_statistics() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();
    h.service
        .create(requester(), TicketCategory::Booking, None, None)
        .await
        .unwrap();

    let err = h
        .service
        .diagnose(&outsider_actor(), channel)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Unauthorized { .. }));

    let report = h.service.diagnose(&admin_actor(), channel).await.unwrap();
    assert!(report.contains("Support ticket"));
    assert!(report.contains("2 tickets (2 open, 0 closed)"));
    assert!(report.contains("Booking: 1"));
}

#[tokio::test]
async fn reconcile_evicts_tickets_whose_channels_are_gone() {
    let h = harness();
    let live = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    // A record left over from an out-of-band channel deletion.
    let dead = ChannelId::from_raw(900_000_000_000_000_555);
    h.registry
        .insert(TicketRecord::open(
            dead,
            requester(),
            TicketCategory::Booking,
            test_clock().now(),
            None,
        ))
        .await
        .unwrap();

    h.service.reconcile().await;
    assert!(h.registry.get(live).await.is_some());
    assert!(h.registry.get(dead).await.is_none());
    assert!(!h.store.saved().contains_key(&dead));
}

#[tokio::test]
async fn transcript_request_needs_a_ticket_but_not_staff() {
    let h = harness();
    let channel = h
        .service
        .create(requester(), TicketCategory::Support, None, None)
        .await
        .unwrap();

    let transcript = h.service.transcript(channel).await.unwrap();
    assert!(transcript.location.contains(&channel.to_string()));

    let missing = ChannelId::from_raw(900_000_000_000_000_999);
    let err = h.service.transcript(missing).await.unwrap_err();
    assert!(matches!(err, TicketError::NotATicket(_)));
}
