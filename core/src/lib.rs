//! # Helpdesk Core
//!
//! Domain types, lifecycle rules, and collaborator traits for the helpdesk
//! ticket engine.
//!
//! A ticket is a support-request workflow instance bound 1:1 to a hosting
//! channel on a chat platform. This crate holds everything about tickets
//! that is independent of any runtime: the record and identifier types, the
//! closed category enumeration, the lifecycle transition table, the
//! authorization policy, the quota guard, the error taxonomy, and the trait
//! seams behind which the chat platform, the per-category form panels, the
//! transcript generator, and the durable store live.
//!
//! # Architecture
//!
//! ```text
//!              ┌─────────────────────────────────────────┐
//!              │            Interaction Router           │   (runtime)
//!              └───────────────────┬─────────────────────┘
//!                                  │ resolve → authorize → transition
//!                                  ▼
//!  ┌──────────────┐   ┌─────────────────────┐   ┌───────────────────┐
//!  │ AccessPolicy │   │  Lifecycle machine  │   │    QuotaGuard     │
//!  │   (policy)   │   │     (lifecycle)     │   │      (quota)      │
//!  └──────────────┘   └──────────┬──────────┘   └───────────────────┘
//!                                │ mutations
//!                                ▼
//!              ┌─────────────────────────────────────────┐
//!              │   TicketRegistry → TicketStore trait    │
//!              └─────────────────────────────────────────┘
//! ```
//!
//! Side-effect execution (channel allocation, permission edits, notices,
//! deferred channel deletion) lives in the runtime crate; deterministic
//! fakes for every trait live in the testing crate.

pub mod environment;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod panel;
pub mod policy;
pub mod quota;
pub mod store;
pub mod transcript;
pub mod types;

pub use error::TicketError;
pub use policy::AccessPolicy;
pub use quota::{QuotaConfig, QuotaDenied, QuotaGuard};
pub use store::{StoreError, TicketMap, TicketStore};
pub use types::{Actor, ChannelId, FormData, RoleId, TicketCategory, TicketRecord, UserId};
