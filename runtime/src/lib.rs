//! # Helpdesk Runtime
//!
//! Imperative shell of the helpdesk ticket engine: the durable JSON-file
//! store with its single-writer queue, the in-memory registry, the
//! lifecycle service that executes transitions with their side effects,
//! and the interaction router that maps platform events onto them.
//!
//! # Architecture
//!
//! ```text
//!   platform events
//!         │
//!         ▼
//!  ┌──────────────┐   resolve record, authorize   ┌────────────────┐
//!  │    Router    │ ────────────────────────────▶ │ TicketService  │
//!  └──────────────┘                               └───────┬────────┘
//!    one task per event,                                  │
//!    faults isolated                   gateway calls ◀────┤
//!                                                         ▼
//!                                              ┌──────────────────┐
//!                                              │  TicketRegistry  │
//!                                              │  (lazy cache)    │
//!                                              └────────┬─────────┘
//!                                                       ▼
//!                                              ┌──────────────────┐
//!                                              │   JsonFileStore  │
//!                                              │  (single writer) │
//!                                              └──────────────────┘
//! ```
//!
//! Handlers may suspend at I/O boundaries, so two events touching the same
//! ticket can interleave their I/O; the store's writer queue is the only
//! mechanism preventing a lost update to the durable document. Registry
//! mutations themselves are not transactionally isolated; compound
//! read-modify-write sequences are best-effort under low request volume.

pub mod config;
pub mod registry;
pub mod router;
pub mod service;
pub mod store;

pub use config::Config;
pub use registry::TicketRegistry;
pub use router::{Interaction, Reply, Router};
pub use service::TicketService;
pub use store::JsonFileStore;
