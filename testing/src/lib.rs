//! # Helpdesk Testing
//!
//! Deterministic fakes for the helpdesk collaborator traits: clocks, the
//! chat gateway, the durable store, the transcript generator, and a stub
//! request panel. Every fake records the calls it receives and supports
//! failure injection, so degraded-mode behavior is as testable as the
//! happy path.

pub mod clocks;
pub mod gateway;
pub mod panels;
pub mod store;
pub mod transcripts;

pub use clocks::{FixedClock, SteppingClock, test_clock};
pub use gateway::{GatewayCall, MockGateway};
pub use panels::StubPanel;
pub use store::MemoryStore;
pub use transcripts::RecordingTranscripts;
