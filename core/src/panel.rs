//! Request panel collaborator trait.
//!
//! One panel module exists per ticket category. A panel owns the request
//! form for its category: it constructs the modal shown to the requester,
//! extracts the submitted fields into opaque [`FormData`], and formats a
//! response summary for the fresh ticket channel. The engine calls these
//! without interpreting the internal field layout; the extractor is where
//! the collaborator contract (which fields must exist) is validated.

use crate::types::{FormData, TicketCategory};
use std::collections::HashMap;
use thiserror::Error;

/// Error returned when a submission does not satisfy the panel's contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// A required field was absent or empty.
    #[error("required field {0:?} is missing")]
    MissingField(String),
}

/// One text input on a request modal.
#[derive(Debug, Clone)]
pub struct ModalField {
    /// Field identifier, returned as the key in the submission map.
    pub id: String,
    /// Human-facing label.
    pub label: String,
    /// Whether the platform should enforce a value.
    pub required: bool,
    /// Whether the field accepts multi-line input.
    pub multiline: bool,
}

/// A modal form specification handed to the gateway for display.
#[derive(Debug, Clone)]
pub struct ModalSpec {
    /// Identifier delivered back in the modal-submission event.
    pub custom_id: String,
    /// Modal title.
    pub title: String,
    /// Input fields, in display order.
    pub fields: Vec<ModalField>,
}

/// Per-category request form collaborator.
pub trait RequestPanel: Send + Sync {
    /// The category this panel serves.
    fn category(&self) -> TicketCategory;

    /// Build the modal shown when a requester opens this category.
    fn modal(&self) -> ModalSpec;

    /// Extract submitted fields into opaque form data.
    ///
    /// # Errors
    ///
    /// Returns a [`PanelError`] when the submission violates the panel's
    /// field contract.
    fn extract(&self, submitted: &HashMap<String, String>) -> Result<FormData, PanelError>;

    /// Format a response summary for the fresh ticket channel.
    ///
    /// Implementations must degrade gracefully when a field is absent from
    /// `data` rather than assume it exists.
    fn summary(&self, data: &FormData) -> String;
}
