//! Stub request panel.

use helpdesk_core::panel::{ModalField, ModalSpec, PanelError, RequestPanel};
use helpdesk_core::types::{FormData, TicketCategory};
use std::collections::HashMap;

/// Minimal panel with a required `subject` field and an optional
/// `details` field, usable for any category.
pub struct StubPanel {
    category: TicketCategory,
}

impl StubPanel {
    /// A stub panel serving `category`.
    #[must_use]
    pub const fn new(category: TicketCategory) -> Self {
        Self { category }
    }
}

impl RequestPanel for StubPanel {
    fn category(&self) -> TicketCategory {
        self.category
    }

    fn modal(&self) -> ModalSpec {
        ModalSpec {
            custom_id: format!("ticket:form:{}", self.category),
            title: format!("New {} request", self.category.label()),
            fields: vec![
                ModalField {
                    id: "subject".to_owned(),
                    label: "Subject".to_owned(),
                    required: true,
                    multiline: false,
                },
                ModalField {
                    id: "details".to_owned(),
                    label: "Details".to_owned(),
                    required: false,
                    multiline: true,
                },
            ],
        }
    }

    fn extract(&self, submitted: &HashMap<String, String>) -> Result<FormData, PanelError> {
        let subject = submitted
            .get("subject")
            .map(String::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PanelError::MissingField("subject".to_owned()))?;

        let mut form = FormData::new();
        form.insert("subject".to_owned(), subject.into());
        if let Some(details) = submitted.get("details").filter(|d| !d.trim().is_empty()) {
            form.insert("details".to_owned(), details.trim().into());
        }
        Ok(form)
    }

    fn summary(&self, data: &FormData) -> String {
        let subject = data
            .get("subject")
            .and_then(|v| v.as_str())
            .unwrap_or("(no subject provided)");
        format!("**Subject:** {subject}")
    }
}
