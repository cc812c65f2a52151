//! Open-ticket quota guard.
//!
//! Two independent caps are evaluated at creation time only, against the
//! open (non-closed) subset of the requester's tickets in the live
//! registry: a total cap across all categories and a per-category cap.
//! Both are configuration, not code.

use crate::types::{TicketCategory, TicketRecord, UserId};
use thiserror::Error;

/// Creation denied because a cap was hit. The message names the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuotaDenied {
    /// The cap across all categories was hit.
    #[error("you already have {open} open tickets (limit {limit})")]
    Total {
        /// Open tickets the requester currently has.
        open: usize,
        /// Configured total cap.
        limit: usize,
    },

    /// The per-category cap was hit.
    #[error("you already have {open} open {category} tickets (limit {limit})")]
    PerCategory {
        /// Category the requester tried to open.
        category: TicketCategory,
        /// Open tickets of that category the requester currently has.
        open: usize,
        /// Configured per-category cap.
        limit: usize,
    },
}

/// Open-ticket caps, loaded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct QuotaConfig {
    /// Maximum open tickets per user across all categories.
    pub max_open_total: usize,
    /// Maximum open tickets per user within one category.
    pub max_open_per_category: usize,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_open_total: 10,
            max_open_per_category: 3,
        }
    }
}

/// Enforces the per-user open-ticket caps.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaGuard {
    config: QuotaConfig,
}

impl QuotaGuard {
    /// Create a guard with the given caps.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }

    /// Check whether `user` may open another `category` ticket.
    ///
    /// `records` is the live registry contents; only the requester's open
    /// tickets count against the caps.
    ///
    /// # Errors
    ///
    /// Returns a [`QuotaDenied`] naming the cap that was hit.
    pub fn check<'a>(
        &self,
        user: UserId,
        category: TicketCategory,
        records: impl IntoIterator<Item = &'a TicketRecord>,
    ) -> Result<(), QuotaDenied> {
        let mut open_total = 0usize;
        let mut open_in_category = 0usize;
        for record in records {
            if record.user_id != user || !record.is_open() {
                continue;
            }
            open_total += 1;
            if record.category == category {
                open_in_category += 1;
            }
        }

        if open_total >= self.config.max_open_total {
            return Err(QuotaDenied::Total {
                open: open_total,
                limit: self.config.max_open_total,
            });
        }
        if open_in_category >= self.config.max_open_per_category {
            return Err(QuotaDenied::PerCategory {
                category,
                open: open_in_category,
                limit: self.config.max_open_per_category,
            });
        }
        Ok(())
    }
}
