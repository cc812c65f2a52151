//! Configuration management for the helpdesk engine.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Quota caps, staff role lists, the store path, and the deletion grace
//! delay are all configuration, not code.

use helpdesk_core::policy::AccessPolicy;
use helpdesk_core::quota::QuotaConfig;
use helpdesk_core::types::TicketCategory;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Durable store configuration.
    pub storage: StorageConfig,
    /// Open-ticket caps.
    pub quota: QuotaSettings,
    /// Lifecycle timing.
    pub lifecycle: LifecycleConfig,
    /// Per-category staff role lists.
    pub staff: StaffConfig,
}

/// Durable store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON ticket document.
    pub path: String,
}

/// Open-ticket caps, as raw configuration values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaSettings {
    /// Maximum open tickets per user across all categories.
    pub max_open_total: usize,
    /// Maximum open tickets per user within one category.
    pub max_open_per_category: usize,
}

/// Lifecycle timing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Seconds between ticket deletion and channel removal.
    pub delete_grace_secs: u64,
}

impl LifecycleConfig {
    /// The deletion grace delay as a [`Duration`].
    #[must_use]
    pub const fn delete_grace(&self) -> Duration {
        Duration::from_secs(self.delete_grace_secs)
    }
}

/// Raw per-category staff role lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffConfig {
    /// `(category, raw role ids)` pairs as configured.
    pub roles: Vec<(TicketCategory, Vec<String>)>,
}

impl StaffConfig {
    /// Build the authorization policy (deduplicated, malformed ids
    /// filtered) from the raw lists.
    #[must_use]
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::from_raw(self.roles.clone())
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Staff role lists come from one variable per category,
    /// `TICKET_STAFF_ROLES_<CATEGORY>` (e.g. `TICKET_STAFF_ROLES_SUPPORT`),
    /// holding comma-separated role ids.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let staff_roles = TicketCategory::ALL
            .iter()
            .map(|category| {
                let key = format!("TICKET_STAFF_ROLES_{}", category.id().to_uppercase());
                let roles = lookup(&key)
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|entry| !entry.is_empty())
                            .map(ToOwned::to_owned)
                            .collect()
                    })
                    .unwrap_or_default();
                (*category, roles)
            })
            .collect();

        Self {
            storage: StorageConfig {
                path: lookup("TICKET_STORE_PATH")
                    .unwrap_or_else(|| "data/tickets.json".to_owned()),
            },
            quota: QuotaSettings {
                max_open_total: lookup("TICKET_MAX_OPEN_TOTAL")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                max_open_per_category: lookup("TICKET_MAX_OPEN_PER_CATEGORY")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            },
            lifecycle: LifecycleConfig {
                delete_grace_secs: lookup("TICKET_DELETE_GRACE_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
            staff: StaffConfig { roles: staff_roles },
        }
    }
}

impl From<QuotaSettings> for QuotaConfig {
    fn from(settings: QuotaSettings) -> Self {
        Self {
            max_open_total: settings.max_open_total,
            max_open_per_category: settings.max_open_per_category,
        }
    }
}
