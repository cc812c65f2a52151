//! Authorization policy.
//!
//! A fixed, data-driven mapping from ticket category to the staff role set
//! entitled to see and act on that category's tickets. The mapping is
//! loaded from configuration once at startup; malformed role identifiers
//! are filtered out (and logged) rather than carried along, and duplicates
//! collapse.

use crate::types::{Actor, RoleId, TicketCategory};
use std::collections::HashMap;
use tracing::warn;

/// Resolves which staff roles may act on each ticket category.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    roles: HashMap<TicketCategory, Vec<RoleId>>,
}

impl AccessPolicy {
    /// Build a policy from raw configuration entries.
    ///
    /// Each entry pairs a category with the raw role identifiers configured
    /// for it. Identifiers that fail snowflake shape validation are dropped
    /// with a warning; surviving identifiers are deduplicated.
    #[must_use]
    pub fn from_raw<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (TicketCategory, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut roles: HashMap<TicketCategory, Vec<RoleId>> = HashMap::new();
        for (category, raw_roles) in entries {
            let slot = roles.entry(category).or_default();
            for raw in raw_roles {
                match raw.as_ref().parse::<RoleId>() {
                    Ok(role) => {
                        if !slot.contains(&role) {
                            slot.push(role);
                        }
                    }
                    Err(err) => {
                        warn!(category = %category, %err, "dropping malformed staff role id");
                    }
                }
            }
        }
        Self { roles }
    }

    /// The staff role set entitled to manage `category` tickets.
    ///
    /// Categories with no configured roles resolve to the empty set, which
    /// leaves only administrators able to manage them.
    #[must_use]
    pub fn roles_for(&self, category: TicketCategory) -> &[RoleId] {
        self.roles.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Whether the actor may manage tickets of `category`.
    ///
    /// True when the actor carries administrative privilege, or holds any
    /// role in the category's staff role set. The category always comes
    /// from the ticket record under consideration, never from the actor.
    #[must_use]
    pub fn is_staff(&self, actor: &Actor, category: TicketCategory) -> bool {
        actor.admin
            || self
                .roles_for(category)
                .iter()
                .any(|role| actor.roles.contains(role))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::UserId;

    const STAFF_ROLE: &str = "100000000000000001";
    const OTHER_ROLE: &str = "100000000000000002";

    fn policy() -> AccessPolicy {
        AccessPolicy::from_raw([
            (
                TicketCategory::Support,
                vec![STAFF_ROLE, STAFF_ROLE, "garbage", "123"],
            ),
            (TicketCategory::Hr, vec![OTHER_ROLE]),
        ])
    }

    #[test]
    fn malformed_roles_are_filtered_and_duplicates_collapse() {
        let policy = policy();
        assert_eq!(
            policy.roles_for(TicketCategory::Support),
            &[STAFF_ROLE.parse().unwrap()]
        );
    }

    #[test]
    fn unconfigured_categories_resolve_to_the_empty_set() {
        assert!(policy().roles_for(TicketCategory::Booking).is_empty());
    }

    #[test]
    fn staff_role_grants_access_to_its_category_only() {
        let policy = policy();
        let actor = Actor::new(UserId::from_raw(500_000_000_000_000_001))
            .with_roles(vec![STAFF_ROLE.parse().unwrap()]);
        assert!(policy.is_staff(&actor, TicketCategory::Support));
        assert!(!policy.is_staff(&actor, TicketCategory::Hr));
    }

    #[test]
    fn admin_privilege_overrides_role_membership() {
        let policy = policy();
        let actor = Actor::new(UserId::from_raw(500_000_000_000_000_002)).as_admin();
        for category in TicketCategory::ALL {
            assert!(policy.is_staff(&actor, category));
        }
    }

    #[test]
    fn roleless_actor_is_not_staff() {
        let policy = policy();
        let actor = Actor::new(UserId::from_raw(500_000_000_000_000_003));
        assert!(!policy.is_staff(&actor, TicketCategory::Support));
    }
}
