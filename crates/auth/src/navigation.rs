//! Route guarding and role-filtered navigation.
//!
//! Both sides delegate the actual decision to [`can_access`]; this module
//! only maps "denied" onto a redirect or onto "hidden".

use serde::Serialize;
use tracing::debug;

use crate::{Identity, Role, can_access};

/// Where a signed-in identity lands when a route refuses it.
pub const FALLBACK_ROUTE: &str = "/dashboard";

/// Where unauthenticated navigation is sent.
pub const LOGIN_ROUTE: &str = "/auth/login";

/// A navigable destination and the roles allowed to enter it.
///
/// `required_roles: None` and `Some(vec![])` both mean open access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path: String,
    pub required_roles: Option<Vec<Role>>,
}

impl Route {
    pub fn open(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required_roles: None,
        }
    }

    pub fn restricted(path: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            path: path.into(),
            required_roles: Some(roles.to_vec()),
        }
    }

    pub fn required(&self) -> &[Role] {
        self.required_roles.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(String),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Role check for entering `route`. A refusal redirects to [`FALLBACK_ROUTE`].
pub fn role_guard(identity: Option<&Identity>, route: &Route) -> GuardOutcome {
    if can_access(identity, route.required()) {
        return GuardOutcome::Allow;
    }
    debug!(
        path = %route.path,
        role = ?identity.map(|i| i.role),
        "route refused; redirecting to fallback"
    );
    GuardOutcome::Redirect(FALLBACK_ROUTE.to_string())
}

/// Sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavEntry {
    pub label: String,
    pub icon: String,
    pub route: String,
    pub roles: Vec<Role>,
}

impl NavEntry {
    pub fn new(label: &str, icon: &str, route: &str, roles: &[Role]) -> Self {
        Self {
            label: label.to_string(),
            icon: icon.to_string(),
            route: route.to_string(),
            roles: roles.to_vec(),
        }
    }

    pub fn is_visible_to(&self, identity: Option<&Identity>) -> bool {
        can_access(identity, &self.roles)
    }
}

/// The entries `identity` may see, in their original order.
pub fn visible_entries<'a>(entries: &'a [NavEntry], identity: Option<&Identity>) -> Vec<&'a NavEntry> {
    entries
        .iter()
        .filter(|entry| entry.is_visible_to(identity))
        .collect()
}
