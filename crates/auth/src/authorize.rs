use serde::Serialize;

use crate::{Identity, Role};

/// Decide whether `identity` may see/enter something guarded by `required`.
///
/// - Empty `required`: open access, granted even when signed out
/// - Signed out with a non-empty `required`: denied
/// - Otherwise: granted iff the identity's role is listed
///
/// No IO, no side effects, no redirects. Navigation guards and visibility
/// checks both call this and decide themselves what a `false` means.
pub fn can_access(identity: Option<&Identity>, required: &[Role]) -> bool {
    if required.is_empty() {
        return true;
    }
    identity.is_some_and(|i| required.contains(&i.role))
}

// ─────────────────────────────────────────────────────────────────────────────
// Access Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why an access decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub granted: bool,
    pub reason: String,
    /// Role of the identity checked, if anyone was signed in.
    pub role: Option<Role>,
    pub required_roles: Vec<Role>,
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NotSignedIn,
    RoleNotPermitted,
}

/// Same decision as [`can_access`], with a human-readable account of it.
pub fn explain_access(identity: Option<&Identity>, required: &[Role]) -> AccessExplanation {
    let role = identity.map(|i| i.role);
    let required_roles = required.to_vec();

    if required.is_empty() {
        return AccessExplanation {
            granted: true,
            reason: "no roles required (open access)".to_string(),
            role,
            required_roles,
            denial: None,
        };
    }

    let listed = required
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    match identity {
        None => AccessExplanation {
            granted: false,
            reason: format!("not signed in; requires one of: {listed}"),
            role,
            required_roles,
            denial: Some(DenialKind::NotSignedIn),
        },
        Some(i) if required.contains(&i.role) => AccessExplanation {
            granted: true,
            reason: format!("role '{}' is one of: {listed}", i.role),
            role,
            required_roles,
            denial: None,
        },
        Some(i) => AccessExplanation {
            granted: false,
            reason: format!("role '{}' is not one of: {listed}", i.role),
            role,
            required_roles,
            denial: Some(DenialKind::RoleNotPermitted),
        },
    }
}
