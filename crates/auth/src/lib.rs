//! `bistro-auth` — who is signed in, and what they may see.
//!
//! - [`session`]: login / register / logout and session persistence
//! - [`authorize`]: the pure role check every guard delegates to
//! - [`navigation`]: route guarding and sidebar filtering
//!
//! Nothing here knows about HTTP or a real identity provider; identities
//! come from an in-memory [`IdentityRegistry`].

pub mod authorize;
pub mod identity;
pub mod navigation;
pub mod roles;
pub mod session;

pub use authorize::{AccessExplanation, DenialKind, can_access, explain_access};
pub use identity::{Credentials, DEMO_PASSWORD, Identity, IdentityRegistry, Registration};
pub use navigation::{
    FALLBACK_ROUTE, GuardOutcome, LOGIN_ROUTE, NavEntry, Route, role_guard, visible_entries,
};
pub use roles::Role;
pub use session::{AuthSession, DEFAULT_AUTH_LATENCY, SessionStore, SessionToken};
