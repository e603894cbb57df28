//! Identity records and the registry the session store authenticates against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

/// The authenticated user record.
///
/// Serialized in camelCase; this is also the `current_user` payload in the
/// key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Identity {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Login form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

/// Password every registry account accepts.
pub const DEMO_PASSWORD: &str = "password123";

/// Known identities. Lookup is by exact email match.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    identities: Vec<Identity>,
}

impl IdentityRegistry {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// Admin, manager and waiter demo accounts.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let person = |id: u64, first: &str, last: &str, email: &str, phone: &str, role: Role| Identity {
            id: UserId::new(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        Self::new(vec![
            person(1, "Admin", "User", "admin@restaurant.com", "+1234567890", Role::Admin),
            person(2, "Manager", "Smith", "manager@restaurant.com", "+1234567891", Role::Manager),
            person(3, "John", "Waiter", "waiter@restaurant.com", "+1234567892", Role::Waiter),
        ])
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.email == email)
    }

    /// Check `credentials` and return the matching identity.
    pub fn authenticate(&self, credentials: &Credentials) -> DomainResult<Identity> {
        let identity = self
            .find_by_email(&credentials.email)
            .ok_or_else(|| DomainError::not_found(format!("user '{}'", credentials.email)))?;

        if credentials.password != DEMO_PASSWORD {
            return Err(DomainError::InvalidCredentials);
        }

        Ok(identity.clone())
    }

    /// Build the identity `registration` would create, without storing it.
    pub fn prepare(&self, registration: &Registration, now: DateTime<Utc>) -> DomainResult<Identity> {
        if self.find_by_email(&registration.email).is_some() {
            return Err(DomainError::already_exists(format!(
                "user with email '{}'",
                registration.email
            )));
        }

        Ok(Identity {
            id: UserId::next_after(self.identities.iter().map(|i| &i.id)),
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            role: registration.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn insert(&mut self, identity: Identity) {
        self.identities.push(identity);
    }
}
