//! Strongly-typed sequential identifiers used across the console.
//!
//! Ids are small positive integers handed out by the owning store. On the
//! wire (and in the key-value store) they are rendered as decimal strings,
//! e.g. `"3"`.

use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Identifier of an identity (user account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(u64);

/// Identifier of a menu category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryId(u64);

/// Identifier of a menu item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MenuItemId(u64);

/// Next id in a sequence: one past the largest id already allocated.
///
/// With no deletions this is `count + 1`; after deletions it still never
/// reuses an id that is live in the collection.
pub fn next_sequential<I>(existing: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    existing.into_iter().max().unwrap_or(0) + 1
}

struct IdVisitor(&'static str);

impl Visitor<'_> for IdVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "a {} as a decimal string or integer", self.0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        v.parse::<u64>()
            .map_err(|e| E::custom(format!("{}: {}", self.0, e)))
    }
}

macro_rules! impl_sequential_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// The id following the largest one in `existing`.
            pub fn next_after<'a, I>(existing: I) -> Self
            where
                I: IntoIterator<Item = &'a $t>,
            {
                Self(next_sequential(existing.into_iter().map(|id| id.0)))
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(IdVisitor($name)).map(Self)
            }
        }
    };
}

impl_sequential_newtype!(UserId, "UserId");
impl_sequential_newtype!(CategoryId, "CategoryId");
impl_sequential_newtype!(MenuItemId, "MenuItemId");
