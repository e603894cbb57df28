//! Client-side filter/sort pipeline over the catalog's items.
//!
//! [`apply`] is pure: it reads a slice and returns a new vector. Steps run in
//! a fixed order (search, category, status, sort) and each filter step is
//! skipped when its criterion is at its "all"/empty setting.

use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bistro_core::{CategoryId, DomainError};

use crate::item::MenuItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(CategoryId),
}

impl FromStr for CategoryFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl core::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Price,
    Category,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

macro_rules! impl_wire_enum {
    ($t:ty, $what:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $t {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(DomainError::validation(format!(
                        concat!("unknown ", $what, " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

impl_wire_enum!(StatusFilter, "status filter", {
    All => "all",
    Available => "available",
    Unavailable => "unavailable",
});
impl_wire_enum!(SortKey, "sort key", {
    Name => "name",
    Price => "price",
    Category => "category",
    Created => "created",
});
impl_wire_enum!(SortDirection, "sort direction", {
    Asc => "asc",
    Desc => "desc",
});

/// What the menu list is currently showing. `Default` is the cleared state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search_term: String,
    pub category: CategoryFilter,
    pub status: StatusFilter,
    pub sort_by: SortKey,
    pub direction: SortDirection,
}

impl FilterCriteria {
    /// Pick a sort column: the same key again flips the direction, a new
    /// key starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_by == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_by = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no filter step would drop anything.
    pub fn is_unfiltered(&self) -> bool {
        self.search_term.is_empty()
            && self.category == CategoryFilter::All
            && self.status == StatusFilter::All
    }
}

/// Filter then sort `items` according to `criteria`.
///
/// The sort is stable: items that compare equal keep their relative input
/// order, in both directions.
pub fn apply(items: &[MenuItem], criteria: &FilterCriteria) -> Vec<MenuItem> {
    let mut out: Vec<MenuItem> = if criteria.is_unfiltered() {
        items.to_vec()
    } else {
        let needle = criteria.search_term.to_lowercase();
        items
            .iter()
            .filter(|item| needle.is_empty() || item.matches_lowercase(&needle))
            .filter(|item| match criteria.category {
                CategoryFilter::All => true,
                CategoryFilter::Only(id) => item.category.id == id,
            })
            .filter(|item| match criteria.status {
                StatusFilter::All => true,
                StatusFilter::Available => item.is_available,
                StatusFilter::Unavailable => !item.is_available,
            })
            .cloned()
            .collect()
    };

    let key = criteria.sort_by;
    match criteria.direction {
        SortDirection::Asc => out.sort_by(|a, b| compare(key, a, b)),
        SortDirection::Desc => out.sort_by(|a, b| compare(key, a, b).reverse()),
    }
    out
}

fn compare(key: SortKey, a: &MenuItem, b: &MenuItem) -> Ordering {
    match key {
        SortKey::Name => locale_compare(&a.name, &b.name),
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Category => locale_compare(&a.category.name, &b.category.name),
        SortKey::Created => a.created_at.cmp(&b.created_at),
    }
}

/// Case-insensitive first; on a case-only difference lowercase sorts first.
fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
