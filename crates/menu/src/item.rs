use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use bistro_core::{CategoryId, DomainError, DomainResult, Entity, MenuItemId, ValueObject};

use crate::category::MenuCategory;

/// Menu price in the smallest currency unit (cents).
///
/// On the wire a price is a decimal number (`12.99`); internally it is exact.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(u64);

impl Price {
    /// Lowest price a menu item may carry.
    pub const MIN: Price = Price(1);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Round a decimal amount to whole cents.
    pub fn from_decimal(amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::validation(format!("invalid price {amount}")));
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return Err(DomainError::validation(format!("price {amount} out of range")));
        }
        Ok(Self(cents as u64))
    }
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = DomainError;

    /// Parses `"12.99"`, `"12.9"`, `"12"` or `"$12.99"` without going through floats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation(format!("invalid price '{s}'"));
        let raw = s.trim().trim_start_matches('$');
        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Price::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

/// Per-serving nutrition facts. Calories are whole kcal, the rest grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl ValueObject for NutritionInfo {}

/// A dish on the menu.
///
/// `category` is a copy of the category as it was when the item was last
/// saved with a category; renaming the category later leaves it alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: MenuCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_available: bool,
    /// Minutes.
    pub preparation_time: u32,
    pub ingredients: Vec<String>,
    pub allergens: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<NutritionInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for MenuItem {
    type Id = MenuItemId;

    fn id(&self) -> MenuItemId {
        self.id
    }
}

impl MenuItem {
    /// Case-insensitive substring match on name, description or any ingredient.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .ingredients
                .iter()
                .any(|ingredient| ingredient.to_lowercase().contains(needle))
    }

    pub fn matches(&self, query: &str) -> bool {
        self.matches_lowercase(&query.to_lowercase())
    }

    fn validate(&mut self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item name must not be empty"));
        }
        if self.price < Price::MIN {
            return Err(DomainError::validation("price must be at least 0.01"));
        }
        if self.preparation_time < 1 {
            return Err(DomainError::validation(
                "preparation time must be at least 1 minute",
            ));
        }

        self.ingredients.retain(|i| !i.trim().is_empty());
        if self.ingredients.is_empty() {
            return Err(DomainError::validation(
                "an item needs at least one ingredient",
            ));
        }
        Ok(())
    }
}

/// Input for `create_item`. The category is referenced by id and resolved
/// to a snapshot by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category_id: CategoryId,
    #[serde(default)]
    pub image: Option<String>,
    pub is_available: bool,
    pub preparation_time: u32,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergens: BTreeSet<String>,
    #[serde(default)]
    pub nutritional_info: Option<NutritionInfo>,
}

impl NewMenuItem {
    pub(crate) fn into_item(
        self,
        id: MenuItemId,
        category: MenuCategory,
        now: DateTime<Utc>,
    ) -> DomainResult<MenuItem> {
        let mut item = MenuItem {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            category,
            image: self.image,
            is_available: self.is_available,
            preparation_time: self.preparation_time,
            ingredients: self.ingredients,
            allergens: self.allergens,
            nutritional_info: self.nutritional_info,
            created_at: now,
            updated_at: now,
        };
        item.validate()?;
        Ok(item)
    }
}

/// Partial update for `update_item`; `None` leaves a field as is.
///
/// The optional fields take a nested option: `Some(None)` (JSON `null`)
/// removes the value, an absent key leaves it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Re-snapshots the category when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergens: Option<BTreeSet<String>>,
    #[serde(
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub nutritional_info: Option<Option<NutritionInfo>>,
}

/// A key that is present deserializes to `Some`, even when its value is `null`.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MenuItemPatch {
    pub fn availability(available: bool) -> Self {
        Self {
            is_available: Some(available),
            ..Self::default()
        }
    }

    /// Merge onto `current`. `category` is the freshly resolved snapshot for
    /// `category_id`, if the patch names one.
    pub(crate) fn applied_to(
        &self,
        current: &MenuItem,
        category: Option<MenuCategory>,
        now: DateTime<Utc>,
    ) -> DomainResult<MenuItem> {
        let mut next = current.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if let Some(category) = category {
            next.category = category;
        }
        if let Some(image) = &self.image {
            next.image = image.clone();
        }
        if let Some(available) = self.is_available {
            next.is_available = available;
        }
        if let Some(minutes) = self.preparation_time {
            next.preparation_time = minutes;
        }
        if let Some(ingredients) = &self.ingredients {
            next.ingredients = ingredients.clone();
        }
        if let Some(allergens) = &self.allergens {
            next.allergens = allergens.clone();
        }
        if let Some(info) = self.nutritional_info {
            next.nutritional_info = info;
        }
        next.updated_at = now;
        next.validate()?;
        Ok(next)
    }
}
