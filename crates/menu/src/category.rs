use serde::{Deserialize, Serialize};

use bistro_core::{CategoryId, DomainError, DomainResult, Entity, ValueObject};

/// Menu section ("Appetizers", "Desserts", ...).
///
/// Lives in the catalog's category collection and is also copied by value
/// into every item that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub display_order: u32,
    pub is_active: bool,
}

impl Entity for MenuCategory {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl ValueObject for MenuCategory {}

/// Input for `create_category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_order: u32,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl NewCategory {
    /// Active category with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            display_order: 0,
            is_active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_display_order(mut self, display_order: u32) -> Self {
        self.display_order = display_order;
        self
    }

    pub(crate) fn into_category(self, id: CategoryId) -> DomainResult<MenuCategory> {
        let category = MenuCategory {
            id,
            name: self.name,
            description: self.description,
            display_order: self.display_order,
            is_active: self.is_active,
        };
        validate(&category)?;
        Ok(category)
    }
}

/// Partial update for `update_category`; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub display_order: Option<u32>,
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub(crate) fn applied_to(&self, current: &MenuCategory) -> DomainResult<MenuCategory> {
        let mut next = current.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(order) = self.display_order {
            next.display_order = order;
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        validate(&next)?;
        Ok(next)
    }
}

fn validate(category: &MenuCategory) -> DomainResult<()> {
    if category.name.trim().is_empty() {
        return Err(DomainError::validation("category name must not be empty"));
    }
    Ok(())
}
