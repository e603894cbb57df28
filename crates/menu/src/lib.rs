//! `bistro-menu` — the menu catalog.
//!
//! - [`catalog`]: the Catalog Store (items, categories, live views)
//! - [`filter`]: the pure filter/sort pipeline behind the menu list
//! - [`seed`]: initial catalog contents

pub mod catalog;
pub mod category;
pub mod filter;
pub mod item;
pub mod seed;

pub use catalog::{CatalogLatency, CatalogStore};
pub use category::{CategoryPatch, MenuCategory, NewCategory};
pub use filter::{CategoryFilter, FilterCriteria, SortDirection, SortKey, StatusFilter, apply};
pub use item::{MenuItem, MenuItemPatch, NewMenuItem, NutritionInfo, Price};
pub use seed::Catalog;
