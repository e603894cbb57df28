//! Initial catalog contents.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use bistro_core::{CategoryId, MenuItemId};

use crate::category::MenuCategory;
use crate::item::{MenuItem, NutritionInfo, Price};

/// Categories and items a catalog store starts from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub categories: Vec<MenuCategory>,
    pub items: Vec<MenuItem>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Five categories with one dish each.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let category = |id: u64, name: &str, description: &str| MenuCategory {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: description.to_string(),
            display_order: id as u32,
            is_active: true,
        };

        let categories = vec![
            category(1, "Appetizers", "Start your meal right"),
            category(2, "Main Courses", "Hearty and satisfying dishes"),
            category(3, "Desserts", "Sweet endings"),
            category(4, "Beverages", "Refreshing drinks"),
            category(5, "Salads", "Fresh and healthy options"),
        ];

        let dish = |spec: Dish<'_>| MenuItem {
            id: MenuItemId::new(spec.id),
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            price: Price::from_cents(spec.cents),
            category: categories[spec.category].clone(),
            image: None,
            is_available: true,
            preparation_time: spec.minutes,
            ingredients: spec.ingredients.iter().map(|s| s.to_string()).collect(),
            allergens: spec.allergens.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            nutritional_info: Some(spec.nutrition),
            created_at: now,
            updated_at: now,
        };

        let items = vec![
            dish(Dish {
                id: 1,
                name: "Caesar Salad",
                description: "Fresh romaine lettuce with parmesan cheese, croutons, and our signature caesar dressing",
                cents: 1299,
                category: 0,
                minutes: 10,
                ingredients: &["Romaine lettuce", "Parmesan cheese", "Croutons", "Caesar dressing"],
                allergens: &["Dairy", "Gluten"],
                nutrition: nutrition(250, 8.0, 15.0, 18.0, 4.0),
            }),
            dish(Dish {
                id: 2,
                name: "Grilled Salmon",
                description: "Atlantic salmon grilled to perfection, served with seasonal vegetables and rice",
                cents: 2499,
                category: 1,
                minutes: 20,
                ingredients: &["Atlantic salmon", "Seasonal vegetables", "Jasmine rice", "Lemon"],
                allergens: &["Fish"],
                nutrition: nutrition(420, 35.0, 25.0, 22.0, 3.0),
            }),
            dish(Dish {
                id: 3,
                name: "Chocolate Lava Cake",
                description: "Warm chocolate cake with molten center, served with vanilla ice cream",
                cents: 899,
                category: 2,
                minutes: 15,
                ingredients: &["Dark chocolate", "Flour", "Butter", "Eggs", "Vanilla ice cream"],
                allergens: &["Dairy", "Gluten", "Eggs"],
                nutrition: nutrition(380, 6.0, 45.0, 18.0, 2.0),
            }),
            dish(Dish {
                id: 4,
                name: "Fresh Orange Juice",
                description: "Freshly squeezed orange juice, no pulp",
                cents: 499,
                category: 3,
                minutes: 3,
                ingredients: &["Fresh oranges"],
                allergens: &[],
                nutrition: nutrition(110, 2.0, 26.0, 0.0, 0.0),
            }),
            dish(Dish {
                id: 5,
                name: "Greek Salad",
                description: "Tomatoes, cucumber, olives, red onion, and feta cheese with olive oil dressing",
                cents: 1499,
                category: 4,
                minutes: 8,
                ingredients: &["Tomatoes", "Cucumber", "Olives", "Red onion", "Feta cheese", "Olive oil"],
                allergens: &["Dairy"],
                nutrition: nutrition(180, 6.0, 12.0, 14.0, 5.0),
            }),
        ];

        Self { categories, items }
    }
}

struct Dish<'a> {
    id: u64,
    name: &'a str,
    description: &'a str,
    cents: u64,
    /// Index into the demo categories.
    category: usize,
    minutes: u32,
    ingredients: &'a [&'a str],
    allergens: &'a [&'a str],
    nutrition: NutritionInfo,
}

fn nutrition(calories: u32, protein: f64, carbs: f64, fat: f64, fiber: f64) -> NutritionInfo {
    NutritionInfo {
        calories,
        protein,
        carbs,
        fat,
        fiber,
    }
}
