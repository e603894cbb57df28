//! Catalog store: the menu's categories and items.
//!
//! Every operation completes through the injected scheduler after its
//! simulated latency and hands back a [`Pending`]. Writes are applied
//! atomically against the collection as it is *at completion time*, so a
//! write that started later but had a shorter delay can land first; writes
//! are never serialized behind each other.
//!
//! Item mutations, category mutations and `list_items` count towards the
//! in-flight flag.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use bistro_core::entity::position_of;
use bistro_core::{CategoryId, DomainError, DomainResult, MenuItemId};
use bistro_events::{InFlight, Observable, Pending, Projection, StoreContext, schedule};

use crate::category::{CategoryPatch, MenuCategory, NewCategory};
use crate::item::{MenuItem, MenuItemPatch, NewMenuItem};
use crate::seed::Catalog;

/// Simulated latency per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLatency {
    pub list_items: Duration,
    pub get_item: Duration,
    pub create_item: Duration,
    pub update_item: Duration,
    pub delete_item: Duration,
    pub list_categories: Duration,
    pub create_category: Duration,
    pub update_category: Duration,
}

impl Default for CatalogLatency {
    fn default() -> Self {
        Self {
            list_items: Duration::from_millis(800),
            get_item: Duration::from_millis(300),
            create_item: Duration::from_millis(1000),
            update_item: Duration::from_millis(1000),
            delete_item: Duration::from_millis(800),
            list_categories: Duration::from_millis(300),
            create_category: Duration::from_millis(500),
            update_category: Duration::from_millis(500),
        }
    }
}

impl CatalogLatency {
    pub const fn zero() -> Self {
        Self {
            list_items: Duration::ZERO,
            get_item: Duration::ZERO,
            create_item: Duration::ZERO,
            update_item: Duration::ZERO,
            delete_item: Duration::ZERO,
            list_categories: Duration::ZERO,
            create_category: Duration::ZERO,
            update_category: Duration::ZERO,
        }
    }
}

struct CatalogInner {
    ctx: StoreContext,
    latency: CatalogLatency,
    items: Observable<Vec<MenuItem>>,
    categories: Observable<Vec<MenuCategory>>,
    in_flight: InFlight,
}

/// Owns the menu collections. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<CatalogInner>,
}

impl core::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("items", &self.inner.items.read(Vec::len))
            .field("categories", &self.inner.categories.read(Vec::len))
            .field("in_flight", &self.inner.in_flight.outstanding())
            .finish()
    }
}

impl CatalogStore {
    pub fn new(ctx: StoreContext, latency: CatalogLatency, initial: Catalog) -> Self {
        info!(
            items = initial.items.len(),
            categories = initial.categories.len(),
            "catalog loaded"
        );
        Self {
            inner: Arc::new(CatalogInner {
                ctx,
                latency,
                items: Observable::new(initial.items),
                categories: Observable::new(initial.categories),
                in_flight: InFlight::new(),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Items
    // ---------------------------------------------------------------------

    pub fn list_items(&self) -> Pending<Vec<MenuItem>> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.list_items, move || {
            let _guard = guard;
            let items = inner.items.snapshot();
            debug!(count = items.len(), "items listed");
            Ok(items)
        })
    }

    pub fn get_item_by_id(&self, id: MenuItemId) -> Pending<MenuItem> {
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.get_item, move || {
            debug!(item_id = %id, "item requested");
            inner
                .items
                .read(|items| items.iter().find(|i| i.id == id).cloned())
                .ok_or_else(|| item_not_found(id))
        })
    }

    /// Create an item in the category named by `data.category_id` and put it
    /// at the front of the collection.
    pub fn create_item(&self, data: NewMenuItem) -> Pending<MenuItem> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.create_item, move || {
            let _guard = guard;
            let now = inner.ctx.clock.now();
            let item = inner.items.try_update(|items| {
                let category = inner.category_snapshot(data.category_id)?;
                let id = MenuItemId::next_after(items.iter().map(|i| &i.id));
                let item = data.into_item(id, category, now)?;

                let mut next = Vec::with_capacity(items.len() + 1);
                next.push(item.clone());
                next.extend(items.iter().cloned());
                Ok::<_, DomainError>((next, item))
            })?;
            info!(item_id = %item.id, name = %item.name, category = %item.category.name, "menu item created");
            Ok(item)
        })
    }

    pub fn update_item(&self, id: MenuItemId, patch: MenuItemPatch) -> Pending<MenuItem> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.update_item, move || {
            let _guard = guard;
            let item = inner.apply_patch(id, |_| Ok(patch))?;
            info!(item_id = %id, "menu item updated");
            Ok(item)
        })
    }

    pub fn delete_item(&self, id: MenuItemId) -> Pending<()> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.delete_item, move || {
            let _guard = guard;
            inner.items.try_update(|items| {
                let idx = position_of(items, id).ok_or_else(|| item_not_found(id))?;
                let mut next = items.clone();
                next.remove(idx);
                Ok::<_, DomainError>((next, ()))
            })?;
            info!(item_id = %id, "menu item deleted");
            Ok(())
        })
    }

    /// Flip `is_available`.
    ///
    /// An id that is unknown right now fails without waiting. The flip itself
    /// is computed from the item as it is when the update lands, so two
    /// toggles always cancel out.
    pub fn toggle_availability(&self, id: MenuItemId) -> Pending<MenuItem> {
        if !self.inner.items.read(|items| position_of(items, id).is_some()) {
            return Pending::ready(Err(item_not_found(id)));
        }

        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.update_item, move || {
            let _guard = guard;
            let item = inner.apply_patch(id, |current| {
                Ok(MenuItemPatch::availability(!current.is_available))
            })?;
            info!(item_id = %id, available = item.is_available, "availability toggled");
            Ok(item)
        })
    }

    // ---------------------------------------------------------------------
    // Categories
    // ---------------------------------------------------------------------

    pub fn list_categories(&self) -> Pending<Vec<MenuCategory>> {
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.list_categories, move || {
            let categories = inner.categories.snapshot();
            debug!(count = categories.len(), "categories listed");
            Ok(categories)
        })
    }

    /// Append a new category.
    pub fn create_category(&self, data: NewCategory) -> Pending<MenuCategory> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.create_category, move || {
            let _guard = guard;
            let category = inner.categories.try_update(|categories| {
                let id = CategoryId::next_after(categories.iter().map(|c| &c.id));
                let category = data.into_category(id)?;
                let mut next = categories.clone();
                next.push(category.clone());
                Ok::<_, DomainError>((next, category))
            })?;
            info!(category_id = %category.id, name = %category.name, "category created");
            Ok(category)
        })
    }

    /// Edit a category record. Items keep the snapshot they were saved with.
    pub fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Pending<MenuCategory> {
        let guard = self.inner.in_flight.begin();
        let inner = Arc::clone(&self.inner);
        self.run(self.inner.latency.update_category, move || {
            let _guard = guard;
            let category = inner.categories.try_update(|categories| {
                let idx = position_of(categories, id)
                    .ok_or_else(|| DomainError::not_found(format!("category {id}")))?;
                let updated = patch.applied_to(&categories[idx])?;
                let mut next = categories.clone();
                next[idx] = updated.clone();
                Ok::<_, DomainError>((next, updated))
            })?;
            info!(category_id = %id, name = %category.name, "category updated");
            Ok(category)
        })
    }

    // ---------------------------------------------------------------------
    // Streams and live views
    // ---------------------------------------------------------------------

    pub fn items_stream(&self) -> &Observable<Vec<MenuItem>> {
        &self.inner.items
    }

    pub fn categories_stream(&self) -> &Observable<Vec<MenuCategory>> {
        &self.inner.categories
    }

    pub fn loading_stream(&self) -> &Observable<bool> {
        self.inner.in_flight.stream()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.is_busy()
    }

    /// Items whose category snapshot has `category_id`, kept in sync.
    pub fn by_category(&self, category_id: CategoryId) -> Projection<Vec<MenuItem>> {
        self.inner.items.map(move |items| {
            items
                .iter()
                .filter(|i| i.category.id == category_id)
                .cloned()
                .collect()
        })
    }

    /// Items matching `query` (see [`MenuItem::matches`]), kept in sync.
    pub fn search(&self, query: &str) -> Projection<Vec<MenuItem>> {
        let needle = query.to_lowercase();
        self.inner.items.map(move |items| {
            items
                .iter()
                .filter(|i| i.matches_lowercase(&needle))
                .cloned()
                .collect()
        })
    }

    fn run<T, F>(&self, delay: Duration, op: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DomainResult<T> + Send + 'static,
    {
        schedule(&*self.inner.ctx.scheduler, delay, op)
    }
}

impl CatalogInner {
    fn category_snapshot(&self, id: CategoryId) -> DomainResult<MenuCategory> {
        self.categories
            .read(|categories| categories.iter().find(|c| c.id == id).cloned())
            .ok_or_else(|| DomainError::validation(format!("unknown category {id}")))
    }

    /// Replace item `id` with `make_patch(current)` merged onto it.
    fn apply_patch(
        &self,
        id: MenuItemId,
        make_patch: impl FnOnce(&MenuItem) -> DomainResult<MenuItemPatch>,
    ) -> DomainResult<MenuItem> {
        let now = self.clock_now();
        self.items.try_update(|items| {
            let idx = position_of(items, id).ok_or_else(|| item_not_found(id))?;
            let patch = make_patch(&items[idx])?;
            let category = patch
                .category_id
                .map(|cid| self.category_snapshot(cid))
                .transpose()?;
            let updated = patch.applied_to(&items[idx], category, now)?;

            let mut next = items.clone();
            next[idx] = updated.clone();
            Ok((next, updated))
        })
    }

    fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.ctx.clock.now()
    }
}

fn item_not_found(id: MenuItemId) -> DomainError {
    DomainError::not_found(format!("menu item {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use bistro_core::ManualClock;
    use bistro_events::ManualScheduler;
    use chrono::{TimeZone, Utc};

    use crate::item::{NutritionInfo, Price};

    fn store() -> CatalogStore {
        CatalogStore::new(
            StoreContext::immediate(),
            CatalogLatency::default(),
            Catalog::demo(Utc::now()),
        )
    }

    fn new_item(category: u64) -> NewMenuItem {
        NewMenuItem {
            name: "Minestrone".to_string(),
            description: "Vegetable soup".to_string(),
            price: Price::from_cents(795),
            category_id: CategoryId::new(category),
            image: None,
            is_available: true,
            preparation_time: 12,
            ingredients: vec!["Beans".to_string(), "Pasta".to_string()],
            allergens: BTreeSet::from(["Gluten".to_string()]),
            nutritional_info: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_input_plus_id_and_timestamps() {
        let store = store();
        let mut input = new_item(1);
        input.ingredients = vec![" Beans ".to_string(), "Pasta".to_string()];
        input.image = Some("minestrone.jpg".to_string());
        input.nutritional_info = Some(NutritionInfo {
            calories: 210,
            protein: 8.5,
            carbs: 30.0,
            fat: 4.25,
            fiber: 6.0,
        });

        let created = store.create_item(input.clone()).await.unwrap();
        let fetched = store.get_item_by_id(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.id, MenuItemId::new(6));
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.description, input.description);
        assert_eq!(fetched.price, input.price);
        assert_eq!(fetched.category.id, input.category_id);
        assert_eq!(fetched.category.name, "Appetizers");
        assert_eq!(fetched.image, input.image);
        assert_eq!(fetched.is_available, input.is_available);
        assert_eq!(fetched.preparation_time, input.preparation_time);
        assert_eq!(fetched.ingredients, input.ingredients);
        assert_eq!(fetched.allergens, input.allergens);
        assert_eq!(fetched.nutritional_info, input.nutritional_info);
        assert_eq!(fetched.created_at, fetched.updated_at);
        // Newest first.
        assert_eq!(store.items_stream().read(|items| items[0].id), created.id);
    }

    #[tokio::test]
    async fn unknown_category_is_a_validation_failure() {
        let store = store();
        let before = store.items_stream().snapshot();

        let err = store.create_item(new_item(99)).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.items_stream().snapshot(), before);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = store();
        store.delete_item(MenuItemId::new(2)).await.unwrap();

        let err = store.get_item_by_id(MenuItemId::new(2)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.delete_item(MenuItemId::new(2)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn ids_do_not_collide_after_delete() {
        let store = store();
        store.delete_item(MenuItemId::new(3)).await.unwrap();
        let created = store.create_item(new_item(2)).await.unwrap();
        assert_eq!(created.id, MenuItemId::new(6));
    }

    #[tokio::test]
    async fn toggle_twice_restores_availability() {
        let store = store();
        let id = MenuItemId::new(1);
        let original = store.get_item_by_id(id).await.unwrap().is_available;

        let once = store.toggle_availability(id).await.unwrap();
        assert_eq!(once.is_available, !original);
        let twice = store.toggle_availability(id).await.unwrap();
        assert_eq!(twice.is_available, original);
    }

    #[tokio::test]
    async fn toggle_unknown_fails_without_touching_loading() {
        let store = store();
        let err = store.toggle_availability(MenuItemId::new(42)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn update_resnapshots_category_only_when_named() {
        let store = store();
        let id = MenuItemId::new(1);

        let renamed = store
            .update_item(
                id,
                MenuItemPatch {
                    name: Some("Classic Caesar".to_string()),
                    ..MenuItemPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.category.name, "Appetizers");

        let moved = store
            .update_item(
                id,
                MenuItemPatch {
                    category_id: Some(CategoryId::new(5)),
                    ..MenuItemPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.category.name, "Salads");
        assert_eq!(moved.name, "Classic Caesar");
    }

    #[tokio::test]
    async fn update_can_remove_nutrition_info() {
        let store = store();
        let id = MenuItemId::new(1);
        assert!(store.get_item_by_id(id).await.unwrap().nutritional_info.is_some());

        let patch: MenuItemPatch = serde_json::from_str(r#"{"nutritionalInfo": null}"#).unwrap();
        let updated = store.update_item(id, patch).await.unwrap();

        assert_eq!(updated.nutritional_info, None);
        assert_eq!(store.get_item_by_id(id).await.unwrap().nutritional_info, None);
    }

    #[tokio::test]
    async fn update_missing_item_is_not_found() {
        let store = store();
        let err = store
            .update_item(MenuItemId::new(77), MenuItemPatch::availability(false))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failed_update_leaves_collection_alone() {
        let store = store();
        let before = store.items_stream().snapshot();
        let err = store
            .update_item(
                MenuItemId::new(1),
                MenuItemPatch {
                    price: Some(Price::from_cents(0)),
                    ..MenuItemPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.items_stream().snapshot(), before);
    }

    #[tokio::test]
    async fn category_rename_keeps_item_snapshot() {
        let store = store();
        let soups = store.create_category(NewCategory::named("Soups")).await.unwrap();
        assert_eq!(soups.id, CategoryId::new(6));
        assert_eq!(store.categories_stream().read(Vec::len), 6);

        let item = store.create_item(new_item(soups.id.get())).await.unwrap();
        store
            .update_category(soups.id, CategoryPatch::rename("Broths"))
            .await
            .unwrap();

        let fetched = store.get_item_by_id(item.id).await.unwrap();
        assert_eq!(fetched.category.name, "Soups");
        assert_eq!(
            store.categories_stream().read(|c| c.last().map(|c| c.name.clone())),
            Some("Broths".to_string())
        );
    }

    #[tokio::test]
    async fn update_category_unknown_is_not_found() {
        let store = store();
        let err = store
            .update_category(CategoryId::new(40), CategoryPatch::rename("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn live_views_follow_mutations() {
        let store = store();
        let salads = store.by_category(CategoryId::new(5));
        let juice = store.search("orange");
        assert_eq!(salads.snapshot().len(), 1);
        assert_eq!(juice.snapshot().len(), 1);

        let mut data = new_item(5);
        data.name = "Orange Fennel Salad".to_string();
        drop(store.create_item(data));

        assert_eq!(salads.snapshot().len(), 2);
        assert_eq!(juice.snapshot().len(), 2);
    }

    #[test]
    fn shorter_write_overtakes_and_latest_completion_wins() {
        let scheduler = Arc::new(ManualScheduler::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let store = CatalogStore::new(
            StoreContext::new(clock, scheduler.clone()),
            CatalogLatency::default(),
            Catalog::demo(Utc::now()),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store
            .items_stream()
            .subscribe(move |items| sink.lock().unwrap().push(items.len()));

        // 1000 ms create, then an 800 ms delete issued right after.
        let mut created = store.create_item(new_item(1));
        let mut deleted = store.delete_item(MenuItemId::new(4));
        assert!(store.is_loading());

        scheduler.advance(Duration::from_millis(800));
        assert!(deleted.try_take().unwrap().is_ok());
        assert!(created.try_take().is_none());
        assert!(store.is_loading());

        scheduler.advance(Duration::from_millis(200));
        assert!(created.try_take().unwrap().is_ok());
        assert!(!store.is_loading());

        assert_eq!(*seen.lock().unwrap(), vec![5, 4, 5]);
        let ids: Vec<u64> = store.items_stream().read(|items| items.iter().map(|i| i.id.get()).collect());
        assert_eq!(ids, vec![6, 1, 2, 3, 5]);
    }

    #[test]
    fn dropped_handle_still_applies_the_write() {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = CatalogStore::new(
            StoreContext::new(Arc::new(bistro_core::SystemClock), scheduler.clone()),
            CatalogLatency::default(),
            Catalog::demo(Utc::now()),
        );

        drop(store.delete_item(MenuItemId::new(1)));
        scheduler.run_until_idle();

        assert_eq!(store.items_stream().read(Vec::len), 4);
        assert!(!store.is_loading());
    }

    #[test]
    fn listing_reads_do_not_mutate() {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = CatalogStore::new(
            StoreContext::new(Arc::new(bistro_core::SystemClock), scheduler.clone()),
            CatalogLatency::default(),
            Catalog::demo(Utc::now()),
        );

        let mut items = store.list_items();
        let mut categories = store.list_categories();
        assert!(store.is_loading());

        scheduler.advance(Duration::from_millis(300));
        assert_eq!(categories.try_take().unwrap().unwrap().len(), 5);
        assert!(items.try_take().is_none());

        scheduler.advance(Duration::from_millis(500));
        assert_eq!(items.try_take().unwrap().unwrap().len(), 5);
        assert!(!store.is_loading());
    }
}
