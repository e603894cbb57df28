//! The console's route table and navigation menus.

use bistro_auth::{NavEntry, Role, Route};

/// Roles that may open the menu list and the add/edit forms.
pub const MENU_EDITORS: &[Role] = &[Role::Admin, Role::Manager, Role::Chef];

/// Roles that may delete menu items.
pub const MENU_DELETERS: &[Role] = &[Role::Admin, Role::Manager];

pub const ALL_STAFF: &[Role] = &Role::ALL;

/// Paths reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &["/auth/login", "/auth/register"];

/// Routes behind the authentication guard. Segments starting with `:` match
/// any single path segment.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            Route::open("/dashboard"),
            Route::restricted("/menu", MENU_EDITORS),
            Route::restricted("/menu/add", MENU_EDITORS),
            Route::restricted("/menu/edit/:id", MENU_EDITORS),
        ])
    }
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.routes.iter().find(|r| pattern_matches(&r.path, path))
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern = pattern.trim_matches('/').split('/');
    let mut path = path.trim_matches('/').split('/');
    loop {
        match (pattern.next(), path.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') && !s.is_empty() => {}
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Sidebar navigation.
pub fn sidebar() -> Vec<NavEntry> {
    vec![
        NavEntry::new("Dashboard", "dashboard", "/dashboard", ALL_STAFF),
        NavEntry::new("Orders", "receipt", "/orders", ALL_STAFF),
        NavEntry::new("Menu Management", "restaurant-menu", "/menu", MENU_EDITORS),
        NavEntry::new("Tables", "table-restaurant", "/tables", &[Role::Admin, Role::Manager, Role::Waiter]),
        NavEntry::new("Reservations", "event", "/reservations", &[Role::Admin, Role::Manager, Role::Waiter]),
        NavEntry::new("Staff", "people", "/staff", &[Role::Admin, Role::Manager]),
        NavEntry::new("Inventory", "inventory", "/inventory", &[Role::Admin, Role::Manager, Role::Chef]),
        NavEntry::new("Reports", "analytics", "/reports", &[Role::Admin, Role::Manager]),
    ]
}

/// Dashboard shortcuts.
pub fn quick_actions() -> Vec<NavEntry> {
    vec![
        NavEntry::new(
            "New Order",
            "receipt",
            "/orders/create",
            &[Role::Admin, Role::Manager, Role::Waiter, Role::Cashier],
        ),
        NavEntry::new("Add Menu Item", "restaurant-menu", "/menu/add", MENU_EDITORS),
        NavEntry::new("Manage Tables", "table-restaurant", "/tables", &[Role::Admin, Role::Manager, Role::Waiter]),
        NavEntry::new("Add Staff", "people", "/staff/add", &[Role::Admin, Role::Manager]),
        NavEntry::new("View Reports", "analytics", "/reports", &[Role::Admin, Role::Manager]),
        NavEntry::new("Inventory", "inventory", "/inventory", &[Role::Admin, Role::Manager, Role::Chef]),
    ]
}
