//! Wiring: one session store, one catalog store and the preferences,
//! sharing a key-value store, clock and scheduler.

use std::sync::Arc;

use tracing::{debug, info};

use bistro_auth::{
    FALLBACK_ROUTE, GuardOutcome, IdentityRegistry, LOGIN_ROUTE, NavEntry, SessionStore,
    can_access, role_guard, visible_entries,
};
use bistro_core::{Clock, KeyValueStore};
use bistro_events::{Scheduler, StoreContext};
use bistro_menu::{Catalog, CatalogStore};

use crate::config::ConsoleConfig;
use crate::preferences::Preferences;
use crate::routes::{self, MENU_DELETERS, MENU_EDITORS, RouteTable};

#[derive(Debug, Clone)]
pub struct Console {
    session: SessionStore,
    catalog: CatalogStore,
    preferences: Preferences,
    routes: RouteTable,
}

impl Console {
    pub fn new(
        config: &ConsoleConfig,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let now = clock.now();
        let latency = config.latency();
        let ctx = StoreContext::new(clock, scheduler);

        let (registry, catalog) = if config.seed_demo_data {
            (IdentityRegistry::demo(now), Catalog::demo(now))
        } else {
            (IdentityRegistry::default(), Catalog::empty())
        };

        let session = SessionStore::new(ctx.clone(), Arc::clone(&kv), registry, latency.auth);
        let catalog = CatalogStore::new(ctx, latency.catalog, catalog);
        let preferences = Preferences::load(kv);

        info!(
            simulated_latency = config.simulated_latency,
            seeded = config.seed_demo_data,
            restored_session = session.current_identity().is_some(),
            "console ready"
        );

        Self {
            session,
            catalog,
            preferences,
            routes: RouteTable::default(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Without a session token, remember `attempted` and send to login.
    pub fn auth_guard(&self, attempted: &str) -> GuardOutcome {
        if self.session.is_authenticated() {
            return GuardOutcome::Allow;
        }
        self.preferences.remember_return_url(attempted);
        debug!(path = attempted, "not signed in; redirecting to login");
        GuardOutcome::Redirect(LOGIN_ROUTE.to_string())
    }

    /// Decide navigation to `path`: public pages always pass, known routes
    /// go through the auth guard then the role guard, unknown paths fall
    /// back to the dashboard.
    pub fn guard(&self, path: &str) -> GuardOutcome {
        if routes::is_public(path) {
            return GuardOutcome::Allow;
        }
        let Some(route) = self.routes.resolve(path) else {
            return GuardOutcome::Redirect(FALLBACK_ROUTE.to_string());
        };

        match self.auth_guard(path) {
            GuardOutcome::Allow => {}
            redirect => return redirect,
        }

        let identity = self.session.current_identity();
        role_guard(identity.as_ref(), route)
    }

    /// Where to go after a successful login; consumes the remembered URL.
    pub fn after_login_destination(&self) -> String {
        self.preferences.take_return_url()
    }

    pub fn sidebar(&self) -> Vec<NavEntry> {
        self.visible(routes::sidebar())
    }

    pub fn quick_actions(&self) -> Vec<NavEntry> {
        self.visible(routes::quick_actions())
    }

    pub fn can_edit_menu(&self) -> bool {
        can_access(self.session.current_identity().as_ref(), MENU_EDITORS)
    }

    pub fn can_delete_menu_items(&self) -> bool {
        can_access(self.session.current_identity().as_ref(), MENU_DELETERS)
    }

    fn visible(&self, entries: Vec<NavEntry>) -> Vec<NavEntry> {
        let identity = self.session.current_identity();
        visible_entries(&entries, identity.as_ref())
            .into_iter()
            .cloned()
            .collect()
    }
}
