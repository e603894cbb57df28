//! UI preferences kept in the key-value store: colour theme and the
//! destination to resume after login.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use bistro_auth::FALLBACK_ROUTE;
use bistro_core::KeyValueStore;
use bistro_core::storage::keys;
use bistro_events::Observable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Anything other than `"light"` / `"dark"` reads as unset.
    fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

impl core::fmt::Display for Theme {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Preferences {
    kv: Arc<dyn KeyValueStore>,
    theme: Observable<Theme>,
}

impl core::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Preferences")
            .field("theme", &self.theme.snapshot())
            .finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let theme = kv
            .get(keys::THEME)
            .and_then(|raw| Theme::from_stored(&raw))
            .unwrap_or_default();
        Self {
            kv,
            theme: Observable::new(theme),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme.snapshot()
    }

    pub fn theme_stream(&self) -> &Observable<Theme> {
        &self.theme
    }

    pub fn set_theme(&self, theme: Theme) {
        self.kv.set(keys::THEME, theme.as_str().to_string());
        self.theme.set(theme);
        debug!(%theme, "theme saved");
    }

    pub fn toggle_theme(&self) -> Theme {
        let next = self.theme().toggled();
        self.set_theme(next);
        next
    }

    /// Remember where an unauthenticated visitor was heading.
    pub fn remember_return_url(&self, url: &str) {
        self.kv.set(keys::RETURN_URL, url.to_string());
    }

    /// Consume the remembered destination, falling back to the dashboard.
    pub fn take_return_url(&self) -> String {
        self.kv
            .take(keys::RETURN_URL)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| FALLBACK_ROUTE.to_string())
    }
}
