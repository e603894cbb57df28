use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use bistro_auth::{Credentials, DEMO_PASSWORD};
use bistro_console::{Console, ConsoleConfig};
use bistro_core::{InMemoryKeyValueStore, SystemClock};
use bistro_events::TokioScheduler;
use bistro_menu::{FilterCriteria, SortDirection, SortKey, StatusFilter, apply};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConsoleConfig::from_env()?;
    bistro_observability::init(config.log_format);

    let scheduler = TokioScheduler::current().context("no tokio runtime")?;
    let console = Console::new(
        &config,
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(SystemClock),
        Arc::new(scheduler),
    );

    info!(outcome = ?console.guard("/menu"), "visiting /menu signed out");

    let session = console
        .session()
        .login(Credentials::new("admin@restaurant.com", DEMO_PASSWORD))
        .await
        .context("demo admin login failed")?;
    info!(
        user = %session.identity.display_name(),
        role = %session.identity.role,
        destination = %console.after_login_destination(),
        "signed in"
    );

    let sidebar: Vec<String> = console.sidebar().into_iter().map(|e| e.label).collect();
    info!(?sidebar, "navigation");

    let items = console.catalog().list_items().await?;
    let criteria = FilterCriteria {
        status: StatusFilter::Available,
        sort_by: SortKey::Price,
        direction: SortDirection::Desc,
        ..FilterCriteria::default()
    };
    for item in apply(&items, &criteria) {
        info!(
            id = %item.id,
            name = %item.name,
            price = %item.price,
            category = %item.category.name,
            "menu item"
        );
    }

    console.session().logout();
    Ok(())
}
