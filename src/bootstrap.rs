//! Application bootstrap: registry, store, migrations, server.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_db::Store;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Build the registry with every project module registered.
pub fn registry() -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry).context("failed to register modules")?;
    Ok(registry)
}

async fn connect_and_migrate(
    settings: &Settings,
    registry: &ModuleRegistry,
) -> anyhow::Result<(Arc<dyn Store>, usize)> {
    let db = bookshelf_db::connect(
        &settings.database.endpoint,
        settings.database.max_connections,
    )
    .await?;

    let applied = db
        .migrate(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations complete");

    Ok((db, applied))
}

/// Connect to the configured store and apply pending migrations.
/// Returns the number of migrations applied.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let registry = registry()?;
    let (_, applied) = connect_and_migrate(settings, &registry).await?;
    Ok(applied)
}

/// Run the service until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "bookshelf bootstrap starting"
    );

    let registry = registry()?;
    let (db, _) = connect_and_migrate(&settings, &registry).await?;

    let ctx = InitCtx {
        settings: &settings,
        db,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");
    let served = bookshelf_http::start_server(&registry, &ctx).await;

    registry.stop_modules().await?;
    served
}
