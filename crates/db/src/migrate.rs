use sqlx::{Executor, SqlitePool};

use crate::error::StoreResult;

/// Migration definition contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const BOOKKEEPING: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    );
"#;

/// Apply every `(module, migration)` pair not yet recorded in `_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row, in the order given.
pub(crate) async fn run(pool: &SqlitePool, migrations: &[(String, Migration)]) -> StoreResult<usize> {
    pool.execute(sqlx::raw_sql(BOOKKEEPING)).await?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let done: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;
        if done.is_some() {
            tracing::debug!(module = %module, migration = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        (&mut *tx).execute(sqlx::raw_sql(migration.up)).await?;
        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(module = %module, migration = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
