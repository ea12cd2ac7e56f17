use anyhow::{Context, Result};
use libsql::{Builder, Connection};
use std::{collections::HashSet, path::Path, sync::Arc};
use tokio::sync::RwLock;
use tracing::info;

const CREATE_ALLOWED_IDENTITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS allowed_identities (
    external_id  INTEGER PRIMARY KEY
);
"#;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                TEXT    PRIMARY KEY,
    external_id       INTEGER UNIQUE NOT NULL REFERENCES allowed_identities (external_id),
    delivery_address  INTEGER NOT NULL
);
"#;

const CREATE_PENDING_ACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pending_actions (
    owner         TEXT    PRIMARY KEY REFERENCES users (id),
    action_kind   TEXT    NOT NULL CHECK (action_kind IN ('none', 'await_amount', 'await_title')),
    staged_cents  INTEGER,
    updated_at    INTEGER NOT NULL,
    CHECK ((action_kind = 'await_title') = (staged_cents IS NOT NULL))
);
"#;

const CREATE_EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id            TEXT    PRIMARY KEY,
    owner         TEXT    NOT NULL REFERENCES users (id),
    amount_cents  INTEGER NOT NULL CHECK (amount_cents > 0),
    title         TEXT    NOT NULL CHECK (length(title) > 0),
    recorded_at   INTEGER NOT NULL
);
"#;

const CREATE_EXPENSES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_expenses_owner_recorded_at ON expenses (owner, recorded_at);
"#;

const CREATE_MONTHLY_TOTALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS monthly_totals (
    owner        TEXT    NOT NULL REFERENCES users (id),
    month_start  TEXT    NOT NULL,
    total_cents  INTEGER NOT NULL,
    PRIMARY KEY (owner, month_start)
);
"#;

/// Keeps `monthly_totals` in step with inserted expenses.
const CREATE_MONTHLY_TOTALS_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS expenses_accumulate_monthly_total
AFTER INSERT ON expenses
BEGIN
    INSERT INTO monthly_totals (owner, month_start, total_cents)
    VALUES (NEW.owner, date(NEW.recorded_at, 'unixepoch', 'start of month'), NEW.amount_cents)
    ON CONFLICT (owner, month_start) DO UPDATE SET total_cents = total_cents + excluded.total_cents;
END;
"#;

const SCHEMA: [&str; 7] = [
    CREATE_ALLOWED_IDENTITIES_TABLE,
    CREATE_USERS_TABLE,
    CREATE_PENDING_ACTIONS_TABLE,
    CREATE_EXPENSES_TABLE,
    CREATE_EXPENSES_INDEX,
    CREATE_MONTHLY_TOTALS_TABLE,
    CREATE_MONTHLY_TOTALS_TRIGGER,
];

pub type Db = Arc<RwLock<Connection>>;

pub fn is_remote_url(url: &str) -> bool {
    ["libsql://", "http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Opens the record store: a remote libSQL endpoint, or a local file path.
pub async fn open(url: &str, auth_token: Option<&str>) -> Result<Db> {
    let db = if is_remote_url(url) {
        let token = auth_token.context("remote database requires an auth token")?;
        Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await
            .with_context(|| format!("failed to open remote database {}", url))?
    } else {
        open_local_builder(Path::new(url)).await?
    };

    let conn = db.connect()?;
    conn.execute("PRAGMA foreign_keys = ON", ()).await?;
    info!(remote = is_remote_url(url), "record store opened");
    Ok(Arc::new(RwLock::new(conn)))
}

async fn open_local_builder(path: &Path) -> Result<libsql::Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Builder::new_local(path)
        .build()
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))
}

/// Creates all tables, indexes and triggers if they do not exist yet.
pub async fn init_schema(db: &Db) -> Result<()> {
    let conn = db.write().await;
    for statement in SCHEMA {
        conn.execute(statement, ()).await?;
    }
    Ok(())
}

/// Provisions every configured identity into `allowed_identities`.
pub async fn sync_allowed_identities(db: &Db, identities: &HashSet<i64>) -> Result<()> {
    let conn = db.write().await;
    for external_id in identities {
        conn.execute(
            "INSERT OR IGNORE INTO allowed_identities (external_id) VALUES (?)",
            [*external_id],
        )
        .await?;
    }
    info!(count = identities.len(), "allow-list provisioned");
    Ok(())
}
