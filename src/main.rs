use anyhow::Context;
use std::sync::Arc;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use expense_bot::bot;
use expense_bot::config::Config;
use expense_bot::constants::DEFAULT_LOG_FILTER;
use expense_bot::database;
use expense_bot::engine::Engine;
use expense_bot::store::{LibsqlStore, Logged};
use expense_bot::users::UserRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;
    info!(allowed_users = config.allowed_users.len(), "configuration loaded");

    let db = database::open(&config.database_url, config.database_auth_token.as_deref())
        .await
        .context("failed to open record store")?;
    database::init_schema(&db)
        .await
        .context("failed to initialize schema")?;
    if config.sync_allow_list {
        database::sync_allowed_identities(&db, &config.allowed_users).await?;
    }

    let store = Logged::new(LibsqlStore::new(db));
    let engine = Arc::new(Engine::new(
        store,
        UserRegistry::new(config.allowed_users.clone()),
    ));

    bot::run(Bot::new(config.bot_token), engine).await;
    info!("expense bot stopped");
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
