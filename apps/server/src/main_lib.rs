use std::sync::Arc;

use crate::config::{Config, LogFormat};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use trackmybudget_core::UnitOfWorkFactoryTrait;
use trackmybudget_storage_sqlite::{
    db::{self, write_actor},
    SqliteUnitOfWorkFactory,
};

pub struct AppState {
    pub unit_of_work_factory: Arc<dyn UnitOfWorkFactoryTrait>,
}

pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// Opens the database, applies pending migrations and wires the unit of work
/// factory. Fails fast when the store cannot be prepared.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path, config.db_pool_size)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let unit_of_work_factory = Arc::new(SqliteUnitOfWorkFactory::new(pool, writer));

    Ok(Arc::new(AppState {
        unit_of_work_factory,
    }))
}
