use std::time::Duration;

use tempfile::TempDir;
use trackmybudget_server::{
    api::app_router,
    build_state,
    config::{Config, LogFormat},
};

pub fn test_config(tmp: &TempDir) -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_string_lossy().to_string(),
        db_pool_size: 4,
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(5),
        log_format: LogFormat::Text,
    }
}

/// Router over a fresh migrated database. Keep the returned dir alive for the test.
pub async fn build_test_router() -> (axum::Router, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(&tmp);
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config).unwrap(), tmp)
}
