mod generator;
mod paths;
mod session;
mod store;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use cc_auth::bus::NotificationBus;
use simplelog::{Config, LevelFilter, WriteLogger};

use crate::session::{DemoOptions, OPTIONS_KEY};
use crate::store::{CertificateStore, StoreError};

#[tokio::main]
async fn main() {
    let log_path = paths::log_file().unwrap_or_else(|| PathBuf::from("cc-auth-demo.log"));
    let log_file = File::create(&log_path).expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
    }
}

async fn run() -> Result<(), StoreError> {
    let db_path = paths::certificates_db().unwrap_or_else(|| PathBuf::from("cc-auth-demo.db"));
    let bus = NotificationBus::new();
    let store = Arc::new(CertificateStore::open(&db_path, bus.clone()).await?);

    let options = store
        .get_setting::<DemoOptions>(OPTIONS_KEY)
        .await?
        .unwrap_or_default()
        .apply_args(std::env::args().skip(1));
    store.set_setting(OPTIONS_KEY, &options).await?;

    session::run(store, bus, options).await
}
