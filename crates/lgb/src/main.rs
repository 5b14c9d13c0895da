use std::sync::Arc;

use lgb_core::{config::Config, moderation::Moderation, store::BanStore};

#[tokio::main]
async fn main() -> Result<(), lgb_core::Error> {
    lgb_core::logging::init("lgb")?;

    // Missing required config is fatal before any connection is made.
    let cfg = Arc::new(Config::load()?);
    let store = Arc::new(BanStore::open(&cfg.db_path)?);
    let moderation = Arc::new(Moderation::from_config(&cfg));

    lgb_telegram::router::run_polling(cfg, store, moderation)
        .await
        .map_err(|e| lgb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
