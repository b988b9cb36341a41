// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context as _, Result};
use oxidrop::{
    cfg::{config::Config, logger::init_logger},
    server::{self, Context},
    store::users::UserStore,
};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = std::env::var("LOG_CONFIG").ok();
    let _log_guard = init_logger(log_config.as_deref())?;

    let cfg = Config::from_env();
    cfg.validate()?;
    if cfg.is_default_secret() {
        warn!("SERVER_SECRET is the built-in default; override it in production");
    }

    let store = UserStore::connect(&cfg.db_path)
        .await
        .context("failed to open the user store")?;
    store
        .migrate()
        .await
        .context("failed to migrate the user store")?;

    let ctx = Context::new(cfg, store);
    let _janitor = server::spawn_janitor(&ctx);
    server::serve(ctx).await
}
