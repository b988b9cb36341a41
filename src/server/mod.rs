//! Process context, HTTP router, and background tasks.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// REST endpoints and the common response envelope.
pub mod http;
/// OS-probed network information.
pub mod network;
/// Channel upgrade, dispatch loop, and session teardown.
pub mod ws;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use anyhow::{Context as _, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::{
    auth::challenge::{ChallengeRegistry, SWEEP_INTERVAL},
    cfg::config::Config,
    session::{cache::DiscoverabilityCache, registry::SessionRegistry},
    store::users::UserStore,
    transactions::manager::TransactionManager,
};

/// Everything the handlers share: configuration, the store adapter, and the
/// four in-memory registries. One value, passed through the router state;
/// no process-wide globals.
#[derive(Debug)]
pub struct Context {
    pub cfg: Config,
    pub store: UserStore,
    pub challenges: ChallengeRegistry,
    pub sessions: SessionRegistry,
    pub cache: DiscoverabilityCache,
    pub transactions: TransactionManager,
    reply_seq: AtomicU64,
}

impl Context {
    pub fn new(cfg: Config, store: UserStore) -> Arc<Self> {
        Arc::new(Self {
            cfg,
            store,
            challenges: ChallengeRegistry::new(),
            sessions: SessionRegistry::new(),
            cache: DiscoverabilityCache::new(),
            transactions: TransactionManager::new(),
            reply_seq: AtomicU64::new(0),
        })
    }

    /// Per-process monotonically increasing reply counter.
    pub fn next_reply_code(&self) -> u64 {
        self.reply_seq.fetch_add(1, Ordering::Relaxed)
    }
}

/// Builds the full route table.
///
/// The CORS policy is a deployment concern; the default mirrors the
/// permissive origin setup the desktop clients expect on a LAN.
pub fn router(ctx: Arc<Context>) -> Router {
    Router::new()
        .route("/", get(http::root))
        .route("/register", post(http::register))
        .route("/challenge", get(http::challenge))
        .route("/login", post(http::login))
        .route("/network/ssid", get(http::network_ssid))
        .route("/protected/user", post(http::rename))
        .route("/protected/ws", get(ws::upgrade))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Background sweep of expired login challenges, for the life of the
/// process.
pub fn spawn_janitor(ctx: &Arc<Context>) -> JoinHandle<()> {
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SWEEP_INTERVAL).await;
            let removed = ctx.challenges.sweep();
            if removed > 0 {
                debug!(removed, "swept expired challenges");
            }
        }
    })
}

/// Binds the listen address and serves until the process ends.
pub async fn serve(ctx: Arc<Context>) -> Result<()> {
    let addr = ctx.cfg.server_url.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server started");

    axum::serve(listener, router(ctx))
        .await
        .context("server exited")
}
