// src/main.rs
mod analytics;
mod app;
mod auth;
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod ingest;
mod middleware;
mod models;
mod routes;
mod sample;
mod state;
mod store;

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::fmt::init as tracing_init;

use crate::store::session::SessionStore;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();

    let config = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    let db_pool = database::create_pool(&config.database_url).await
        .expect("Failed to create database pool");

    if config.seed_demo_users {
        match database::seed_demo_users(&db_pool).await {
            Ok(created) => tracing::info!(created, "Demo users ready"),
            Err(e) => tracing::warn!(error = %e, "Failed to seed demo users"),
        }
    }

    let host = config.host;
    let base_port = config.port;
    tracing::info!(
        horizon_days = config.rollup.horizon_days,
        clamp_floor = config.rollup.clamp_floor,
        clamp_display = config.rollup.clamp_display,
        "Rollup configuration"
    );

    let app_state = state::AppState::new(db_pool, config);
    spawn_session_purge(app_state.sessions.clone());

    let app = app::build_app(app_state);

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

fn spawn_session_purge(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired(Utc::now());
            if removed > 0 {
                tracing::debug!(removed, remaining = sessions.len(), "Purged expired sessions");
            }
        }
    });
}
