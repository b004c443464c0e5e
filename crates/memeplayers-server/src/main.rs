mod config;

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use memeplayers_api::auth::hash_password;
use memeplayers_api::{AppStateInner, router};
use memeplayers_db::Database;
use memeplayers_types::api::CreateUserRequest;
use memeplayers_types::models::Role;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memeplayers=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    // Init database
    let db = Database::open(&config.db_path)?;
    if let Some((username, password)) = &config.bootstrap_admin {
        ensure_admin(&db, username, password)?;
    }

    let state = AppStateInner::new(db, config.api.clone());
    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("memeplayers listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create the configured admin account unless a user with that name exists.
fn ensure_admin(db: &Database, username: &str, password: &str) -> anyhow::Result<()> {
    if db.get_user_by_username(username)?.is_some() {
        return Ok(());
    }

    let req = CreateUserRequest {
        username: username.to_string(),
        password: password.to_string(),
        email: String::new(),
        avatar: None,
        bio: String::new(),
        activity_points: 0,
        role: Role::Admin,
    };
    let hash = hash_password(password)?;
    db.create_user(&req, &hash)?;
    info!("Bootstrap admin {} created", username);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
