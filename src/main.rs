use std::net::SocketAddr;

use anyhow::Context;
use tower_http::trace::TraceLayer;

use account_server::{
    auth::bootstrap::{build_identity_providers, seed_admin},
    config::AppConfig,
    db::connection,
    email::build_mailer,
    logging::init_tracing,
    routes::router,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging, cfg.run_mode());

    let db_cfg = cfg.database.as_ref().context("database config is required")?;
    let db = connection::connect(db_cfg, cfg.run_mode()).await?;

    let identity_providers = build_identity_providers(&cfg.oauth)?;
    let mailer = build_mailer(cfg.email.as_ref())?;
    let state = AppState::new(cfg, db, identity_providers, mailer)?;

    if let Some(auth_cfg) = state.config.auth.as_ref() {
        seed_admin(auth_cfg, &ServiceContext::from_state(state.as_ref())).await?;
    }

    let app = router(state.clone()).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", state.config.general.host, state.config.general.port)
        .parse()
        .context("invalid host/port")?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
