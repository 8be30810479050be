use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use feedpulse::{
    application::analytics::AnalyticsService,
    application::error::AppError,
    application::tracking::TrackingService,
    config,
    infra::{
        db::PostgresRepositories,
        http::{ApiState, build_router},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation("database.url is required"))?;

    // Lazy pool: the process serves even when the database is down at
    // startup; /health reports the degraded state.
    let repositories = Arc::new(
        PostgresRepositories::connect_lazy(database_url, settings.database.max_connections.get())
            .map_err(|err| {
                AppError::unexpected(format!("failed to configure database pool: {err}"))
            })?,
    );

    match repositories.run_migrations().await {
        Ok(()) => info!(target = "feedpulse::startup", "migrations applied"),
        Err(err) => warn!(
            target = "feedpulse::startup",
            error = %err,
            "migrations deferred, database unreachable",
        ),
    }

    let state = ApiState {
        tracking: Arc::new(TrackingService::new(
            repositories.clone(),
            repositories.clone(),
        )),
        analytics: Arc::new(AnalyticsService::new(
            repositories.clone(),
            settings.dashboard.top_posts.get(),
        )),
        health: repositories,
    };

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::unexpected(format!("failed to bind listener: {err}")))?;

    info!(
        target = "feedpulse::startup",
        addr = %settings.server.addr,
        "listening",
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown handler");
        return;
    }
    info!(target = "feedpulse::startup", "shutdown signal received");
}
