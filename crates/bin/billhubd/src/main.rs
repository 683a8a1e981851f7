//! # billhubd — billhub automation daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (`billhub.toml`, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve until SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use billhub_adapter_http_axum::auth::AuthConfig;
use billhub_adapter_http_axum::state::AppState;
use billhub_adapter_messenger::{ConfiguredMessenger, SmsGatewayConfig, SmtpConfig};
use billhub_adapter_render_fs::FsRenderer;
use billhub_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteAuditLogRepository, SqliteCustomerRepository,
    SqliteInvoiceRepository, SqliteNotificationRepository, SqlitePackageRepository,
    SqliteTenantRepository,
};
use billhub_app::ports::SystemClock;
use billhub_app::services::audit_log::AutomationAuditLog;
use billhub_app::services::dispatcher::NotificationDispatcher;
use billhub_app::services::invoice_generator::InvoiceGenerator;
use billhub_app::services::lifecycle_scanner::LifecycleScanner;
use billhub_app::services::transition_engine::TransitionEngine;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    if config.auth.api_key.is_none() {
        tracing::warn!("no api_key configured, webhook triggers will be rejected");
    }
    if config.auth.operator_token.is_none() {
        tracing::warn!("no operator_token configured, operator endpoints will be rejected");
    }

    // Database
    let db = DatabaseConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Outbound delivery
    let smtp = config.delivery.smtp.as_ref().map(|section| SmtpConfig {
        host: section.host.clone(),
        username: section.username.clone(),
        password: section.password.clone(),
        from: section.from.clone(),
    });
    let sms = config
        .delivery
        .sms_gateway_url
        .clone()
        .map(|url| SmsGatewayConfig { url });
    let messenger = Arc::new(ConfiguredMessenger::from_channels(smtp, sms)?);

    // Services
    let engine = TransitionEngine::new(
        SqliteTenantRepository::new(pool.clone()),
        SqlitePackageRepository::new(pool.clone()),
        NotificationDispatcher::new(
            SqliteNotificationRepository::new(pool.clone()),
            Arc::clone(&messenger),
        ),
        AutomationAuditLog::new(SqliteAuditLogRepository::new(pool.clone())),
        SystemClock,
    );
    let generator = InvoiceGenerator::new(
        SqliteTenantRepository::new(pool.clone()),
        SqliteCustomerRepository::new(pool.clone()),
        SqlitePackageRepository::new(pool.clone()),
        SqliteInvoiceRepository::new(pool.clone()),
        FsRenderer::new(&config.artifacts.dir),
        NotificationDispatcher::new(
            SqliteNotificationRepository::new(pool.clone()),
            Arc::clone(&messenger),
        ),
        AutomationAuditLog::new(SqliteAuditLogRepository::new(pool.clone())),
        SystemClock,
    );
    let scanner = LifecycleScanner::new(
        SqliteTenantRepository::new(pool.clone()),
        TransitionEngine::new(
            SqliteTenantRepository::new(pool.clone()),
            SqlitePackageRepository::new(pool.clone()),
            NotificationDispatcher::new(
                SqliteNotificationRepository::new(pool.clone()),
                Arc::clone(&messenger),
            ),
            AutomationAuditLog::new(SqliteAuditLogRepository::new(pool.clone())),
            SystemClock,
        ),
        InvoiceGenerator::new(
            SqliteTenantRepository::new(pool.clone()),
            SqliteCustomerRepository::new(pool.clone()),
            SqlitePackageRepository::new(pool.clone()),
            SqliteInvoiceRepository::new(pool.clone()),
            FsRenderer::new(&config.artifacts.dir),
            NotificationDispatcher::new(
                SqliteNotificationRepository::new(pool.clone()),
                Arc::clone(&messenger),
            ),
            AutomationAuditLog::new(SqliteAuditLogRepository::new(pool.clone())),
            SystemClock,
        ),
        NotificationDispatcher::new(
            SqliteNotificationRepository::new(pool.clone()),
            Arc::clone(&messenger),
        ),
        AutomationAuditLog::new(SqliteAuditLogRepository::new(pool.clone())),
        SystemClock,
    );

    // HTTP
    let state = AppState::new(
        scanner,
        engine,
        generator,
        SqliteAuditLogRepository::new(pool),
        AuthConfig {
            api_key: config.auth.api_key.clone(),
            operator_token: config.auth.operator_token.clone(),
        },
    );
    let app = billhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "billhubd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
