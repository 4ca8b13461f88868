mod app;
mod config;
mod roster;

use app::AppState;
use config::ServerConfig;
use parkline_ai::{FallbackGenerator, OpenAiGenerator, ResponseGenerator, RetryPolicy};
use parkline_conversation::{JsonFileSessions, SessionPersistence, SessionStore};
use parkline_directory::{DirectoryStore, IdentityResolver};
use parkline_engine::{
    ConversationEngine, EngineConfig, IdleSweeper, InMemoryCallLog, InMemoryMaintenanceLog,
    SweepReport,
};
use parkline_transport::{HttpSmsSender, Transport};
use roster::JsonRosterSource;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let transport: Arc<dyn Transport> = Arc::new(
        HttpSmsSender::new(config.sms.clone().into(), config.send_limit)
            .expect("invalid sms configuration"),
    );

    let generator: Arc<dyn ResponseGenerator> = match config.openai.clone() {
        Some(settings) => Arc::new(
            OpenAiGenerator::new(settings.into(), RetryPolicy::default())
                .expect("invalid generation configuration"),
        ),
        None => {
            tracing::warn!("no generation backend configured, using templated replies only");
            Arc::new(FallbackGenerator)
        }
    };

    let directory = Arc::new(DirectoryStore::new());
    let source = Arc::new(JsonRosterSource::new(&config.roster_path));
    let sessions = Arc::new(SessionStore::new());

    let persistence = config
        .sessions_path
        .as_ref()
        .map(JsonFileSessions::new);
    if let Some(persistence) = &persistence {
        match persistence.load().await {
            Ok(restored) if !restored.is_empty() => {
                tracing::info!(sessions = restored.len(), "restored sessions from disk");
                sessions.restore(restored).await;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "session restore failed, starting empty"),
        }
    }

    let engine = Arc::new(ConversationEngine::new(
        directory,
        source,
        Arc::clone(&sessions),
        IdentityResolver::new(),
        generator,
        Arc::clone(&transport),
        Arc::new(InMemoryMaintenanceLog::new()),
        Arc::new(InMemoryCallLog::new()),
        EngineConfig {
            owner_number: config.owner_number.clone(),
        },
    ));

    match engine.refresh_directory().await {
        Ok(count) => tracing::info!(tenants = count, "roster loaded"),
        Err(e) => {
            tracing::warn!(error = %e, "initial roster load failed, serving with an empty directory");
        }
    }

    // Idle sweep and periodic session save.
    let sweeper = IdleSweeper::new(
        Arc::clone(&sessions),
        Arc::clone(&transport),
        config.sweep.into(),
    );
    let sweep_interval_seconds = config.sweep_interval_seconds;
    let sweep_sessions = Arc::clone(&sessions);
    let sweep_persistence = persistence.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval_seconds));
        loop {
            interval.tick().await;
            let report = sweeper.sweep(chrono::Utc::now()).await;
            if report != SweepReport::default() {
                tracing::debug!(?report, "sweep pass");
            }
            if let Some(persistence) = &sweep_persistence {
                if let Err(e) = persistence.save(&sweep_sessions.export().await).await {
                    tracing::warn!(error = %e, "periodic session save failed");
                }
            }
        }
    });

    let state = AppState {
        engine: Arc::clone(&engine),
        transport: Arc::clone(&transport),
    };

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!(addr = %config.listen_addr, "listening");

    let shutdown_sessions = Arc::clone(&sessions);
    let shutdown_persistence = persistence.clone();
    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            if let Some(persistence) = &shutdown_persistence {
                if let Err(e) = persistence.save(&shutdown_sessions.export().await).await {
                    tracing::warn!(error = %e, "final session save failed");
                }
            }
        })
        .await
        .expect("server error");
}
