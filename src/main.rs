use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use survey_pulse::analytics::benchmark::BenchmarkGate;
use survey_pulse::analytics::service::AnalyticsService;
use survey_pulse::analytics::summary::SummaryGenerator;
use survey_pulse::config::AppConfig;
use survey_pulse::middleware::RateLimiter;
use survey_pulse::services::ai::{AiService, DisabledGenerator};
use survey_pulse::state::{AppState, SharedState};
use survey_pulse::store::demo::seed_demo_store;
use survey_pulse::store::postgres::PgStore;
use survey_pulse::store::{ResponseStore, TierSource};
use survey_pulse::web;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let (store, tiers): (Arc<dyn ResponseStore>, Arc<dyn TierSource>) = if config.demo_mode {
        let demo = Arc::new(seed_demo_store(chrono::Utc::now()));
        tracing::warn!(
            "DEMO_MODE enabled: serving {} sample surveys from memory",
            demo.surveys().len()
        );
        let tiers: Arc<dyn TierSource> = demo.clone();
        (demo as Arc<dyn ResponseStore>, tiers)
    } else {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL missing"))?;
        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to database: {}", e);
                e
            })?;
        tracing::info!("Database connection established");

        if config.run_migrations {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to run database migrations: {}", e);
                    e
                })?;
            tracing::info!("Database migrations completed");
        }

        let pg = Arc::new(PgStore::new(pool));
        let tiers: Arc<dyn TierSource> = pg.clone();
        (pg as Arc<dyn ResponseStore>, tiers)
    };

    if let Some(tier) = config.tier_override {
        tracing::warn!("TIER_OVERRIDE active: every user is treated as {}", tier.as_str());
    }

    let summarizer: Arc<dyn SummaryGenerator> = match config.openai_api_key.clone() {
        Some(key) => Arc::new(AiService::new(key, config.openai_model.clone())),
        None => {
            tracing::warn!("OPENAI_API_KEY not set; narrative summaries will be placeholders");
            Arc::new(DisabledGenerator)
        }
    };

    let analytics = AnalyticsService::new(
        store,
        BenchmarkGate::new(tiers, config.tier_override),
        summarizer,
        config.store_timeout,
        config.summary_min_responses,
    );
    let summary_limiter = RateLimiter::new(
        config.summary_rate_limit,
        std::time::Duration::from_secs(config.summary_rate_window_secs),
    );

    let shared: SharedState = Arc::new(AppState {
        analytics,
        session_key: config.session_key.clone(),
        summary_limiter: summary_limiter.clone(),
    });

    // Rate limiter cleanup every five minutes
    let scheduler = JobScheduler::new().await?;
    scheduler
        .add(Job::new_async("0 */5 * * * *", move |_uuid, _l| {
            let limiter = summary_limiter.clone();
            Box::pin(async move {
                let active = limiter.cleanup().await;
                tracing::debug!("Summary rate limiter cleanup: {} active users", active);
            })
        })?)
        .await?;
    scheduler.start().await?;

    let app = Router::new().merge(web::routes(shared)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
