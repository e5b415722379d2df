use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::response::IntoResponse;
use mongodb::bson::doc;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mewayz_billing::config::Config;
use mewayz_billing::db::{
    self, mongo_referral_repository::MongoReferralRepository,
    mongo_user_repository::MongoUserRepository,
    mongo_webhook_event_repository::MongoWebhookEventRepository,
};
use mewayz_billing::responses::JsonResponse;
use mewayz_billing::routes::api_router;
use mewayz_billing::services::stripe::LiveStripeService;
use mewayz_billing::utils::jwt::JwtKeys;
use mewayz_billing::AppState;

fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|v| !v.is_empty())?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mewayz_billing=info,tower_http=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok(); // Load .env file before anything reads the environment
    let _sentry_guard = init_sentry();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;
    let jwt_keys = JwtKeys::from_env().context("invalid JWT_SECRET")?;

    let client = mongodb::Client::with_uri_str(&config.mongo_url)
        .await
        .context("failed to parse MONGO_URL")?;
    let database = client.database(&config.db_name);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .context("failed to reach MongoDB")?;
    info!(db = %config.db_name, "connected to MongoDB");
    db::ensure_indexes(&database)
        .await
        .context("failed to create indexes")?;

    let state = AppState {
        users: Arc::new(MongoUserRepository::new(&database)),
        webhook_events: Arc::new(MongoWebhookEventRepository::new(&database)),
        referrals: Arc::new(MongoReferralRepository::new(&database)),
        stripe: Arc::new(LiveStripeService::from_settings(&config.stripe)),
        config: Arc::new(config.clone()),
        jwt_keys: Arc::new(jwt_keys),
    };

    // Default: 200ms/token (~5 req/sec) with short bursts
    let rate_limit_ms: u64 = env_or("RATE_LIMITER_MILLISECONDS", 200);
    let rate_limit_burst: u32 = env_or("RATE_LIMITER_BURST", 20);
    let global_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_ms)
            .burst_size(rate_limit_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .context("invalid rate limiter settings")?,
    );

    let governor_limiter = global_governor_conf.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            governor_limiter.retain_recent();
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_origin
                .parse::<HeaderValue>()
                .context("FRONTEND_ORIGIN is not a valid header value")?,
        )
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("stripe-signature"),
        ])
        .allow_credentials(true);

    let app = api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer {
            config: global_governor_conf,
        })
        .layer(cors);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "billing service listening");
    axum::serve(listener, make_service).await?;
    Ok(())
}
