use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chanda_tracker::{db, live::DonationFeed, routes, share::Gateways, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if it exists
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "chanda_tracker=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chanda Tracker application...");

    tracing::info!("Initializing database connection pool...");
    let db_pool = db::init_pool().await?;
    tracing::info!("Database connection pool initialized successfully");

    let gateways = Gateways::from_env();
    tracing::info!(
        pdf = gateways.pdf_available(),
        mail = gateways.mail_available(),
        sms = gateways.sms_available(),
        "Share gateways configured"
    );

    let state = AppState {
        db: db_pool,
        gateways,
        feed: DonationFeed::new(),
    };

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(
                env::var("RATE_LIMIT_PER_SECOND")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1200),
            )
            .burst_size(
                env::var("RATE_LIMIT_BURST")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(2400),
            )
            .finish()
            .expect("governor config"),
    );

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(health_check))
        // Record surface
        .route(
            "/api/donations",
            get(routes::donations::list_donations).post(routes::donations::create_donation),
        )
        .route("/api/donations/search", get(routes::donations::search_by_donor))
        .route("/api/donations/range", get(routes::donations::get_by_date_range))
        .route("/api/donations/stats", get(routes::donations::stats))
        .route("/api/donations/stream", get(routes::donations::stream_donations))
        .route("/api/festivals", get(routes::donations::list_festivals))
        // Receipt documents and share sinks
        .route("/api/receipts/{receipt_id}", get(routes::receipts::get_receipt))
        .route(
            "/api/receipts/{receipt_id}/pdf",
            post(routes::receipts::render_receipt_pdf),
        )
        .route(
            "/api/receipts/{receipt_id}/email",
            post(routes::receipts::email_receipt),
        )
        .route(
            "/api/receipts/{receipt_id}/sms",
            post(routes::receipts::sms_receipt),
        )
        // Aggregate exports
        .route("/api/reports/export", get(routes::reports::export_report))
        .route("/api/reports/export/csv", get(routes::reports::export_csv))
        .route("/api/reports/pdf", post(routes::reports::report_pdf))
        .layer(cors)
        .layer(GovernorLayer::new(governor_config))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state);

    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn allowed_origins() -> Vec<HeaderValue> {
    let env_mode = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
    let configured: Vec<HeaderValue> = env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|v| {
            v.split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        return None;
                    }
                    match trimmed.parse::<HeaderValue>() {
                        Ok(value) => Some(value),
                        Err(_) => {
                            tracing::warn!("Ignoring invalid ALLOWED_ORIGINS entry: {}", trimmed);
                            None
                        }
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if configured.is_empty() {
        if env_mode == "production" {
            panic!("ALLOWED_ORIGINS must contain at least one valid origin in production");
        }
        return vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ];
    }

    configured
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}

async fn health_check() -> &'static str {
    "OK"
}
