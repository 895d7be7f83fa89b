//! rrdpulse demo server.
//!
//! - Instrumented routes: `/`, `/api/users`, `/api/users/:id`
//! - One pulled gauge (`uptime`)
//! - Ctrl-C / SIGTERM: stop serving, flush once, exit

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::Path, http::StatusCode, routing::get, Router};
use tracing_subscriber::{fmt, EnvFilter};

use rrdpulse_collector::config::{self, HttpNaming};
use rrdpulse_collector::store::RrdtoolStore;
use rrdpulse_collector::{signal, HttpInstrumentation, MetricsCollector};
use rrdpulse_core::error::{Result, RrdPulseError};

const ROUTES: [&str; 3] = ["/", "/api/users", "/api/users/:id"];

async fn pong() -> &'static str {
    "OK"
}

async fn users() -> &'static str {
    "alice\nbob\n"
}

async fn user(Path(id): Path<u32>) -> (StatusCode, &'static str) {
    match id {
        1 => (StatusCode::OK, "alice"),
        2 => (StatusCode::OK, "bob"),
        _ => (StatusCode::NOT_FOUND, "no such user"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("RRDPULSE_CONFIG").unwrap_or_else(|_| "rrdpulse.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| RrdPulseError::BadConfig(format!("server.listen: {e}")))?;

    let store = Arc::new(RrdtoolStore::with_binary(&cfg.collector.rrdtool));
    let collector = Arc::new(MetricsCollector::new(cfg.collector_config(), store));

    let booted = Instant::now();
    collector.add_gauge_metric("uptime", move || booted.elapsed().as_secs_f64());

    let app = Router::new()
        .route("/", get(pong))
        .route("/api/users", get(users))
        .route("/api/users/:id", get(user));

    let instr = match cfg.http.naming {
        HttpNaming::Routes => {
            collector.set_route_source(|| ROUTES.iter().map(|r| r.to_string()).collect());
            HttpInstrumentation::routes(Arc::clone(&collector))
        }
        HttpNaming::Fixed => {
            let name = cfg.http.name.as_deref().unwrap_or_default();
            HttpInstrumentation::fixed(Arc::clone(&collector), name)
        }
    };
    let app = instr.instrument(app);

    let handle = collector.start().await?;

    tracing::info!(%listen, "rrdpulse demo starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| RrdPulseError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(signal::terminate())
        .await
        .map_err(|e| RrdPulseError::Internal(format!("server failed: {e}")))?;

    // Already logged by the scheduler; nothing left to retry on the way out.
    let _ = handle.shutdown().await;
    Ok(())
}
