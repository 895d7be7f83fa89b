//! axum middleware that feeds request outcomes into the collector buffer.
//!
//! Three naming modes:
//! - fixed: one base name for everything behind the layer,
//! - routes: base derived from the matched route pattern (`MatchedPath`),
//! - custom: base produced by a caller-supplied function.
//!
//! Route and custom modes only record into sets registered before start
//! (see `MetricsCollector::set_route_source`). Anything else lands in the
//! `unknown` set so parameterized paths cannot grow the schema. Requests that
//! match no route go through the instrumented fallback and count there too.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    handler::Handler,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    Router,
};

use rrdpulse_core::{normalize_base, route_metric, HttpMetricSet, UNKNOWN_ROUTE};

use super::apply_request;
use crate::collector::MetricsCollector;

/// Names the current request.
pub type RequestNamer = Arc<dyn Fn(&Request) -> String + Send + Sync>;

#[derive(Clone)]
enum Naming {
    Fixed(HttpMetricSet),
    Routes,
    Custom(RequestNamer),
}

#[derive(Clone)]
pub struct HttpInstrumentation {
    collector: Arc<MetricsCollector>,
    naming: Naming,
}

impl HttpInstrumentation {
    /// Record every request under `name` (cut to 14 characters).
    pub fn fixed(collector: Arc<MetricsCollector>, name: &str) -> Self {
        let set = collector.add_http_metrics(name);
        Self {
            collector,
            naming: Naming::Fixed(set),
        }
    }

    /// Record under the matched route pattern.
    pub fn routes(collector: Arc<MetricsCollector>) -> Self {
        collector.add_http_metrics(UNKNOWN_ROUTE);
        Self {
            collector,
            naming: Naming::Routes,
        }
    }

    /// Record under whatever `namer` returns for the request.
    pub fn with_namer<F>(collector: Arc<MetricsCollector>, namer: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        collector.add_http_metrics(UNKNOWN_ROUTE);
        Self {
            collector,
            naming: Naming::Custom(Arc::new(namer)),
        }
    }

    /// Metric set the request will be recorded into.
    pub fn resolve(&self, req: &Request) -> Option<HttpMetricSet> {
        let base = match &self.naming {
            Naming::Fixed(set) => return Some(set.clone()),
            Naming::Routes => req
                .extensions()
                .get::<MatchedPath>()
                .map(|p| route_metric(p.as_str()))
                .unwrap_or_else(|| UNKNOWN_ROUTE.to_string()),
            Naming::Custom(namer) => normalize_base(&namer(req)),
        };
        self.collector
            .http_set(&base)
            .or_else(|| self.collector.http_set(UNKNOWN_ROUTE))
    }

    /// Wrap every route of `router`. Uses `route_layer` so the matched
    /// pattern is visible to the middleware.
    ///
    /// `route_layer` never sees unmatched requests, so the router's fallback
    /// is replaced by an instrumented 404. Without a `MatchedPath` those
    /// requests resolve to `unknown` in route mode.
    pub fn instrument<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let fallback = not_found.layer(middleware::from_fn_with_state(self.clone(), track));
        router
            .route_layer(middleware::from_fn_with_state(self, track))
            .fallback(fallback)
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware body; usable directly with `from_fn_with_state`.
pub async fn track(State(instr): State<HttpInstrumentation>, req: Request, next: Next) -> Response {
    let set = instr.resolve(&req);
    let start = Instant::now();

    let resp = next.run(req).await;

    if let Some(set) = set {
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let status = resp.status().as_u16();
        instr
            .collector
            .buffer()
            .with_values(|values| apply_request(values, &set, latency_ms, status));
    }
    resp
}
