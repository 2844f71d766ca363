//! HTTP routing configuration with rate limiting and OpenAPI documentation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
};
use governor::clock::{Clock, DefaultClock};
use governor::{NotUntil, Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::app::AppState;
use crate::domain::{ErrorDetail, RateLimitResponse};

use super::handlers::{
    check_availability_handler, create_session_handler, get_session_handler,
    health_check_handler, liveness_handler, metrics_handler, mint_handler, openapi_handler,
    quote_handler, readiness_handler, select_rail_handler, set_name_handler,
    switch_network_handler, view_handler,
};
use super::manifest::manifest_handler;

type KeyedLimiter =
    RateLimiter<IpAddr, governor::state::keyed::DashMapStateStore<IpAddr>, DefaultClock>;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for session and quote endpoints
    pub general_rps: u32,
    /// Burst size for session and quote endpoints
    pub general_burst: u32,
    /// Requests per second for health endpoints
    pub health_rps: u32,
    /// Burst size for health endpoints
    pub health_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_rps: 10,
            general_burst: 20,
            health_rps: 100,
            health_burst: 100,
        }
    }
}

impl RateLimitConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str, default: u32| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            general_rps: read("RATE_LIMIT_RPS", defaults.general_rps),
            general_burst: read("RATE_LIMIT_BURST", defaults.general_burst),
            ..defaults
        }
    }
}

fn quota(rps: u32, burst: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN))
}

/// Shared rate limiter state, keyed by client IP.
pub struct RateLimitState {
    general_limiter: KeyedLimiter,
    health_limiter: KeyedLimiter,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            general_limiter: RateLimiter::dashmap(quota(config.general_rps, config.general_burst)),
            health_limiter: RateLimiter::dashmap(quota(config.health_rps, config.health_burst)),
            config,
        }
    }
}

/// Extract client IP from request (X-Forwarded-For, X-Real-IP, or ConnectInfo).
/// Unknown clients share one bucket.
fn client_ip_from_request<B>(request: &Request<B>) -> IpAddr {
    let header_ip = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };
    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

type ClockInstant = <DefaultClock as Clock>::Instant;

fn retry_after_secs(not_until: &NotUntil<ClockInstant>) -> u64 {
    not_until
        .wait_time_from(DefaultClock::default().now())
        .as_secs()
}

/// Rate limit middleware for session and quote endpoints.
async fn rate_limit_general_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    let limit = HeaderValue::from(rate_limit.config.general_rps);
    match rate_limit.general_limiter.check_key(&client_ip) {
        Ok(_) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert("X-RateLimit-Limit", limit);
            response
        }
        Err(not_until) => {
            let retry_after = retry_after_secs(&not_until);
            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded. Please slow down your requests.".to_string(),
                },
                retry_after,
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit);
            headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}

/// Rate limit middleware for health endpoints.
async fn rate_limit_health_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip = client_ip_from_request(&request);
    match rate_limit.health_limiter.check_key(&client_ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let retry_after = retry_after_secs(&not_until);
            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                },
                retry_after,
            };
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_session_handler))
        .route("/{id}", get(get_session_handler))
        .route("/{id}/name", put(set_name_handler))
        .route("/{id}/check", post(check_availability_handler))
        .route("/{id}/rail", put(select_rail_handler))
        .route("/{id}/mint", post(mint_handler))
        .route("/{id}/network/switch", post(switch_network_handler))
        .route("/{id}/view", get(view_handler))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check_handler))
        .route("/live", get(liveness_handler))
        .route("/ready", get(readiness_handler))
}

fn assemble(
    app_state: Arc<AppState>,
    sessions: Router<Arc<AppState>>,
    quote: Router<Arc<AppState>>,
    health: Router<Arc<AppState>>,
) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    Router::new()
        .nest("/sessions", sessions)
        .merge(quote)
        .nest("/health", health)
        .route("/metrics", get(metrics_handler))
        .route("/.well-known/farcaster.json", get(manifest_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .layer(middleware)
        .with_state(app_state)
}

/// Create router without rate limiting
pub fn create_router(app_state: Arc<AppState>) -> Router {
    assemble(
        app_state,
        session_routes(),
        Router::new().route("/quote", get(quote_handler)),
        health_routes(),
    )
}

/// Create router with rate limiting enabled
pub fn create_router_with_rate_limit(app_state: Arc<AppState>, config: RateLimitConfig) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(config));
    let general = || {
        middleware::from_fn_with_state(Arc::clone(&rate_limit_state), rate_limit_general_middleware)
    };

    assemble(
        app_state,
        session_routes().layer(general()),
        Router::new()
            .route("/quote", get(quote_handler))
            .layer(general()),
        health_routes().layer(middleware::from_fn_with_state(
            Arc::clone(&rate_limit_state),
            rate_limit_health_middleware,
        )),
    )
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::test_utils::test_state;

    async fn dummy_handler() -> impl IntoResponse {
        StatusCode::OK
    }

    fn limited_app(config: RateLimitConfig) -> Router {
        let state = Arc::new(RateLimitState::new(config));
        Router::new()
            .route("/", get(dummy_handler))
            .layer(middleware::from_fn_with_state(
                state,
                rate_limit_general_middleware,
            ))
    }

    fn get_from(ip: &str) -> Request<Body> {
        Request::builder()
            .uri("/")
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_rate_limit_config_from_lookup() {
        let config = RateLimitConfig::from_lookup(|key| match key {
            "RATE_LIMIT_RPS" => Some("5".to_string()),
            "RATE_LIMIT_BURST" => Some("not a number".to_string()),
            _ => None,
        });
        assert_eq!(config.general_rps, 5);
        assert_eq!(config.general_burst, 20);
        assert_eq!(config.health_rps, 100);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(
            client_ip_from_request(&request),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );

        let unknown = Request::builder().body(()).unwrap();
        assert_eq!(
            client_ip_from_request(&unknown),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[tokio::test]
    async fn test_rate_limit_exceeded_includes_headers_and_body() {
        let app = limited_app(RateLimitConfig {
            general_rps: 1,
            general_burst: 1,
            ..Default::default()
        });

        app.clone().oneshot(get_from("192.168.1.1")).await.unwrap();
        let response = app.oneshot(get_from("192.168.1.1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "0");
        assert!(response.headers().contains_key("Retry-After"));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("slow down"));
    }

    /// One IP exhausting its limit does not block another.
    #[tokio::test]
    async fn test_rate_limit_is_per_ip() {
        let app = limited_app(RateLimitConfig {
            general_rps: 1,
            general_burst: 1,
            ..Default::default()
        });

        app.clone().oneshot(get_from("192.168.1.1")).await.unwrap();
        let blocked = app.clone().oneshot(get_from("192.168.1.1")).await.unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = app.oneshot(get_from("10.0.0.1")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
        assert_eq!(other.headers().get("X-RateLimit-Limit").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_router_liveness() {
        let router = create_router(test_state());
        let res = router
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_not_found() {
        let router = create_router(test_state());
        let res = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limited_router_blocks_sessions_not_manifest() {
        let router = create_router_with_rate_limit(
            test_state(),
            RateLimitConfig {
                general_rps: 1,
                general_burst: 1,
                ..Default::default()
            },
        );
        let post_session = || {
            Request::builder()
                .method("POST")
                .uri("/sessions")
                .body(Body::empty())
                .unwrap()
        };

        let first = router.clone().oneshot(post_session()).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let second = router.clone().oneshot(post_session()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let manifest = router
            .oneshot(
                Request::builder()
                    .uri("/.well-known/farcaster.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(manifest.status(), StatusCode::OK);
    }
}
