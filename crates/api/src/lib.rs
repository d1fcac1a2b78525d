pub mod error;
pub mod response;
pub mod routes;
pub mod state;

use std::{any::Any as PanicPayload, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{
            CONTENT_LENGTH, CONTENT_SECURITY_POLICY, CONTENT_TYPE, REFERRER_POLICY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use memberdir_config::RateLimitSettings;
use error::ApiError;
use state::AppState;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;

pub fn build_router(state: AppState) -> Router {
    let environment = state.settings.app.environment;
    let cors = cors_layer(&state.settings.app.cors_origins);

    let mut api_routes = Router::new().route(
        "/members",
        get(routes::member::list).fallback(routes::not_found),
    );

    if state.settings.rate_limit.enabled {
        api_routes = with_rate_limit(api_routes, &state.settings.rate_limit);
    }

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(routes::health::health_check))
        .fallback(routes::not_found)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn PanicPayload + Send>| {
            error::panic_response(panic, environment)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; connect-src 'self'; font-src 'self'; \
    object-src 'none'; media-src 'self'; frame-src 'none'";

/// Read-only CORS policy. An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if allowed.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(24 * 60 * 60))
}

/// Per-client rate limit keyed on the forwarded or peer IP.
fn with_rate_limit(routes: Router<AppState>, settings: &RateLimitSettings) -> Router<AppState> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(settings.per_second)
        .burst_size(settings.burst_size)
        .finish();

    match config {
        Some(config) => routes
            .layer(GovernorLayer {
                config: Arc::new(config),
            })
            .layer(middleware::map_response(rate_limit_envelope)),
        None => {
            warn!(
                per_second = settings.per_second,
                burst_size = settings.burst_size,
                "Invalid rate limit settings, rate limiting disabled"
            );
            routes
        }
    }
}

/// Rewrites the limiter's plain-text 429 into the JSON error envelope,
/// keeping its retry headers.
async fn rate_limit_envelope(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }
    let (parts, _) = response.into_parts();
    let mut envelope = ApiError::TooManyRequests.into_response();
    for (name, value) in &parts.headers {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            envelope.headers_mut().insert(name.clone(), value.clone());
        }
    }
    warn!("Rate limit exceeded");
    envelope
}
