//! HTTP middleware
//!
//! The dashboard is served from a different origin, so CORS is always on.
//! Request tracing comes from tower-http.

use axum::http::{header, HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::CorsConfig;
use crate::features::shared::CALLER_ID_HEADER;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

type Classifier = SharedClassifier<ServerErrorsAsFailures>;

/// CORS layer scoped to the configured dashboard origins
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = wildcard_origin(config);

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(CALLER_ID_HEADER),
        ])
        .allow_origin(if wildcard {
            AllowOrigin::any()
        } else {
            origin_list(&config.allowed_origins)
        })
        .max_age(PREFLIGHT_MAX_AGE);

    // tower-http panics at request time if credentials are combined with a
    // wildcard origin, so the wildcard wins and credentials are dropped
    if config.allow_credentials {
        if wildcard {
            tracing::warn!("Wildcard CORS origin configured; ignoring allow_credentials");
        } else {
            cors = cors.allow_credentials(true);
        }
    }

    cors
}

fn wildcard_origin(config: &CorsConfig) -> bool {
    config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*")
}

fn origin_list(origins: &[String]) -> AllowOrigin {
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            },
        })
        .collect();

    AllowOrigin::list(values)
}

/// Request/response tracing with latency reported in microseconds
pub fn tracing_layer() -> TraceLayer<Classifier> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_with_dashboard_origins() {
        let config = CorsConfig {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://dashboard.example.com".to_string(),
            ],
            allow_credentials: true,
        };

        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_wildcard_disables_origin_list() {
        let config = CorsConfig {
            allowed_origins: vec!["https://dashboard.example.com".to_string(), "*".to_string()],
            allow_credentials: false,
        };

        assert!(wildcard_origin(&config));
        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_empty_origins_allow_any() {
        let config = CorsConfig {
            allowed_origins: vec![],
            allow_credentials: false,
        };

        assert!(wildcard_origin(&config));
        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_explicit_origins_are_not_wildcard() {
        let config = CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
        };

        assert!(!wildcard_origin(&config));
    }

    // Credentials with a wildcard origin would make tower-http panic on the
    // first request; the layer must drop credentials instead
    #[test]
    fn test_wildcard_with_credentials_drops_credentials() {
        let with_credentials = cors_layer(&CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        });
        let without_credentials = cors_layer(&CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        });

        assert_eq!(
            format!("{:?}", with_credentials),
            format!("{:?}", without_credentials)
        );
    }
}
