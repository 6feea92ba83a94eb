use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer attached to every response.
///
/// Credentialed requests require the allowed origin to match the request
/// origin, so the request's origin is echoed back.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::DELETE,
            Method::GET,
            Method::OPTIONS,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .allow_credentials(true)
}
