use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue, StatusCode,
    },
    routing::MethodRouter,
};
use std::convert::Infallible;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::app::AppState;

pub const ALLOWED_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
pub const POST_METHODS: &str = "OPTIONS,POST";
pub const GET_METHODS: &str = "OPTIONS,GET";

/// Attach the browser-facing CORS headers to every response of `route`,
/// error responses included, and answer preflight requests.
pub fn with_cors(route: MethodRouter<AppState>, methods: &'static str) -> MethodRouter<AppState> {
    route
        .options(preflight)
        .layer::<_, Infallible>(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer::<_, Infallible>(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer::<_, Infallible>(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(methods),
        ))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}
