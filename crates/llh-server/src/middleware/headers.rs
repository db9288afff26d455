//! Cache policy header middleware.
//!
//! Browsers must revalidate every response so that edits show up on the next
//! request. Responses that already carry a `Cache-Control` header (the event
//! stream sets `no-cache`) are left untouched.

use axum::http::{HeaderValue, header};
use tower_http::set_header::SetResponseHeaderLayer;

/// Cache-Control header value.
const CACHE_CONTROL: &str = "must-revalidate, max-age=0";

/// Create layer that adds the Cache-Control header.
pub(crate) fn cache_control_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL),
    )
}
