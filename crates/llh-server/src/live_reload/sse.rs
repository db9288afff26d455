//! Event stream and client script handlers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use llh_assets::SCRIPT_MIME;
use tokio_stream::StreamExt;

use crate::error::ServerError;
use crate::state::AppState;
use crate::static_files::file_response;

/// Interval of keep-alive comments on idle streams.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Open an event stream that receives a `change` event per change batch.
///
/// The event data is a JSON array of paths relative to the served directory.
pub(crate) async fn sse_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(ref live_reload) = state.live_reload else {
        return ServerError::NotFound("event stream".to_string()).into_response();
    };

    let stream = live_reload
        .subscribe()
        .map(|data| Ok::<_, Infallible>(Event::default().event("change").data(&*data)));

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response()
}

/// Serve the generated browser client.
pub(crate) async fn script_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.live_reload {
        Some(ref live_reload) => file_response(SCRIPT_MIME, live_reload.script()),
        None => ServerError::NotFound("client script".to_string()).into_response(),
    }
}
