//! SSE Handler
//!
//! Handles GET /mcp/sse requests to establish legacy SSE connections.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

use super::McpState;

/// Handle SSE connection requests.
///
/// 1. Open a new session with a stream
/// 2. Send the endpoint event with the POST URL
/// 3. Keep connection alive with pings
///
/// Session ids are always allocated here; clients cannot pick their own.
#[tracing::instrument(skip(state), fields(session_id = tracing::field::Empty))]
pub async fn sse_handler(
    State(state): State<Arc<McpState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session_id, stream) = state.sessions().open();
    tracing::Span::current().record("session_id", session_id.as_str());

    let endpoint_event = Event::default()
        .event("endpoint")
        .data(format!("/mcp/message?sessionId={}", session_id));

    if let Err(e) = state.sessions().send_event(&session_id, endpoint_event).await {
        tracing::warn!(error = %e, "Failed to send initial endpoint event");
    }

    tracing::info!(session_id = %session_id, "SSE connection established");

    Sse::new(stream.map(Ok::<_, Infallible>)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}
