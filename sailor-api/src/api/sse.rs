//! Server-Sent Events for dashboards

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of domain events
///
/// Streams:
/// - ConnectionStatus on connect
/// - every `SailorEvent` published after the client subscribed
pub async fn event_stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sailor_common::sse::event_sse_stream("sailor-api", state.events.subscribe())
}
