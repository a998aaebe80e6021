//! Server-Sent Events (SSE) utilities

use crate::events::SailorEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

const HEARTBEAT: Duration = Duration::from_secs(15);

/// Stream domain events to one SSE client
///
/// Sends a `ConnectionStatus` event first, then every event received on `rx`
/// named after its variant, with a heartbeat comment every 15 seconds. A
/// client that falls behind skips the events it missed.
pub fn event_sse_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<SailorEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        let mut heartbeat = tokio::time::interval(HEARTBEAT);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => {
                        let name = event.event_type().to_string();
                        match Event::default().event(name).json_data(&event) {
                            Ok(sse_event) => yield Ok(sse_event),
                            Err(e) => warn!("SSE: failed to serialize event: {}", e),
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("SSE: client lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = heartbeat.tick() => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
            }
        }

        info!("SSE: {} event stream closed", service_name);
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT).text("heartbeat"))
}
