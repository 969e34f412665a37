//! Server-Sent Events (SSE) endpoint for realtime report updates.
//!
//! Endpoint: GET /reports/{id}/events?client={uuid}
//!
//! Each `report` event carries the full saved document. Updates written by
//! the client named in `client` are not sent back to it.
//!
//! # Example
//!
//! ```text
//! event: report
//! data: {"type":"report","report_id":"r1","document":{...},"timestamp":"..."}
//!
//! event: heartbeat
//! data: {"type":"heartbeat","timestamp":"2024-01-01T00:00:00Z"}
//! ```

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use chrono::Utc;
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use report_core::ReportId;
use report_store::ReportSubscription;

use crate::error::ApiError;
use crate::events::{
    CatchupEvent, HEARTBEAT_INTERVAL_SECS, HeartbeatEvent, ReportEvent, ReportUpdate,
};
use crate::routes::reports::load_report;
use crate::state::AppState;

/// Query parameters for the events endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Client id whose own writes are filtered out.
    #[serde(default)]
    pub client: Option<Uuid>,
}

/// Where a stream's updates come from.
enum Feed {
    /// The primary store's change feed: every writer, any process.
    Primary(ReportSubscription),
    /// Saves made through this server.
    Local {
        receiver: broadcast::Receiver<ReportEvent>,
        report_id: ReportId,
        client: Option<Uuid>,
    },
}

impl Feed {
    async fn next(&mut self) -> Option<ReportEvent> {
        match self {
            Self::Primary(subscription) => {
                let document = subscription.recv().await?;
                Some(ReportEvent::Report(ReportUpdate {
                    report_id: document.id.clone(),
                    writer: None,
                    document,
                    timestamp: Utc::now(),
                }))
            }
            Self::Local {
                receiver,
                report_id,
                client,
            } => loop {
                match receiver.recv().await {
                    Ok(ReportEvent::Report(update))
                        if client.is_some() && update.writer == *client => {}
                    Ok(event) => return Some(event),
                    Err(RecvError::Lagged(count)) => {
                        tracing::warn!(
                            report_id = %report_id,
                            events_missed = count,
                            "SSE client lagged, sending catchup event"
                        );
                        return Some(ReportEvent::Catchup(CatchupEvent {
                            events_missed: count,
                            timestamp: Utc::now(),
                        }));
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!(report_id = %report_id, "Event channel closed, ending SSE stream");
                        return None;
                    }
                }
            },
        }
    }
}

/// GET /reports/{id}/events - Subscribe to updates of one report.
///
/// # Response
///
/// - 200 OK: SSE stream (Content-Type: text/event-stream)
/// - 404 Not Found: Report not found
///
/// A `catchup` event means updates were dropped; the client should reload
/// the report.
async fn subscribe_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let report_id = ReportId::from(id);
    load_report(&state, &report_id).await?;

    // An anonymous listener gets its own origin so it sees every writer.
    let origin = query.client.unwrap_or_else(Uuid::new_v4);
    let feed = match state.store().for_origin(origin).subscribe(&report_id) {
        Some(subscription) => Feed::Primary(subscription),
        None => Feed::Local {
            receiver: state.broadcaster().subscribe(&report_id).await,
            report_id: report_id.clone(),
            client: query.client,
        },
    };

    tracing::info!(report_id = %report_id, client = ?query.client, "Client subscribed to SSE events");

    let stream = stream::unfold(feed, |mut feed| async move {
        loop {
            let event = feed.next().await?;
            match serde_json::to_string(&event) {
                Ok(data) => {
                    let sse_event = Event::default().event(event.name()).data(data);
                    return Some((Ok(sse_event), feed));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                }
            }
        }
    });

    let heartbeat = serde_json::to_string(&ReportEvent::Heartbeat(HeartbeatEvent {
        timestamp: Utc::now(),
    }))
    .unwrap_or_else(|_| r#"{"type":"heartbeat"}"#.to_string());
    let keep_alive = KeepAlive::new()
        .interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS))
        .event(Event::default().event("heartbeat").data(heartbeat));

    Ok(Sse::new(stream).keep_alive(keep_alive))
}

/// Build SSE event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/{id}/events", get(subscribe_events))
}
