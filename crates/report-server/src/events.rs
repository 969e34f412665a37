//! Event broadcasting for report updates.
//!
//! Saves made through this server are published here, one channel per
//! report. When the store has a primary, SSE clients follow the primary's
//! change feed instead, which also carries writes from other processes;
//! this broadcaster is the realtime path for local-only deployments.
//!
//! # Event Types
//!
//! - `report`: a report was saved; carries the full document
//! - `heartbeat`: sent periodically to keep connections alive
//! - `catchup`: the subscriber fell behind and should reload the report

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use report_core::{Document, ReportId};

/// Default channel capacity for broadcast channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Heartbeat interval in seconds.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

// ============================================================================
// Event Types
// ============================================================================

/// An event sent to SSE subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEvent {
    /// A report was saved.
    Report(ReportUpdate),
    /// Periodic heartbeat to keep connection alive.
    Heartbeat(HeartbeatEvent),
    /// Client fell behind and should reload the report.
    Catchup(CatchupEvent),
}

impl ReportEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::Heartbeat(_) => "heartbeat",
            Self::Catchup(_) => "catchup",
        }
    }
}

/// A saved report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportUpdate {
    pub report_id: ReportId,
    /// Client that wrote the update, if it identified itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer: Option<Uuid>,
    pub document: Document,
    pub timestamp: DateTime<Utc>,
}

/// Heartbeat event data.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatEvent {
    pub timestamp: DateTime<Utc>,
}

/// Catchup event sent when a subscriber falls behind.
#[derive(Debug, Clone, Serialize)]
pub struct CatchupEvent {
    /// Number of events missed.
    pub events_missed: u64,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Manages one broadcast channel per report.
///
/// Channels are created lazily by the first subscriber and removed by
/// [`EventBroadcaster::cleanup_empty_channels`] once nobody listens.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    channels: Arc<RwLock<HashMap<ReportId, broadcast::Sender<ReportEvent>>>>,
    capacity: usize,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Subscribe to events for a report, creating its channel if needed.
    pub async fn subscribe(&self, report_id: &ReportId) -> broadcast::Receiver<ReportEvent> {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(report_id) {
                return sender.subscribe();
            }
        }

        let mut channels = self.channels.write().await;
        // Another task may have created it meanwhile.
        if let Some(sender) = channels.get(report_id) {
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(self.capacity);
        channels.insert(report_id.clone(), sender);

        tracing::debug!(
            report_id = %report_id,
            capacity = self.capacity,
            "Created event channel for report"
        );

        receiver
    }

    /// Publish an event to all subscribers of a report.
    ///
    /// Returns the number of receivers, or None if nobody ever subscribed.
    pub async fn publish(&self, report_id: &ReportId, event: ReportEvent) -> Option<usize> {
        let channels = self.channels.read().await;
        let sender = channels.get(report_id)?;
        match sender.send(event) {
            Ok(count) => {
                tracing::trace!(report_id = %report_id, receivers = count, "Published report event");
                Some(count)
            }
            Err(_) => Some(0),
        }
    }

    /// Publish a saved report.
    pub async fn publish_report(&self, document: &Document, writer: Option<Uuid>) -> Option<usize> {
        let event = ReportEvent::Report(ReportUpdate {
            report_id: document.id.clone(),
            writer,
            document: document.clone(),
            timestamp: Utc::now(),
        });
        self.publish(&document.id, event).await
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn subscriber_count(&self, report_id: &ReportId) -> usize {
        let channels = self.channels.read().await;
        channels
            .get(report_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    /// Drop channels with no subscribers. Returns how many were removed.
    pub async fn cleanup_empty_channels(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|id, sender| {
            let has_receivers = sender.receiver_count() > 0;
            if !has_receivers {
                tracing::debug!(report_id = %id, "Cleaning up empty event channel");
            }
            has_receivers
        });
        before - channels.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
