//! Session Manager
//!
//! In-memory session table backed by DashMap.
//!
//! Emits spans for the session lifecycle:
//! - `mcp.session.create` - session allocated
//! - `mcp.session.attach` - SSE stream attached
//! - `mcp.session.close` - explicit close or dead stream
//! - `mcp.session.expire` - idle expiry (cleanup)

use axum::response::sse::Event;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{Delivery, Session, SessionStream};
use crate::types::error::McpError;
use crate::types::protocol::Implementation;

/// Statistics about active sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Total number of open sessions.
    pub total: usize,
    /// Sessions with a live SSE stream.
    pub connected: usize,
    /// Sessions without a live stream.
    pub detached: usize,
}

/// Owns every open session and its stream handle.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Open a session with an SSE stream.
    pub fn open(&self) -> (String, SessionStream) {
        let id = self.allocate();
        let stream = match self.sessions.get_mut(&id) {
            Some(mut session) => session.attach_stream(),
            // Only reachable if the session was closed between the two calls.
            None => Session::new(id.clone()).attach_stream(),
        };
        (id, stream)
    }

    /// Open a session without a stream; responses go back inline.
    pub fn open_detached(&self) -> String {
        self.allocate()
    }

    /// Attach a new stream to an open session, replacing any previous one.
    pub fn attach(&self, id: &str) -> Result<SessionStream, McpError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| McpError::UnknownSession(id.to_string()))?;

        let _span = tracing::info_span!("mcp.session.attach", mcp.session_id = %id).entered();
        tracing::info!("Attached SSE stream");
        Ok(session.attach_stream())
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Update last activity. Returns false for unknown ids.
    pub fn touch(&self, id: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) => {
                session.touch();
                true
            }
            None => false,
        }
    }

    pub fn set_initialized(&self, id: &str, client_info: Implementation) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            tracing::info!(
                session_id = %id,
                client_name = %client_info.name,
                client_version = %client_info.version,
                "Session initialized"
            );
            session.set_initialized(client_info);
        }
    }

    pub fn client_info(&self, id: &str) -> Option<Implementation> {
        self.sessions.get(id).and_then(|s| s.client_info.clone())
    }

    /// Deliver a JSON-RPC payload as a `message` event.
    pub async fn send(&self, id: &str, payload: &Value) -> Result<Delivery, McpError> {
        let event = Event::default().event("message").data(payload.to_string());
        self.send_event(id, event).await
    }

    /// Deliver a raw SSE event.
    ///
    /// The sender is cloned out of the table before awaiting, so a slow client
    /// only ever blocks its own channel. A failed write closes the session.
    pub async fn send_event(&self, id: &str, event: Event) -> Result<Delivery, McpError> {
        let tx = {
            let mut session = self
                .sessions
                .get_mut(id)
                .ok_or_else(|| McpError::UnknownSession(id.to_string()))?;
            session.touch();
            session.tx.clone()
        };

        let Some(tx) = tx else {
            tracing::debug!(session_id = %id, "Session has no stream, nothing delivered");
            return Ok(Delivery::NoStream);
        };

        if tx.send(event).await.is_err() {
            // Only drop the session if the dead channel is still the one attached.
            let removed = self.sessions.remove_if(id, |_, session| {
                session.tx.as_ref().is_some_and(|current| current.same_channel(&tx))
            });
            if removed.is_some() {
                let _span = tracing::info_span!("mcp.session.close", mcp.session_id = %id).entered();
                tracing::warn!("Stream write failed, session closed");
            }
            return Err(McpError::UnknownSession(id.to_string()));
        }

        Ok(Delivery::Sent)
    }

    /// Close a session. Unknown or already closed ids are a no-op.
    /// Returns true if a session was removed.
    pub fn close(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            let _span = tracing::info_span!("mcp.session.close", mcp.session_id = %id).entered();
            tracing::info!("Session closed");
        }
        removed
    }

    /// Close every session. Dropping the senders ends each attached stream,
    /// so SSE responses finish and graceful shutdown can complete.
    pub fn close_all(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        if count > 0 {
            tracing::info!(closed = count, "Closed all sessions");
        }
        count
    }

    /// Remove sessions idle longer than `max_idle` and sessions whose client
    /// dropped its stream. Returns the number removed.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        let to_remove: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| {
                let session = entry.value();
                session.is_disconnected() || session.idle_duration() > max_idle
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in to_remove {
            if self.sessions.remove(&id).is_some() {
                removed += 1;
                let _span = tracing::info_span!("mcp.session.expire", mcp.session_id = %id).entered();
                tracing::info!("Removed stale session");
            }
        }

        if removed > 0 {
            tracing::info!(
                removed = removed,
                remaining = self.sessions.len(),
                "Session cleanup completed"
            );
        }

        removed
    }

    pub fn stats(&self) -> SessionStats {
        let connected = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_connected())
            .count();
        let total = self.sessions.len();

        SessionStats {
            total,
            connected,
            detached: total.saturating_sub(connected),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn allocate(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let _span = tracing::info_span!("mcp.session.create", mcp.session_id = %id).entered();
        self.sessions.insert(id.clone(), Session::new(id.clone()));
        tracing::info!("Created new session");
        id
    }
}

/// Spawn a background task that periodically cleans up stale sessions.
pub fn spawn_cleanup_task(
    sessions: Arc<SessionManager>,
    interval: Duration,
    max_idle: Duration,
    cancel: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Session cleanup task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    sessions.cleanup(max_idle);
                }
            }
        }
    })
}
