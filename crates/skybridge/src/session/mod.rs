//! Session Management
//!
//! Handles MCP session lifecycle: allocation, stream ownership, delivery,
//! idempotent close, and idle expiry.

mod store;

pub use store::{spawn_cleanup_task, SessionManager, SessionStats};

use axum::response::sse::Event;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::types::protocol::Implementation;

/// Bound on undelivered events per session.
pub const STREAM_CAPACITY: usize = 32;

/// SSE event sender owned by the session table.
pub type SseSender = mpsc::Sender<Event>;

/// The receiving half handed to the HTTP layer as the client's SSE stream.
pub type SessionStream = ReceiverStream<Event>;

/// Outcome of a send to an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the session's stream.
    Sent,
    /// The session is open but has no stream attached.
    NoStream,
}

/// An MCP session.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier (UUID v4).
    pub id: String,

    /// When the session was created.
    pub created_at: Instant,

    /// Last activity timestamp.
    pub last_seen: Instant,

    /// Client implementation info (set after initialize).
    pub client_info: Option<Implementation>,

    /// Whether the session has completed initialization.
    pub initialized: bool,

    /// SSE channel sender (None until a stream is attached).
    pub tx: Option<SseSender>,
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_seen: now,
            client_info: None,
            initialized: false,
            tx: None,
        }
    }

    /// True if a stream is attached and its receiver is still alive.
    pub fn is_connected(&self) -> bool {
        self.tx.as_ref().map(|tx| !tx.is_closed()).unwrap_or(false)
    }

    /// True if a stream was attached and the client has since gone away.
    pub fn is_disconnected(&self) -> bool {
        self.tx.as_ref().map(|tx| tx.is_closed()).unwrap_or(false)
    }

    pub fn idle_duration(&self) -> Duration {
        self.last_seen.elapsed()
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn set_initialized(&mut self, client_info: Implementation) {
        self.initialized = true;
        self.client_info = Some(client_info);
        self.touch();
    }

    /// Attach a fresh stream, replacing any previous one.
    pub fn attach_stream(&mut self) -> SessionStream {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        self.tx = Some(tx);
        self.touch();
        ReceiverStream::new(rx)
    }
}
