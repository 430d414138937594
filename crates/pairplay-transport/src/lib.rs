//! Peer transport abstraction for Pairplay.
//!
//! Provides the [`PeerTransport`] trait: the opaque channel two peers use
//! once an offer/answer pair has been exchanged out of band. The rest of
//! the stack never inspects how a transport negotiates; it only passes the
//! offer and answer bodies around as text.
//!
//! ```text
//! host                          guest
//!  initiate() ──offer──────────→ accept(offer)
//!  complete(answer) ←──answer─── (answer)
//!  send()/next_event() ⇄ send()/next_event()
//! ```
//!
//! # Feature Flags
//!
//! - `websocket` (default) — direct WebSocket transport via `tokio-tungstenite`

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryNetwork, MemoryTransport};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

use std::fmt;
use std::future::Future;

/// Readiness of the underlying data channel.
///
/// This is transport-level readiness only. A channel that reports
/// [`ChannelState::Open`] has not yet exchanged the application handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Negotiation is in progress.
    Connecting,
    /// Data can flow in both directions.
    Open,
    /// The channel was closed cleanly by either side.
    Closed,
    /// The channel broke or could not be established.
    Failed,
}

impl ChannelState {
    /// Returns `true` if the channel can no longer carry data.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Something the transport reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One text message arrived from the remote peer.
    Message(String),
    /// The channel changed state.
    StateChanged(ChannelState),
}

/// A two-party transport negotiated through manually exchanged descriptions.
///
/// All methods take `&self` so that a caller can wait for events while a
/// negotiation step is still in flight. Implementations use interior
/// mutability. Every returned future is `Send`, so a generic owner can be
/// spawned onto the runtime; implementations may still use `async fn`.
pub trait PeerTransport: Send + Sync + 'static {
    /// Starts a connection as the initiating peer and returns the offer body.
    fn initiate(&self) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Answers an offer produced by the remote peer's [`initiate`] and
    /// returns the answer body.
    ///
    /// [`initiate`]: PeerTransport::initiate
    fn accept(&self, offer: &str) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Applies the remote peer's answer. The channel reports
    /// [`ChannelState::Open`] through [`next_event`] once it is usable.
    ///
    /// [`next_event`]: PeerTransport::next_event
    fn complete(&self, answer: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends one text message to the remote peer.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next event.
    ///
    /// Returns `None` once the transport will never produce another event.
    fn next_event(&self) -> impl Future<Output = Option<TransportEvent>> + Send;

    /// Closes the channel. Closing an unopened transport is a no-op.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
