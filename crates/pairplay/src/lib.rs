//! # Pairplay
//!
//! Serverless two-player matches. Two peers pair up by copying a code
//! each way, then play over a direct channel with no server arbitrating
//! state: each side validates every message it receives against its own
//! copy of the match.
//!
//! The [`Coordinator`] holds the rules and performs no I/O. The
//! [`driver()`] wraps one in a Tokio task, connects it to a
//! [`PeerTransport`](pairplay_transport::PeerTransport) and publishes a
//! [`SessionView`] after every step.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairplay::prelude::*;
//!
//! # async fn demo() -> Result<(), PairplayError> {
//! let network = MemoryNetwork::new();
//! let (handle, driver) = pairplay::driver(
//!     CoordinatorConfig::new().player_name("Ada"),
//!     move || network.transport(),
//! );
//! tokio::spawn(driver.run());
//!
//! handle.create().await?;
//! let view = handle.wait_for(|v| v.session_code.is_some()).await?;
//! println!("send this to your opponent: {}", view.session_code.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod driver;
mod error;
pub mod logging;
mod view;

pub use config::CoordinatorConfig;
pub use coordinator::{Action, Coordinator};
pub use driver::{Driver, DriverHandle, driver};
pub use error::PairplayError;
pub use view::SessionView;

pub use pairplay_protocol as protocol;
pub use pairplay_session as session;
pub use pairplay_signal as signal;
pub use pairplay_transport as transport;

pub mod prelude {
    pub use crate::{
        Action, Coordinator, CoordinatorConfig, DriverHandle, PairplayError, SessionView,
    };
    pub use pairplay_protocol::{ProtocolMessage, Symbol};
    pub use pairplay_session::{ConnectionPhase, GameMode, GameStatus, Intent, SessionError};
    pub use pairplay_signal::{SessionId, decode_code, encode_code};
    #[cfg(feature = "websocket")]
    pub use pairplay_transport::WebSocketTransport;
    pub use pairplay_transport::{MemoryNetwork, MemoryTransport, PeerTransport};
}
