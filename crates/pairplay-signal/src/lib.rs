//! Out-of-band signaling for Pairplay.
//!
//! Before any channel exists, two peers exchange a transport offer and
//! answer by copy and paste. This crate turns those descriptions into
//! codes a person can move through chat or email, and back:
//!
//! ```text
//! AB3CDE:eyJ0eXBlIjoib2ZmZXIiLCJib2R5IjoiLi4uIn0=
//! └─id─┘ └──────── base64({"type","body"}) ────────┘
//! ```
//!
//! Everything here is pure and offline: nothing validates a code except
//! the decoder, so the decoder treats its input as hostile.

mod code;
mod error;
mod link;
mod session_id;

pub use code::{
    DecodedCode, DescriptionKind, SessionDescription, decode_code, decode_code_detailed,
    encode_code,
};
pub use error::SignalError;
pub use link::{join_code_from_fragment, with_join_code, without_join_code};
pub use session_id::{SESSION_ID_ALPHABET, SESSION_ID_LEN, SessionId};
