//! Short human-checkable session identifiers.

use std::fmt;

use rand::Rng;

use crate::SignalError;

/// Number of characters in a session id.
pub const SESSION_ID_LEN: usize = 6;

/// Characters used for generated ids: upper-case letters and digits
/// without the easily confused `0`/`O` and `1`/`I`/`L`.
pub const SESSION_ID_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Identifies one session. Generated once by the host and carried as the
/// prefix of every connection code so users can check they are pasting
/// into the right session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random id from [`SESSION_ID_ALPHABET`].
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..SESSION_ID_LEN)
            .map(|_| {
                let idx = rng.random_range(0..SESSION_ID_ALPHABET.len());
                char::from(SESSION_ID_ALPHABET[idx])
            })
            .collect();
        Self(id)
    }

    /// Accepts any id of exactly [`SESSION_ID_LEN`] characters that can
    /// sit in front of the code separator.
    ///
    /// Ids generated by other peers are not required to use
    /// [`SESSION_ID_ALPHABET`].
    ///
    /// # Errors
    /// Returns [`SignalError::InvalidSessionId`] for a wrong length or an
    /// id containing `:` or whitespace.
    pub fn parse(id: &str) -> Result<Self, SignalError> {
        let well_formed = id.chars().count() == SESSION_ID_LEN
            && !id.chars().any(|c| c == ':' || c.is_whitespace());
        if !well_formed {
            return Err(SignalError::InvalidSessionId(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
