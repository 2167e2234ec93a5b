//! Request tokens and their issuer.

use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Length of every issued token, in characters.
pub const TOKEN_LEN: usize = 36;

/// Base58 alphabet: alphanumerics without `0`, `O`, `I` and `l`.
const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Largest multiple of the alphabet size that fits in a byte.
/// Bytes at or above this are discarded to avoid modulo bias.
const ACCEPT_BELOW: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Longest token accepted from clients on lookup.
const MAX_LOOKUP_LEN: usize = 128;

/// Error returned when a string cannot be a request token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request token: {reason}")]
pub struct InvalidToken {
    reason: &'static str,
}

/// Error returned when the entropy source fails while issuing a token.
#[derive(Debug, thiserror::Error)]
#[error("token entropy source failed: {0}")]
pub struct TokenError(#[from] rand::Error);

/// Opaque identifier correlating a submission with its outcome.
///
/// Tokens are the only key used to look requests up. They are immutable
/// once issued.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(String);

impl RequestToken {
    /// Parse a token received from a client.
    ///
    /// Any non-empty string of URI-safe characters (`A-Z a-z 0-9 - _`) is
    /// accepted, so tokens issued under a different alphabet still resolve.
    pub fn parse(s: &str) -> Result<Self, InvalidToken> {
        if s.is_empty() {
            return Err(InvalidToken {
                reason: "must not be empty",
            });
        }
        if s.len() > MAX_LOOKUP_LEN {
            return Err(InvalidToken {
                reason: "too long",
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(InvalidToken {
                reason: "must be URI-safe characters",
            });
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestToken({})", self.0)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source of random bytes for token generation.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), rand::Error>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(buf)
    }
}

/// Issues fresh request tokens.
///
/// Each token is [`TOKEN_LEN`] base58 characters (about 210 bits of
/// entropy), drawn by rejection sampling so every character is uniform.
#[derive(Clone)]
pub struct TokenIssuer {
    source: Arc<dyn EntropySource>,
}

impl TokenIssuer {
    /// Create an issuer backed by the operating system's CSPRNG.
    pub fn new() -> Self {
        Self::with_source(OsEntropy)
    }

    /// Create an issuer backed by a custom entropy source.
    pub fn with_source(source: impl EntropySource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Issue a new token.
    ///
    /// Fails only if the entropy source does; the failure is not retried.
    pub fn issue(&self) -> Result<RequestToken, TokenError> {
        let mut token = String::with_capacity(TOKEN_LEN);
        let mut buf = [0u8; 64];

        while token.len() < TOKEN_LEN {
            self.source.fill(&mut buf)?;
            for &b in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
                if token.len() == TOKEN_LEN {
                    break;
                }
                token.push(ALPHABET[usize::from(b) % ALPHABET.len()] as char);
            }
        }

        Ok(RequestToken(token))
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}
