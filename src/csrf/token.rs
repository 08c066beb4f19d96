use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use std::time::{Duration, Instant};

/// A freshly issued anti-forgery token.
#[derive(Debug, Clone)]
pub struct CsrfToken {
    /// Opaque random value sent back in the `X-CSRF-Token` header.
    pub value: String,

    /// When the token was issued.
    pub issued_at: Instant,

    /// How long the token stays valid.
    pub ttl: Duration,
}

/// Longest lifetime a token can be given. Longer TTLs are clamped.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

impl CsrfToken {
    /// Generate a token from 32 random bytes.
    pub fn generate(ttl: Duration) -> Self {
        Self::generate_at(ttl, Instant::now())
    }

    /// [`generate`](Self::generate) with an explicit issue time.
    pub fn generate_at(ttl: Duration, issued_at: Instant) -> Self {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        Self {
            value: URL_SAFE_NO_PAD.encode(random_bytes),
            issued_at,
            ttl: ttl.min(MAX_TOKEN_TTL),
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.issued_at
            .checked_add(self.ttl)
            .unwrap_or_else(|| self.issued_at + MAX_TOKEN_TTL)
    }

    pub fn is_expired(&self) -> bool {
        is_past(self.expires_at(), Instant::now())
    }
}

/// Strictly after the deadline counts as expired.
pub(crate) fn is_past(expires_at: Instant, now: Instant) -> bool {
    now > expires_at
}

/// Outcome of [`TokenStore::issue`](crate::csrf::TokenStore::issue).
#[derive(Debug, Clone)]
pub enum TokenIssue {
    /// Tokens are required; send this one with the next mutating request.
    Token(CsrfToken),
    /// The mechanism is off. Omit the header entirely.
    Disabled,
}

impl TokenIssue {
    /// The token value, or `None` when disabled.
    pub fn value(&self) -> Option<&str> {
        match self {
            TokenIssue::Token(t) => Some(&t.value),
            TokenIssue::Disabled => None,
        }
    }
}
