use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Which secret signed the token, and so what it may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Registered JWT claims plus the account email and token kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn issue(
        user_id: Uuid,
        email: &str,
        kind: TokenKind,
        issued_at: OffsetDateTime,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let unix = |t: OffsetDateTime| t.unix_timestamp().max(0) as usize;
        Self {
            sub: user_id,
            email: email.to_string(),
            iat: unix(issued_at),
            exp: unix(issued_at + ttl),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            kind,
        }
    }
}
