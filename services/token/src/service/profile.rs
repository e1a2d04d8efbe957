use crate::format::TokenFormat;
use crate::keys::Purpose;
use std::time::Duration;

/// Format and lifetime of the tokens issued for a purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenProfile {
    /// Purpose whose key signs or encrypts the tokens
    pub purpose: Purpose,
    /// Format expected for every token of this purpose
    pub format: TokenFormat,
    /// Lifetime of issued tokens
    pub ttl: Duration,
}

impl TokenProfile {
    /// Create a profile.
    #[must_use]
    pub const fn new(purpose: Purpose, format: TokenFormat, ttl: Duration) -> Self {
        Self { purpose, format, ttl }
    }

    /// One profile per built-in purpose, all sharing `ttl`.
    #[must_use]
    pub fn defaults(ttl: Duration) -> [Self; 4] {
        [
            Self::new(Purpose::PUBLIC_SIGNING, TokenFormat::PasetoV4Public, ttl),
            Self::new(Purpose::LOCAL_ENCRYPTION, TokenFormat::PasetoV3Local, ttl),
            Self::new(Purpose::JWT_RSA, TokenFormat::JwtRs256, ttl),
            Self::new(Purpose::JWT_HMAC, TokenFormat::JwtHs256, ttl),
        ]
    }
}
