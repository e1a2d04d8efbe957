//! Token formats behind a single adapter interface.
//!
//! Each [`TokenFormat`] maps to exactly one adapter and one key family.
//! Adapters only move bytes in and out of the wire form ([`FormatAdapter::seal`]
//! and [`FormatAdapter::open`]); stamping, claim encoding and expiry checks are
//! shared by every format through the provided [`FormatAdapter::sign`] and
//! [`FormatAdapter::verify`] methods.

mod jwt;
mod paseto;
mod paseto_local;
mod paseto_public;

pub use jwt::{HmacJwt, RsaJwt};
pub use paseto_local::PasetoLocal;
pub use paseto_public::PasetoPublic;

use crate::claims::{Claims, ClaimsCodec, UnsignedClaims};
use crate::error::TokenError;
use crate::keys::{AlgorithmFamily, KeyMaterial};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Wire format of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFormat {
    /// PASETO v4.public: Ed25519 signature, readable payload
    PasetoV4Public,
    /// PASETO v3.local: encrypted and authenticated payload
    PasetoV3Local,
    /// JWT signed with HMAC-SHA256
    JwtHs256,
    /// JWT signed with RSASSA-PKCS1-v1_5 SHA-256
    JwtRs256,
}

impl TokenFormat {
    /// Every supported format.
    pub const ALL: [Self; 4] = [
        Self::PasetoV4Public,
        Self::PasetoV3Local,
        Self::JwtHs256,
        Self::JwtRs256,
    ];

    /// Format identifier: the PASETO header or the JWT `alg` value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PasetoV4Public => "v4.public",
            Self::PasetoV3Local => "v3.local",
            Self::JwtHs256 => "HS256",
            Self::JwtRs256 => "RS256",
        }
    }

    /// Key family this format requires.
    #[must_use]
    pub const fn family(&self) -> AlgorithmFamily {
        match self {
            Self::PasetoV4Public => AlgorithmFamily::EdDsa,
            Self::PasetoV3Local => AlgorithmFamily::AeadSymmetric,
            Self::JwtHs256 => AlgorithmFamily::Hmac,
            Self::JwtRs256 => AlgorithmFamily::Rsa,
        }
    }

    /// Whether claims are readable without the key.
    #[must_use]
    pub const fn is_confidential(&self) -> bool {
        matches!(self, Self::PasetoV3Local)
    }

    /// Adapter implementing this format.
    #[must_use]
    pub fn adapter(&self) -> &'static dyn FormatAdapter {
        match self {
            Self::PasetoV4Public => &PasetoPublic,
            Self::PasetoV3Local => &PasetoLocal,
            Self::JwtHs256 => &HmacJwt,
            Self::JwtRs256 => &RsaJwt,
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenFormat {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TokenError::config(format!("Unknown token format: {s}")))
    }
}

/// An issued token string and the format it was produced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    format: TokenFormat,
}

impl Token {
    pub(crate) const fn new(value: String, format: TokenFormat) -> Self {
        Self { value, format }
    }

    /// Token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Format the token was produced in.
    #[must_use]
    pub const fn format(&self) -> TokenFormat {
        self.format
    }

    /// Take the token string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Per-format encoding rules.
pub trait FormatAdapter: Send + Sync {
    /// Format produced and accepted by this adapter.
    fn format(&self) -> TokenFormat;

    /// Key family this adapter requires.
    fn family(&self) -> AlgorithmFamily {
        self.format().family()
    }

    /// Protect payload bytes under `key` and render the token string.
    ///
    /// # Errors
    ///
    /// Returns `AlgorithmMismatch` for a key of another family, `KeyFormat`
    /// when the key cannot sign, or `Signing` if a primitive fails.
    fn seal(&self, payload: &[u8], key: &KeyMaterial) -> Result<String, TokenError>;

    /// Parse a token string, check its integrity under `key` and return the
    /// payload bytes.
    ///
    /// # Errors
    ///
    /// Returns `Malformed`, `AlgorithmMismatch` or `Tampered`.
    fn open(&self, token: &str, key: &KeyMaterial) -> Result<Vec<u8>, TokenError>;

    /// Payload bytes of a token without any integrity check.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` for unparseable tokens and `Decode` when the
    /// payload is encrypted.
    fn unverified_payload(&self, token: &str) -> Result<Vec<u8>, TokenError>;

    /// Stamp claims at `now`, encode them and seal the token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClaims` for an unusable ttl, otherwise any error of
    /// [`FormatAdapter::seal`].
    fn sign(
        &self,
        claims: &UnsignedClaims,
        key: &KeyMaterial,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(Token, Claims), TokenError> {
        let claims = Claims::issue(claims, now, ttl)?;
        let payload = ClaimsCodec::encode(&claims, self.format())?;
        let token = self.seal(&payload, key)?;
        Ok((Token::new(token, self.format()), claims))
    }

    /// Open a token, decode its claims and check expiry at `now`.
    ///
    /// # Errors
    ///
    /// Returns any error of [`FormatAdapter::open`] or
    /// [`ClaimsCodec::decode`], or `Expired` once `now` is past the expiry
    /// plus `leeway`.
    fn verify(
        &self,
        token: &str,
        key: &KeyMaterial,
        now: DateTime<Utc>,
        leeway: Duration,
    ) -> Result<Claims, TokenError> {
        let payload = self.open(token, key)?;
        let claims = ClaimsCodec::decode(&payload, self.format())?;
        if claims.is_expired_at(now, leeway) {
            return Err(TokenError::Expired {
                expired_at: claims.expires_at(),
            });
        }
        Ok(claims)
    }
}
