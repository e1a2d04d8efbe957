use crate::clock;
use crate::error::TokenError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Wire name of the subject claim.
pub const SUBJECT: &str = "sub";
/// Wire name of the role claim.
pub const ROLE: &str = "role";
/// Wire name of the issued-at claim.
pub const ISSUED_AT: &str = "iat";
/// Wire name of the expiry claim.
pub const EXPIRES_AT: &str = "exp";

/// Claim names managed by the codec; custom claims may not use them.
pub const RESERVED: [&str; 4] = [SUBJECT, ROLE, ISSUED_AT, EXPIRES_AT];

/// Claims supplied by a caller before issuance.
///
/// Timestamps are assigned at signing time, so they are absent here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedClaims {
    pub(super) subject: String,
    pub(super) role: String,
    pub(super) custom: BTreeMap<String, Value>,
}

impl UnsignedClaims {
    /// Start building claims.
    #[must_use]
    pub fn builder() -> super::ClaimsBuilder {
        super::ClaimsBuilder::new()
    }

    /// Subject the token is issued to.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Role granted to the subject.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Additional claims, ordered by name.
    #[must_use]
    pub const fn custom(&self) -> &BTreeMap<String, Value> {
        &self.custom
    }
}

/// Claims embedded in an issued token.
///
/// Timestamps carry whole seconds only and `expires_at` is always after
/// `issued_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    subject: String,
    role: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    custom: BTreeMap<String, Value>,
}

impl Claims {
    /// Stamp unsigned claims with an issuance time and lifetime.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClaims` when the lifetime is zero or overflows the
    /// representable time range.
    pub fn issue(
        unsigned: &UnsignedClaims,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let issued_at = clock::truncate(issued_at);
        let expires_at = issued_at
            .checked_add_signed(clock::to_delta(ttl))
            .map(clock::truncate)
            .ok_or_else(|| TokenError::invalid_claims("expiry overflows the time range"))?;

        Self::from_parts(
            unsigned.subject.clone(),
            unsigned.role.clone(),
            issued_at,
            expires_at,
            unsigned.custom.clone(),
        )
    }

    pub(super) fn from_parts(
        subject: String,
        role: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        custom: BTreeMap<String, Value>,
    ) -> Result<Self, TokenError> {
        if expires_at <= issued_at {
            return Err(TokenError::invalid_claims(format!(
                "expiry {expires_at} is not after issuance {issued_at}"
            )));
        }
        Ok(Self {
            subject,
            role,
            issued_at,
            expires_at,
            custom,
        })
    }

    /// Subject the token was issued to.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Role granted to the subject.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Issuance time.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Expiry time.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Additional claims, ordered by name.
    #[must_use]
    pub const fn custom(&self) -> &BTreeMap<String, Value> {
        &self.custom
    }

    /// A single custom claim.
    #[must_use]
    pub fn custom_claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Whether the claims have expired at `now`, allowing `leeway` of skew.
    ///
    /// A token is still valid at exactly `expires_at + leeway`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        self.expires_at
            .checked_add_signed(clock::to_delta(leeway))
            .is_some_and(|deadline| now > deadline)
    }

    /// Drop the timestamps, keeping what the caller originally supplied.
    #[must_use]
    pub fn to_unsigned(&self) -> UnsignedClaims {
        UnsignedClaims {
            subject: self.subject.clone(),
            role: self.role.clone(),
            custom: self.custom.clone(),
        }
    }
}
