//! Error taxonomy for token issuance and verification.
//!
//! Adapters and the codec raise [`TokenError`]. The orchestration layer turns
//! verification errors into [`FailureReason`] values, and the transport
//! boundary only ever sees the uniform [`AuthFailure`].

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors raised by the registry, codec, adapters and configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TokenError {
    /// No key is registered for the purpose
    #[error("No key registered for purpose {purpose}")]
    KeyNotFound {
        /// Purpose that was looked up
        purpose: String,
    },

    /// Key material does not match its declared algorithm family
    #[error("Invalid key material: {reason}")]
    KeyFormat {
        /// Why the material was rejected
        reason: String,
    },

    /// A key is already pinned to the purpose
    #[error("Purpose {purpose} already has a registered key")]
    DuplicateKey {
        /// Purpose that was registered twice
        purpose: String,
    },

    /// A required claim is absent
    #[error("Required claim missing: {field}")]
    MissingField {
        /// Wire name of the missing claim
        field: String,
    },

    /// Claims violate an invariant (reserved names, expiry before issuance)
    #[error("Invalid claims: {reason}")]
    InvalidClaims {
        /// Description of the violation
        reason: String,
    },

    /// Token structure could not be parsed
    #[error("Token malformed: {reason}")]
    Malformed {
        /// Description of the malformation
        reason: String,
    },

    /// Signature or authentication tag did not verify
    #[error("Token signature invalid")]
    Tampered,

    /// Token lifetime has elapsed
    #[error("Token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },

    /// Token or key belongs to another algorithm than expected
    #[error("Algorithm mismatch: expected {expected}, got {actual}")]
    AlgorithmMismatch {
        /// Algorithm the caller expected
        expected: String,
        /// Algorithm declared by the token or key
        actual: String,
    },

    /// Payload could not be decoded into claims
    #[error("Claims decoding failed: {reason}")]
    Decode {
        /// Description of the decoding failure
        reason: String,
    },

    /// A cryptographic primitive failed while producing a token
    #[error("Signing failed: {reason}")]
    Signing {
        /// Description of the failure
        reason: String,
    },

    /// Configuration is missing or invalid
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of the problem
        reason: String,
    },
}

impl TokenError {
    /// Create a key format error.
    #[must_use]
    pub fn key_format(reason: impl Into<String>) -> Self {
        Self::KeyFormat { reason: reason.into() }
    }

    /// Create a key not found error.
    #[must_use]
    pub fn key_not_found(purpose: impl fmt::Display) -> Self {
        Self::KeyNotFound { purpose: purpose.to_string() }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    /// Create an invalid claims error.
    #[must_use]
    pub fn invalid_claims(reason: impl Into<String>) -> Self {
        Self::InvalidClaims { reason: reason.into() }
    }

    /// Create a malformed token error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed { reason: reason.into() }
    }

    /// Create an algorithm mismatch error.
    #[must_use]
    pub fn algorithm_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::AlgorithmMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode { reason: reason.into() }
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Signing { reason: reason.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    /// Stable code for logs and metrics, one per variant.
    ///
    /// Unlike [`TokenError::failure_reason`], which folds errors into the
    /// verification taxonomy, this keeps issuance failures such as
    /// `Signing` and `InvalidClaims` apart.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound { .. } => "TOKEN_KEY_NOT_FOUND",
            Self::KeyFormat { .. } => "TOKEN_KEY_FORMAT",
            Self::DuplicateKey { .. } => "TOKEN_DUPLICATE_KEY",
            Self::MissingField { .. } => "TOKEN_MISSING_FIELD",
            Self::InvalidClaims { .. } => "TOKEN_INVALID_CLAIMS",
            Self::Malformed { .. } => "TOKEN_MALFORMED",
            Self::Tampered => "TOKEN_TAMPERED",
            Self::Expired { .. } => "TOKEN_EXPIRED",
            Self::AlgorithmMismatch { .. } => "TOKEN_ALGORITHM_MISMATCH",
            Self::Decode { .. } => "TOKEN_DECODE",
            Self::Signing { .. } => "TOKEN_SIGNING",
            Self::Config { .. } => "TOKEN_CONFIG",
        }
    }

    /// Reason reported when this error ends a verification.
    #[must_use]
    pub const fn failure_reason(&self) -> FailureReason {
        match self {
            Self::KeyNotFound { .. } => FailureReason::KeyNotFound,
            Self::KeyFormat { .. }
            | Self::DuplicateKey { .. }
            | Self::Signing { .. }
            | Self::Config { .. } => FailureReason::KeyFormat,
            Self::MissingField { .. } => FailureReason::MissingField,
            Self::Malformed { .. } => FailureReason::Malformed,
            Self::Tampered => FailureReason::Tampered,
            Self::Expired { .. } => FailureReason::Expired,
            Self::AlgorithmMismatch { .. } => FailureReason::AlgorithmMismatch,
            Self::Decode { .. } | Self::InvalidClaims { .. } => FailureReason::Decode,
        }
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(err: base64::DecodeError) -> Self {
        Self::malformed(format!("invalid base64url segment: {err}"))
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<pem::PemError> for TokenError {
    fn from(err: pem::PemError) -> Self {
        Self::key_format(format!("invalid PEM: {err}"))
    }
}

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// No key for the purpose
    KeyNotFound,
    /// Registered key unusable for the operation
    KeyFormat,
    /// Required claim absent
    MissingField,
    /// Structural parse failure
    Malformed,
    /// Integrity check failed
    Tampered,
    /// Lifetime elapsed
    Expired,
    /// Token declares a different algorithm
    AlgorithmMismatch,
    /// Payload not decodable
    Decode,
}

impl FailureReason {
    /// Stable code used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "TOKEN_KEY_NOT_FOUND",
            Self::KeyFormat => "TOKEN_KEY_FORMAT",
            Self::MissingField => "TOKEN_MISSING_FIELD",
            Self::Malformed => "TOKEN_MALFORMED",
            Self::Tampered => "TOKEN_TAMPERED",
            Self::Expired => "TOKEN_EXPIRED",
            Self::AlgorithmMismatch => "TOKEN_ALGORITHM_MISMATCH",
            Self::Decode => "TOKEN_DECODE",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform authentication failure exposed to transports.
///
/// Carries no reason: every verification failure renders identically so
/// callers cannot be used as an oracle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unauthorized")]
pub struct AuthFailure;

impl AuthFailure {
    /// Error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        AUTH_TOKEN_INVALID
    }
}

/// Error code for transport responses.
pub const AUTH_TOKEN_INVALID: &str = "AUTH_TOKEN_INVALID";
