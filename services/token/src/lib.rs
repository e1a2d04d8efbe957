//! Token core library.
//!
//! Issues and verifies PASETO (v4.public, v3.local) and JWT (HS256, RS256)
//! tokens from a purpose-pinned key registry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod keys;
pub mod metrics;
pub mod observability;
pub mod service;

// Re-exports for convenience
pub use claims::{Claims, ClaimsBuilder, ClaimsCodec, UnsignedClaims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{AuthFailure, FailureReason, TokenError};
pub use format::{FormatAdapter, Token, TokenFormat};
pub use keys::{AlgorithmFamily, KeyMaterial, KeyRegistry, Purpose, RawKey};
pub use service::{TokenProfile, TokenService, VerificationResult};
