//! Issuance and validation orchestration.
//!
//! The service resolves a purpose to its profile, fetches the purpose's key
//! from the registry with the family the profile's format demands, and hands
//! both to the format adapter. The token itself never chooses the adapter.

mod profile;
mod result;

pub use profile::TokenProfile;
pub use result::VerificationResult;

use crate::claims::{Claims, UnsignedClaims};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, MAX_CLOCK_LEEWAY};
use crate::error::{AuthFailure, TokenError};
use crate::format::Token;
use crate::keys::{KeyRegistry, Purpose};
use crate::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Span, debug, field, info, instrument, warn};

const UNKNOWN_FORMAT: &str = "unknown";

/// Token issuance and validation over a shared key registry.
///
/// Holds no mutable state, so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct TokenService {
    registry: Arc<KeyRegistry>,
    profiles: HashMap<Purpose, TokenProfile>,
    clock: Arc<dyn Clock>,
    leeway: Duration,
}

impl TokenService {
    /// Create a service with no profiles, the system clock and no leeway.
    #[must_use]
    pub fn new(registry: Arc<KeyRegistry>) -> Self {
        Self {
            registry,
            profiles: HashMap::new(),
            clock: Arc::new(SystemClock),
            leeway: Duration::ZERO,
        }
    }

    /// Build a service from configuration and check every profile against
    /// the registry.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`TokenService::check_profiles`].
    pub fn from_config(config: &Config, registry: Arc<KeyRegistry>) -> Result<Self, TokenError> {
        let service = Self::new(registry)
            .with_profiles(config.profiles())
            .with_leeway(config.clock_leeway);
        service.check_profiles()?;
        Ok(service)
    }

    /// Add or replace a profile.
    #[must_use]
    pub fn with_profile(mut self, profile: TokenProfile) -> Self {
        self.profiles.insert(profile.purpose.clone(), profile);
        self
    }

    /// Add or replace several profiles.
    #[must_use]
    pub fn with_profiles(self, profiles: impl IntoIterator<Item = TokenProfile>) -> Self {
        profiles.into_iter().fold(self, Self::with_profile)
    }

    /// Use another time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Tolerate clock skew past expiry, capped at [`MAX_CLOCK_LEEWAY`].
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        if leeway > MAX_CLOCK_LEEWAY {
            warn!(
                requested_secs = leeway.as_secs(),
                max_secs = MAX_CLOCK_LEEWAY.as_secs(),
                "Clock leeway capped"
            );
        }
        self.leeway = leeway.min(MAX_CLOCK_LEEWAY);
        self
    }

    /// Profile registered for a purpose.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the purpose has no profile.
    pub fn profile(&self, purpose: &Purpose) -> Result<&TokenProfile, TokenError> {
        self.profiles
            .get(purpose)
            .ok_or_else(|| TokenError::key_not_found(purpose))
    }

    /// Check that every profile has a key of the family its format needs.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` for the first profile without a key of its
    /// format's family.
    pub fn check_profiles(&self) -> Result<(), TokenError> {
        for profile in self.profiles.values() {
            self.registry
                .lookup(&profile.purpose, profile.format.family())?;
        }
        info!(profiles = self.profiles.len(), "Token profiles checked");
        Ok(())
    }

    /// Issue a token for `purpose`.
    ///
    /// Issuance failures point at misconfiguration, not attacker input, so
    /// they are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound`, `KeyFormat`, `Signing` or `InvalidClaims`.
    pub fn issue(&self, claims: &UnsignedClaims, purpose: &Purpose) -> Result<Token, TokenError> {
        self.issue_claims(claims, purpose).map(|(token, _)| token)
    }

    /// Issue a token and also return the claims embedded in it.
    ///
    /// # Errors
    ///
    /// Same as [`TokenService::issue`].
    #[instrument(skip(self, claims), fields(purpose = %purpose, format = field::Empty))]
    pub fn issue_claims(
        &self,
        claims: &UnsignedClaims,
        purpose: &Purpose,
    ) -> Result<(Token, Claims), TokenError> {
        let started = Instant::now();
        let result = self.try_issue(claims, purpose);

        match &result {
            Ok((token, issued)) => {
                let format = token.format().as_str();
                metrics::record_token_issued(format, purpose.as_str());
                metrics::record_latency("issue", format, started.elapsed().as_secs_f64());
                debug!(expires_at = %issued.expires_at(), "Token issued");
            }
            Err(e) => {
                metrics::record_issue_failure(purpose.as_str(), e.code());
                warn!(error = %e, "Token issuance failed");
            }
        }
        result
    }

    fn try_issue(
        &self,
        claims: &UnsignedClaims,
        purpose: &Purpose,
    ) -> Result<(Token, Claims), TokenError> {
        let profile = self.profile(purpose)?;
        Span::current().record("format", profile.format.as_str());

        let adapter = profile.format.adapter();
        let key = self.registry.lookup(purpose, adapter.family())?;
        adapter.sign(claims, key, profile.ttl, self.clock.now())
    }

    /// Validate a token expected to belong to `purpose`.
    ///
    /// Never fails: every problem becomes [`VerificationResult::Invalid`].
    ///
    /// # Timing
    ///
    /// Results are uniform but latency is not. Tokens rejected on shape
    /// (segment count, header, unknown purpose) return before any
    /// cryptography runs, so a caller timing responses can tell a structural
    /// rejection from a failed signature or tag. That only reveals what the
    /// caller already sent. Signature and tag comparisons are constant time,
    /// so a forged token leaks nothing about the expected value.
    #[instrument(skip(self, token), fields(purpose = %purpose, format = field::Empty))]
    pub fn validate(&self, token: &str, purpose: &Purpose) -> VerificationResult {
        let started = Instant::now();
        let format = self
            .profiles
            .get(purpose)
            .map_or(UNKNOWN_FORMAT, |profile| profile.format.as_str());
        Span::current().record("format", format);

        let result = match self.try_validate(token, purpose) {
            Ok(claims) => {
                metrics::record_validation(format, metrics::OUTCOME_VALID);
                VerificationResult::Valid(claims)
            }
            Err(e) => {
                let reason = e.failure_reason();
                metrics::record_validation(format, reason.as_str());
                debug!(reason = %reason, error = %e, "Token rejected");
                VerificationResult::Invalid(reason)
            }
        };

        metrics::record_latency("validate", format, started.elapsed().as_secs_f64());
        result
    }

    fn try_validate(&self, token: &str, purpose: &Purpose) -> Result<Claims, TokenError> {
        let profile = self.profile(purpose)?;
        let adapter = profile.format.adapter();
        let key = self.registry.lookup(purpose, adapter.family())?;
        adapter.verify(token, key, self.clock.now(), self.leeway)
    }

    /// Validate and collapse every failure into the uniform [`AuthFailure`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthFailure`] whenever the token is not valid.
    pub fn authenticate(&self, token: &str, purpose: &Purpose) -> Result<Claims, AuthFailure> {
        self.validate(token, purpose).into_result()
    }
}
