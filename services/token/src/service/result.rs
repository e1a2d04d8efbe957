use crate::claims::Claims;
use crate::error::{AuthFailure, FailureReason};

/// Outcome of validating a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// Token verified; claims are trustworthy
    Valid(Claims),
    /// Token rejected, with the internal reason
    Invalid(FailureReason),
}

impl VerificationResult {
    /// Whether the token verified.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Verified claims, if any.
    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Valid(claims) => Some(claims),
            Self::Invalid(_) => None,
        }
    }

    /// Failure reason, if rejected.
    #[must_use]
    pub const fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }

    /// Collapse into the uniform transport-facing result.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFailure`] for every rejected token, whatever the reason.
    pub fn into_result(self) -> Result<Claims, AuthFailure> {
        match self {
            Self::Valid(claims) => Ok(claims),
            Self::Invalid(_) => Err(AuthFailure),
        }
    }
}
