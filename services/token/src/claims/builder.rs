use super::model::{RESERVED, ROLE, SUBJECT, UnsignedClaims};
use crate::error::TokenError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Builder for [`UnsignedClaims`].
#[derive(Debug, Default, Clone)]
pub struct ClaimsBuilder {
    subject: Option<String>,
    role: Option<String>,
    custom: BTreeMap<String, Value>,
}

impl ClaimsBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the role.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Add a custom claim. A later value for the same name wins.
    #[must_use]
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(name.into(), value.into());
        self
    }

    /// Validate and build the claims.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the subject or role is absent or empty, and
    /// `InvalidClaims` if a custom claim uses a reserved name.
    pub fn build(self) -> Result<UnsignedClaims, TokenError> {
        let subject = required(self.subject, SUBJECT)?;
        let role = required(self.role, ROLE)?;

        if let Some(name) = self.custom.keys().find(|name| RESERVED.contains(&name.as_str())) {
            return Err(TokenError::invalid_claims(format!(
                "custom claim {name} uses a reserved name"
            )));
        }

        Ok(UnsignedClaims {
            subject,
            role,
            custom: self.custom,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, TokenError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TokenError::missing_field(field))
}
