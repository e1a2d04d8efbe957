//! Purpose-addressed key registry.
//!
//! Populated once at startup through `&mut` access, then shared read-only
//! (typically behind an `Arc`). Keys are addressed by purpose and algorithm
//! family; a key only ever serves the family it was registered under.

use super::material::{AlgorithmFamily, KeyMaterial, RawKey};
use crate::error::TokenError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Intended use of a key, e.g. `public-signing`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Purpose(Cow<'static, str>);

impl Purpose {
    /// Ed25519-signed PASETO tokens.
    pub const PUBLIC_SIGNING: Self = Self::from_static("public-signing");
    /// Encrypted PASETO tokens.
    pub const LOCAL_ENCRYPTION: Self = Self::from_static("local-encryption");
    /// RSA-signed JWTs.
    pub const JWT_RSA: Self = Self::from_static("jwt-rsa");
    /// HMAC-signed JWTs.
    pub const JWT_HMAC: Self = Self::from_static("jwt-hmac");

    /// Create a purpose from a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a purpose from an owned name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Purpose name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of key material keyed by purpose.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: HashMap<(Purpose, AlgorithmFamily), KeyMaterial>,
}

impl KeyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register key material under `(purpose, family)`.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormat` if the bytes are not a key of `family`, or
    /// `DuplicateKey` if the pair already has a key.
    pub fn register(
        &mut self,
        purpose: Purpose,
        family: AlgorithmFamily,
        raw: RawKey,
    ) -> Result<(), TokenError> {
        let slot = (purpose, family);
        if self.keys.contains_key(&slot) {
            return Err(TokenError::DuplicateKey {
                purpose: format!("{}/{family}", slot.0),
            });
        }

        let material = KeyMaterial::from_raw(family, raw)?;
        info!(
            purpose = %slot.0,
            family = %family,
            can_sign = material.can_sign(),
            "Registered key"
        );
        self.keys.insert(slot, material);
        Ok(())
    }

    /// Key material registered for `(purpose, family)`.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if no key matches both.
    pub fn lookup(
        &self,
        purpose: &Purpose,
        family: AlgorithmFamily,
    ) -> Result<&KeyMaterial, TokenError> {
        self.keys
            .get(&(purpose.clone(), family))
            .ok_or_else(|| TokenError::key_not_found(format_args!("{purpose}/{family}")))
    }

    /// Families registered for a purpose.
    pub fn families_of<'a>(
        &'a self,
        purpose: &'a Purpose,
    ) -> impl Iterator<Item = AlgorithmFamily> + 'a {
        self.keys
            .keys()
            .filter(move |(registered, _)| registered == purpose)
            .map(|(_, family)| *family)
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(byte: u8) -> RawKey {
        RawKey::Secret(vec![byte; 32])
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = KeyRegistry::new();
        registry
            .register(Purpose::JWT_HMAC, AlgorithmFamily::Hmac, secret(1))
            .unwrap();

        let material = registry.lookup(&Purpose::JWT_HMAC, AlgorithmFamily::Hmac).unwrap();
        assert_eq!(material.family(), AlgorithmFamily::Hmac);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unknown_purpose() {
        let registry = KeyRegistry::new();
        let err = registry
            .lookup(&Purpose::new("billing"), AlgorithmFamily::Hmac)
            .unwrap_err();
        assert!(matches!(err, TokenError::KeyNotFound { ref purpose } if purpose == "billing/HMAC"));
    }

    #[test]
    fn test_lookup_with_other_family_not_found() {
        let mut registry = KeyRegistry::new();
        registry
            .register(Purpose::LOCAL_ENCRYPTION, AlgorithmFamily::AeadSymmetric, secret(2))
            .unwrap();

        let err = registry
            .lookup(&Purpose::LOCAL_ENCRYPTION, AlgorithmFamily::Hmac)
            .unwrap_err();
        assert!(matches!(err, TokenError::KeyNotFound { .. }));
    }

    #[test]
    fn test_one_purpose_several_families() {
        let mut registry = KeyRegistry::new();
        let purpose = Purpose::new("svc");
        registry
            .register(purpose.clone(), AlgorithmFamily::Hmac, secret(1))
            .unwrap();
        registry
            .register(purpose.clone(), AlgorithmFamily::AeadSymmetric, secret(3))
            .unwrap();

        let hmac = registry.lookup(&purpose, AlgorithmFamily::Hmac).unwrap();
        let aead = registry.lookup(&purpose, AlgorithmFamily::AeadSymmetric).unwrap();
        assert_eq!(hmac.family(), AlgorithmFamily::Hmac);
        assert_eq!(aead.family(), AlgorithmFamily::AeadSymmetric);

        let mut families: Vec<_> = registry.families_of(&purpose).collect();
        families.sort_by_key(AlgorithmFamily::as_str);
        assert_eq!(families, vec![AlgorithmFamily::AeadSymmetric, AlgorithmFamily::Hmac]);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let mut registry = KeyRegistry::new();
        registry
            .register(Purpose::JWT_HMAC, AlgorithmFamily::Hmac, secret(1))
            .unwrap();

        let err = registry
            .register(Purpose::JWT_HMAC, AlgorithmFamily::Hmac, secret(3))
            .unwrap_err();
        assert!(matches!(err, TokenError::DuplicateKey { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_failed_registration_leaves_registry_unchanged() {
        let mut registry = KeyRegistry::new();
        let raw = RawKey::KeyPair {
            public: b"not a key".to_vec(),
            private: None,
        };

        assert!(registry
            .register(Purpose::PUBLIC_SIGNING, AlgorithmFamily::EdDsa, raw)
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_purpose_equality_across_constructors() {
        assert_eq!(Purpose::new("jwt-rsa"), Purpose::JWT_RSA);
        assert_eq!(Purpose::JWT_RSA.to_string(), "jwt-rsa");
    }
}
