//! Filesystem key loading.
//!
//! Reads the deployment's key files and registers them under the default
//! purposes. The shared secret backs two purposes (AEAD and HMAC) and is
//! registered once per family so neither purpose can be used as the other.

use super::material::{AlgorithmFamily, RawKey};
use super::registry::{KeyRegistry, Purpose};
use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Default file names inside the key directory.
pub const ED25519_PRIVATE_FILE: &str = "privateED.pem";
/// Ed25519 public key file name.
pub const ED25519_PUBLIC_FILE: &str = "publicED.pem";
/// Base64 shared secret file name.
pub const SECRET_FILE: &str = "secret.b64";
/// RSA private key file name.
pub const RSA_PRIVATE_FILE: &str = "privateRSA.pem";
/// RSA public key file name.
pub const RSA_PUBLIC_FILE: &str = "publicRSA.pem";

/// Locations of every key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    /// Ed25519 PKCS#8 private key
    pub ed25519_private: PathBuf,
    /// Ed25519 SPKI public key
    pub ed25519_public: PathBuf,
    /// Base64-encoded 32-byte secret
    pub secret: PathBuf,
    /// RSA private key
    pub rsa_private: PathBuf,
    /// RSA public key
    pub rsa_public: PathBuf,
}

impl KeyPaths {
    /// Default file names under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            ed25519_private: dir.join(ED25519_PRIVATE_FILE),
            ed25519_public: dir.join(ED25519_PUBLIC_FILE),
            secret: dir.join(SECRET_FILE),
            rsa_private: dir.join(RSA_PRIVATE_FILE),
            rsa_public: dir.join(RSA_PUBLIC_FILE),
        }
    }
}

/// Read every key file and build a registry with the four default purposes.
///
/// # Errors
///
/// Returns `Config` if a file cannot be read and `KeyFormat` if its
/// contents are not a valid key.
pub fn load_registry(paths: &KeyPaths) -> Result<KeyRegistry, TokenError> {
    let mut registry = KeyRegistry::new();

    registry.register(
        Purpose::PUBLIC_SIGNING,
        AlgorithmFamily::EdDsa,
        RawKey::KeyPair {
            public: read(&paths.ed25519_public)?,
            private: Some(read(&paths.ed25519_private)?),
        },
    )?;

    let secret = read_secret(&paths.secret)?;
    registry.register(
        Purpose::LOCAL_ENCRYPTION,
        AlgorithmFamily::AeadSymmetric,
        RawKey::Secret(secret.to_vec()),
    )?;
    registry.register(
        Purpose::JWT_HMAC,
        AlgorithmFamily::Hmac,
        RawKey::Secret(secret.to_vec()),
    )?;

    registry.register(
        Purpose::JWT_RSA,
        AlgorithmFamily::Rsa,
        RawKey::KeyPair {
            public: read(&paths.rsa_public)?,
            private: Some(read(&paths.rsa_private)?),
        },
    )?;

    info!(keys = registry.len(), "Key registry loaded");
    Ok(registry)
}

fn read(path: &Path) -> Result<Vec<u8>, TokenError> {
    debug!(path = %path.display(), "Reading key file");
    fs::read(path).map_err(|e| TokenError::config(format!("cannot read {}: {e}", path.display())))
}

/// Decode a base64 secret file, ignoring surrounding whitespace.
fn read_secret(path: &Path) -> Result<Zeroizing<Vec<u8>>, TokenError> {
    let encoded = Zeroizing::new(read(path)?);
    let trimmed = encoded.trim_ascii();
    STANDARD
        .decode(trimmed)
        .map(Zeroizing::new)
        .map_err(|e| TokenError::key_format(format!("{} is not base64: {e}", path.display())))
}
