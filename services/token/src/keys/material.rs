//! Typed key material and its parsing from raw bytes.

use crate::error::TokenError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use ring::signature::{Ed25519KeyPair, KeyPair, RsaKeyPair};
use rsa::RsaPublicKey;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use std::fmt;
use zeroize::Zeroizing;

/// DER prefix of an Ed25519 SubjectPublicKeyInfo (RFC 8410).
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
const ED25519_PUBLIC_KEY_LEN: usize = 32;
const ED25519_SEED_LEN: usize = 32;
/// Seed || public point, the signing form PASETO v4 expects.
pub const ED25519_KEYPAIR_LEN: usize = ED25519_SEED_LEN + ED25519_PUBLIC_KEY_LEN;
/// `OCTET STRING { OCTET STRING (32) }` holding the seed in Ed25519 PKCS#8
/// (v1 and v2 share the offset).
const ED25519_SEED_HEADER: [u8; 4] = [0x04, 0x22, 0x04, 0x20];
const ED25519_SEED_OFFSET: usize = 16;
const MIN_RSA_MODULUS_BITS: usize = 2048;

/// AEAD secrets are exactly this long.
pub const AEAD_KEY_LEN: usize = 32;
/// HMAC secrets must be at least as long as the SHA-256 output.
pub const MIN_HMAC_KEY_LEN: usize = 32;

const PAIR_CHECK_MESSAGE: &[u8] = b"token-core key pair check";

/// Algorithm family a key is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Ed25519 signatures
    EdDsa,
    /// RSA PKCS#1 v1.5 signatures
    Rsa,
    /// HMAC-SHA256
    Hmac,
    /// Authenticated symmetric encryption
    AeadSymmetric,
}

impl AlgorithmFamily {
    /// Family name for logs and errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EdDsa => "EdDSA",
            Self::Rsa => "RSA",
            Self::Hmac => "HMAC",
            Self::AeadSymmetric => "AEAD",
        }
    }

    /// Whether keys of this family are a single shared secret.
    #[must_use]
    pub const fn is_symmetric(&self) -> bool {
        matches!(self, Self::Hmac | Self::AeadSymmetric)
    }
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw key bytes as handed over by a loader.
///
/// Asymmetric halves may be PEM, DER, or (Ed25519 public keys only) the raw
/// 32-byte point.
#[derive(Clone)]
pub enum RawKey {
    /// Shared secret bytes
    Secret(Vec<u8>),
    /// Public half with an optional private half
    KeyPair {
        /// Public key bytes
        public: Vec<u8>,
        /// Private key bytes; absent for verify-only deployments
        private: Option<Vec<u8>>,
    },
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(bytes) => write!(f, "RawKey::Secret({} bytes)", bytes.len()),
            Self::KeyPair { public, private } => write!(
                f,
                "RawKey::KeyPair {{ public: {} bytes, private: {} }}",
                public.len(),
                if private.is_some() { "present" } else { "absent" }
            ),
        }
    }
}

/// Public half of an asymmetric key.
pub enum PublicKey {
    /// Raw Ed25519 point
    Ed25519([u8; ED25519_PUBLIC_KEY_LEN]),
    /// RSA verification key
    Rsa(DecodingKey),
}

/// Private half of an asymmetric key.
pub enum PrivateKey {
    /// Ed25519 seed followed by the public point
    Ed25519(Zeroizing<[u8; ED25519_KEYPAIR_LEN]>),
    /// RSA signing key
    Rsa(EncodingKey),
}

/// Key material held by the registry for the life of the process.
pub enum KeyMaterial {
    /// Shared secret for HMAC or AEAD formats
    SymmetricSecret {
        /// Family the secret is pinned to
        family: AlgorithmFamily,
        /// Secret bytes, wiped on drop
        secret: Zeroizing<Vec<u8>>,
    },
    /// Public/private pair for signature formats
    AsymmetricKeyPair {
        /// Verification half
        public: PublicKey,
        /// Signing half, if this process signs
        private: Option<PrivateKey>,
    },
}

impl KeyMaterial {
    /// Parse raw bytes into material of the declared family.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormat` when the bytes do not hold a key of `family`.
    pub fn from_raw(family: AlgorithmFamily, raw: RawKey) -> Result<Self, TokenError> {
        match (family, raw) {
            (AlgorithmFamily::AeadSymmetric, RawKey::Secret(bytes)) => {
                if bytes.len() != AEAD_KEY_LEN {
                    return Err(TokenError::key_format(format!(
                        "AEAD secret must be {AEAD_KEY_LEN} bytes, got {}",
                        bytes.len()
                    )));
                }
                Ok(Self::symmetric(family, bytes))
            }
            (AlgorithmFamily::Hmac, RawKey::Secret(bytes)) => {
                if bytes.len() < MIN_HMAC_KEY_LEN {
                    return Err(TokenError::key_format(format!(
                        "HMAC secret must be at least {MIN_HMAC_KEY_LEN} bytes, got {}",
                        bytes.len()
                    )));
                }
                Ok(Self::symmetric(family, bytes))
            }
            (AlgorithmFamily::EdDsa, RawKey::KeyPair { public, private }) => {
                parse_ed25519(&public, private.as_deref())
            }
            (AlgorithmFamily::Rsa, RawKey::KeyPair { public, private }) => {
                parse_rsa(&public, private.as_deref())
            }
            (family, _) => {
                let (needed, got) = if family.is_symmetric() {
                    ("a shared secret", "a key pair")
                } else {
                    ("a key pair", "a shared secret")
                };
                Err(TokenError::key_format(format!("{family} keys need {needed}, got {got}")))
            }
        }
    }

    fn symmetric(family: AlgorithmFamily, bytes: Vec<u8>) -> Self {
        Self::SymmetricSecret {
            family,
            secret: Zeroizing::new(bytes),
        }
    }

    /// Family the material is pinned to.
    #[must_use]
    pub const fn family(&self) -> AlgorithmFamily {
        match self {
            Self::SymmetricSecret { family, .. } => *family,
            Self::AsymmetricKeyPair { public: PublicKey::Ed25519(_), .. } => AlgorithmFamily::EdDsa,
            Self::AsymmetricKeyPair { public: PublicKey::Rsa(_), .. } => AlgorithmFamily::Rsa,
        }
    }

    /// Whether this material can produce tokens.
    #[must_use]
    pub const fn can_sign(&self) -> bool {
        match self {
            Self::SymmetricSecret { .. } => true,
            Self::AsymmetricKeyPair { private, .. } => private.is_some(),
        }
    }

    /// Shared secret bytes if the material is symmetric and of `family`.
    pub(crate) fn secret_for(&self, family: AlgorithmFamily) -> Result<&[u8], TokenError> {
        match self {
            Self::SymmetricSecret { family: actual, secret } if *actual == family => {
                Ok(secret.as_slice())
            }
            other => Err(TokenError::algorithm_mismatch(family, other.family())),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymmetricSecret { family, .. } => f
                .debug_struct("SymmetricSecret")
                .field("family", family)
                .field("secret", &"[REDACTED]")
                .finish(),
            Self::AsymmetricKeyPair { private, .. } => f
                .debug_struct("AsymmetricKeyPair")
                .field("family", &self.family())
                .field("private", &private.as_ref().map(|_| "[REDACTED]"))
                .finish(),
        }
    }
}

/// Unwrap PEM armour if present, checking the label.
fn der_from(bytes: &[u8], labels: &[&str]) -> Result<Vec<u8>, TokenError> {
    if !bytes.starts_with(b"-----BEGIN") {
        return Ok(bytes.to_vec());
    }
    let parsed = pem::parse(bytes)?;
    if !labels.contains(&parsed.tag()) {
        return Err(TokenError::key_format(format!(
            "unexpected PEM label {}, expected one of {labels:?}",
            parsed.tag()
        )));
    }
    Ok(parsed.contents().to_vec())
}

fn parse_ed25519(public: &[u8], private: Option<&[u8]>) -> Result<KeyMaterial, TokenError> {
    let public_key = parse_ed25519_public(public)?;

    let private_key = match private {
        Some(bytes) => {
            let der = Zeroizing::new(der_from(bytes, &["PRIVATE KEY"])?);
            let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(&der)
                .map_err(|e| TokenError::key_format(format!("not an Ed25519 PKCS#8 key: {e}")))?;
            if pair.public_key().as_ref() != public_key.as_slice() {
                return Err(TokenError::key_format(
                    "Ed25519 public key does not match private key",
                ));
            }

            let mut keypair = Zeroizing::new([0u8; ED25519_KEYPAIR_LEN]);
            keypair[..ED25519_SEED_LEN].copy_from_slice(ed25519_seed(&der)?);
            keypair[ED25519_SEED_LEN..].copy_from_slice(&public_key);
            Some(PrivateKey::Ed25519(keypair))
        }
        None => None,
    };

    Ok(KeyMaterial::AsymmetricKeyPair {
        public: PublicKey::Ed25519(public_key),
        private: private_key,
    })
}

fn parse_ed25519_public(bytes: &[u8]) -> Result<[u8; ED25519_PUBLIC_KEY_LEN], TokenError> {
    let der = der_from(bytes, &["PUBLIC KEY"])?;
    let point = match der.len() {
        ED25519_PUBLIC_KEY_LEN => der.as_slice(),
        len if len == ED25519_SPKI_PREFIX.len() + ED25519_PUBLIC_KEY_LEN
            && der.starts_with(&ED25519_SPKI_PREFIX) =>
        {
            &der[ED25519_SPKI_PREFIX.len()..]
        }
        len => {
            return Err(TokenError::key_format(format!(
                "not an Ed25519 public key ({len} bytes)"
            )));
        }
    };

    let mut out = [0u8; ED25519_PUBLIC_KEY_LEN];
    out.copy_from_slice(point);
    Ok(out)
}

fn ed25519_seed(der: &[u8]) -> Result<&[u8], TokenError> {
    let header = der.get(ED25519_SEED_OFFSET - ED25519_SEED_HEADER.len()..ED25519_SEED_OFFSET);
    match (header, der.get(ED25519_SEED_OFFSET..ED25519_SEED_OFFSET + ED25519_SEED_LEN)) {
        (Some(header), Some(seed)) if header == ED25519_SEED_HEADER => Ok(seed),
        _ => Err(TokenError::key_format("unsupported Ed25519 PKCS#8 layout")),
    }
}

/// Parse a PKCS#1 or SPKI RSA public key into the PKCS#1 DER jsonwebtoken
/// verifies with.
fn parse_rsa_public(bytes: &[u8]) -> Result<DecodingKey, TokenError> {
    let der = der_from(bytes, &["PUBLIC KEY", "RSA PUBLIC KEY"])?;
    let key = RsaPublicKey::from_pkcs1_der(&der)
        .or_else(|_| RsaPublicKey::from_public_key_der(&der))
        .map_err(|e| TokenError::key_format(format!("not an RSA public key: {e}")))?;

    let modulus_bits = key.size() * 8;
    if modulus_bits < MIN_RSA_MODULUS_BITS {
        return Err(TokenError::key_format(format!(
            "RSA modulus must be at least {MIN_RSA_MODULUS_BITS} bits, got {modulus_bits}"
        )));
    }

    let pkcs1 = key
        .to_pkcs1_der()
        .map_err(|e| TokenError::key_format(format!("RSA public key not encodable: {e}")))?;
    Ok(DecodingKey::from_rsa_der(pkcs1.as_bytes()))
}

fn parse_rsa(public: &[u8], private: Option<&[u8]>) -> Result<KeyMaterial, TokenError> {
    let decoding = parse_rsa_public(public)?;

    let encoding = match private {
        Some(bytes) => {
            let der = Zeroizing::new(der_from(bytes, &["PRIVATE KEY", "RSA PRIVATE KEY"])?);
            let pair = RsaKeyPair::from_pkcs8(&der)
                .or_else(|_| RsaKeyPair::from_der(&der))
                .map_err(|e| TokenError::key_format(format!("not an RSA private key: {e}")))?;
            let modulus_bits = pair.public_modulus_len() * 8;
            if modulus_bits < MIN_RSA_MODULUS_BITS {
                return Err(TokenError::key_format(format!(
                    "RSA modulus must be at least {MIN_RSA_MODULUS_BITS} bits, got {modulus_bits}"
                )));
            }
            let encoding = if bytes.starts_with(b"-----BEGIN") {
                EncodingKey::from_rsa_pem(bytes)
                    .map_err(|e| TokenError::key_format(format!("not an RSA private key: {e}")))?
            } else {
                EncodingKey::from_rsa_der(bytes)
            };
            check_rsa_pair(&encoding, &decoding)?;
            Some(PrivateKey::Rsa(encoding))
        }
        None => None,
    };

    Ok(KeyMaterial::AsymmetricKeyPair {
        public: PublicKey::Rsa(decoding),
        private: encoding,
    })
}

/// Sign a fixed message with the private half and check it under the public half.
fn check_rsa_pair(encoding: &EncodingKey, decoding: &DecodingKey) -> Result<(), TokenError> {
    let signature = jsonwebtoken::crypto::sign(PAIR_CHECK_MESSAGE, encoding, Algorithm::RS256)
        .map_err(|e| TokenError::key_format(format!("RSA private key unusable: {e}")))?;
    let matches = jsonwebtoken::crypto::verify(&signature, PAIR_CHECK_MESSAGE, decoding, Algorithm::RS256)
        .map_err(|e| TokenError::key_format(format!("RSA public key unusable: {e}")))?;
    if matches {
        Ok(())
    } else {
        Err(TokenError::key_format("RSA public key does not match private key"))
    }
}
