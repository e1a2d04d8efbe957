//! Compact JWS tokens signed with HS256 or RS256.
//!
//! The `alg` header must equal the adapter's algorithm exactly. Nothing is
//! negotiated from the header: a known algorithm of another kind is an
//! `AlgorithmMismatch`, and names `jsonwebtoken` does not know (`none`,
//! `hs256`) fail header parsing as `Malformed`. Either way no key is touched.
//!
//! Payload bytes pass through as a raw JSON value so the signed claims are
//! exactly the bytes the codec produced.

use super::{FormatAdapter, TokenFormat};
use crate::error::TokenError;
use crate::keys::{KeyMaterial, PrivateKey, PublicKey};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use serde_json::value::RawValue;

/// Adapter for [`TokenFormat::JwtHs256`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacJwt;

/// Adapter for [`TokenFormat::JwtRs256`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaJwt;

impl FormatAdapter for HmacJwt {
    fn format(&self) -> TokenFormat {
        TokenFormat::JwtHs256
    }

    fn seal(&self, payload: &[u8], key: &KeyMaterial) -> Result<String, TokenError> {
        let secret = key.secret_for(self.family())?;
        seal_jws(payload, Algorithm::HS256, &EncodingKey::from_secret(secret))
    }

    fn open(&self, token: &str, key: &KeyMaterial) -> Result<Vec<u8>, TokenError> {
        let secret = key.secret_for(self.family())?;
        open_jws(token, Algorithm::HS256, &DecodingKey::from_secret(secret))
    }

    fn unverified_payload(&self, token: &str) -> Result<Vec<u8>, TokenError> {
        unverified_jws(token, Algorithm::HS256)
    }
}

impl FormatAdapter for RsaJwt {
    fn format(&self) -> TokenFormat {
        TokenFormat::JwtRs256
    }

    fn seal(&self, payload: &[u8], key: &KeyMaterial) -> Result<String, TokenError> {
        let encoding = match key {
            KeyMaterial::AsymmetricKeyPair {
                private: Some(PrivateKey::Rsa(encoding)),
                ..
            } => encoding,
            KeyMaterial::AsymmetricKeyPair {
                public: PublicKey::Rsa(_),
                private: None,
            } => {
                return Err(TokenError::key_format(
                    "RSA key has no private half to sign with",
                ));
            }
            other => return Err(TokenError::algorithm_mismatch(self.family(), other.family())),
        };
        seal_jws(payload, Algorithm::RS256, encoding)
    }

    fn open(&self, token: &str, key: &KeyMaterial) -> Result<Vec<u8>, TokenError> {
        let KeyMaterial::AsymmetricKeyPair {
            public: PublicKey::Rsa(decoding),
            ..
        } = key
        else {
            return Err(TokenError::algorithm_mismatch(self.family(), key.family()));
        };
        open_jws(token, Algorithm::RS256, decoding)
    }

    fn unverified_payload(&self, token: &str) -> Result<Vec<u8>, TokenError> {
        unverified_jws(token, Algorithm::RS256)
    }
}

fn seal_jws(payload: &[u8], algorithm: Algorithm, key: &EncodingKey) -> Result<String, TokenError> {
    let claims: Box<RawValue> = serde_json::from_slice(payload)?;
    encode(&Header::new(algorithm), &claims, key).map_err(|e| match e.kind() {
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            TokenError::key_format(e.to_string())
        }
        _ => TokenError::signing(e.to_string()),
    })
}

/// Check the header, then verify the signature and return the payload.
fn open_jws(token: &str, algorithm: Algorithm, key: &DecodingKey) -> Result<Vec<u8>, TokenError> {
    expect_declared(token, algorithm)?;

    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Box<RawValue>>(token, key, &validation)
        .map_err(|e| open_error(e, algorithm))?;
    Ok(data.claims.get().as_bytes().to_vec())
}

fn unverified_jws(token: &str, algorithm: Algorithm) -> Result<Vec<u8>, TokenError> {
    expect_declared(token, algorithm)?;
    let payload = token.split('.').nth(1).unwrap_or_default();
    Ok(URL_SAFE_NO_PAD.decode(payload)?)
}

/// Require three segments and a header declaring exactly `algorithm`.
fn expect_declared(token: &str, algorithm: Algorithm) -> Result<(), TokenError> {
    let segments = token.split('.').count();
    if segments != 3 {
        return Err(TokenError::malformed(format!("expected 3 segments, got {segments}")));
    }

    let header = decode_header(token)
        .map_err(|e| TokenError::malformed(format!("invalid JOSE header: {e}")))?;
    if header.alg != algorithm {
        return Err(TokenError::algorithm_mismatch(
            format!("{algorithm:?}"),
            format!("{:?}", header.alg),
        ));
    }
    Ok(())
}

/// Map a failed `decode` once the header has been checked.
fn open_error(err: JwtError, algorithm: Algorithm) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) | ErrorKind::Crypto(_) => {
            TokenError::Tampered
        }
        ErrorKind::Json(_) | ErrorKind::Utf8(_) => TokenError::decode(err.to_string()),
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            TokenError::key_format(err.to_string())
        }
        ErrorKind::InvalidAlgorithm => {
            TokenError::algorithm_mismatch(format!("{algorithm:?}"), "key of another family")
        }
        _ => TokenError::malformed(err.to_string()),
    }
}
