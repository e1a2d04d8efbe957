//! Shared setup for integration tests.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::DateTime;
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures;
use token_core::{
    AlgorithmFamily, KeyRegistry, ManualClock, Purpose, RawKey, TokenFormat, TokenProfile,
    TokenService,
};

/// 2023-11-14T22:13:20Z
pub const EPOCH: i64 = 1_700_000_000;

/// Which fixture key set to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySet {
    Primary,
    Alternate,
}

pub fn registry(set: KeySet) -> KeyRegistry {
    let (ed_private, ed_public, rsa_private, rsa_public, secret) = match set {
        KeySet::Primary => (
            fixtures::ED25519_PRIVATE_PEM,
            fixtures::ED25519_PUBLIC_PEM,
            fixtures::RSA_PRIVATE_PEM,
            fixtures::RSA_PUBLIC_PEM,
            fixtures::secret(),
        ),
        KeySet::Alternate => (
            fixtures::ED25519_ALT_PRIVATE_PEM,
            fixtures::ED25519_ALT_PUBLIC_PEM,
            fixtures::RSA_ALT_PRIVATE_PEM,
            fixtures::RSA_ALT_PUBLIC_PEM,
            fixtures::secret_alt(),
        ),
    };

    let mut registry = KeyRegistry::new();
    registry
        .register(
            Purpose::PUBLIC_SIGNING,
            AlgorithmFamily::EdDsa,
            RawKey::KeyPair {
                public: ed_public.as_bytes().to_vec(),
                private: Some(ed_private.as_bytes().to_vec()),
            },
        )
        .unwrap();
    registry
        .register(
            Purpose::LOCAL_ENCRYPTION,
            AlgorithmFamily::AeadSymmetric,
            RawKey::Secret(secret.clone()),
        )
        .unwrap();
    registry
        .register(Purpose::JWT_HMAC, AlgorithmFamily::Hmac, RawKey::Secret(secret))
        .unwrap();
    registry
        .register(
            Purpose::JWT_RSA,
            AlgorithmFamily::Rsa,
            RawKey::KeyPair {
                public: rsa_public.as_bytes().to_vec(),
                private: Some(rsa_private.as_bytes().to_vec()),
            },
        )
        .unwrap();
    registry
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(DateTime::from_timestamp(EPOCH, 0).unwrap()))
}

/// Service over `set` with the four default profiles and a 24h ttl.
pub fn service(set: KeySet, clock: Arc<ManualClock>) -> TokenService {
    TokenService::new(Arc::new(registry(set)))
        .with_profiles(TokenProfile::defaults(Duration::from_secs(24 * 60 * 60)))
        .with_clock(clock)
}

/// Purpose of the default profile using `format`.
pub fn purpose_for(format: TokenFormat) -> Purpose {
    match format {
        TokenFormat::PasetoV4Public => Purpose::PUBLIC_SIGNING,
        TokenFormat::PasetoV3Local => Purpose::LOCAL_ENCRYPTION,
        TokenFormat::JwtHs256 => Purpose::JWT_HMAC,
        TokenFormat::JwtRs256 => Purpose::JWT_RSA,
    }
}

/// Length in bytes of the signature or tag of `format`.
pub fn integrity_len(format: TokenFormat) -> usize {
    match format {
        TokenFormat::PasetoV4Public => 64,
        TokenFormat::PasetoV3Local => 48,
        TokenFormat::JwtHs256 => 32,
        TokenFormat::JwtRs256 => 256,
    }
}

/// Flip one bit of the signature (or tag) and re-encode the token.
pub fn flip_integrity_bit(token: &str, format: TokenFormat, bit: usize) -> String {
    let flip = |bytes: &mut [u8], offset: usize| bytes[offset + bit / 8] ^= 1 << (bit % 8);

    match format {
        TokenFormat::PasetoV4Public | TokenFormat::PasetoV3Local => {
            let (header, body) = token.split_at(format.as_str().len() + 1);
            let mut body = URL_SAFE_NO_PAD.decode(body).unwrap();
            let offset = body.len() - integrity_len(format);
            flip(&mut body, offset);
            format!("{header}{}", URL_SAFE_NO_PAD.encode(body))
        }
        TokenFormat::JwtHs256 | TokenFormat::JwtRs256 => {
            let (input, signature) = token.rsplit_once('.').unwrap();
            let mut signature = URL_SAFE_NO_PAD.decode(signature).unwrap();
            flip(&mut signature, 0);
            format!("{input}.{}", URL_SAFE_NO_PAD.encode(signature))
        }
    }
}

/// Character range of `token` that encodes only signature or tag bits.
pub fn integrity_text_range(token: &str, format: TokenFormat) -> std::ops::Range<usize> {
    match format {
        TokenFormat::PasetoV4Public | TokenFormat::PasetoV3Local => {
            let chars = integrity_len(format) * 8 / 6;
            token.len() - chars..token.len()
        }
        TokenFormat::JwtHs256 | TokenFormat::JwtRs256 => {
            let start = token.rfind('.').unwrap() + 1;
            start..token.len()
        }
    }
}

/// Flip one of the low seven bits of the character at `index` in the token
/// text, without re-encoding. The result stays ASCII.
pub fn flip_token_text_bit(token: &str, index: usize, bit: u8) -> String {
    let mut bytes = token.as_bytes().to_vec();
    bytes[index] ^= 1 << (bit % 7);
    String::from_utf8(bytes).unwrap()
}
