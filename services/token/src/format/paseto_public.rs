//! PASETO v4.public: Ed25519 signature over the pre-authentication encoding.
//! Claims are readable by anyone; only integrity is protected.

use super::paseto;
use super::{FormatAdapter, TokenFormat};
use crate::error::TokenError;
use crate::keys::{KeyMaterial, PrivateKey, PublicKey};
use rusty_paseto::core::{
    Key, Paseto, PasetoAsymmetricPrivateKey, PasetoAsymmetricPublicKey, Payload, Public, V4,
};

const VERSION_PURPOSE: &str = "v4.public";
const SIGNATURE_LEN: usize = 64;

/// Adapter for [`TokenFormat::PasetoV4Public`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PasetoPublic;

impl FormatAdapter for PasetoPublic {
    fn format(&self) -> TokenFormat {
        TokenFormat::PasetoV4Public
    }

    fn seal(&self, payload: &[u8], key: &KeyMaterial) -> Result<String, TokenError> {
        let keypair = match key {
            KeyMaterial::AsymmetricKeyPair {
                private: Some(PrivateKey::Ed25519(keypair)),
                ..
            } => keypair,
            KeyMaterial::AsymmetricKeyPair {
                public: PublicKey::Ed25519(_),
                private: None,
            } => {
                return Err(TokenError::key_format(
                    "Ed25519 key has no private half to sign with",
                ));
            }
            other => return Err(TokenError::algorithm_mismatch(self.family(), other.family())),
        };

        let payload = std::str::from_utf8(payload)
            .map_err(|e| TokenError::signing(format!("payload is not UTF-8: {e}")))?;
        let signing_key = Key::<64>::from(&**keypair);
        let signing_key = PasetoAsymmetricPrivateKey::<V4, Public>::from(&signing_key);

        Paseto::<V4, Public>::builder()
            .set_payload(Payload::from(payload))
            .try_sign(&signing_key)
            .map_err(|e| TokenError::signing(format!("v4.public signing failed: {e}")))
    }

    fn open(&self, token: &str, key: &KeyMaterial) -> Result<Vec<u8>, TokenError> {
        let KeyMaterial::AsymmetricKeyPair {
            public: PublicKey::Ed25519(public),
            ..
        } = key
        else {
            return Err(TokenError::algorithm_mismatch(self.family(), key.family()));
        };

        paseto::parse(token, VERSION_PURPOSE, SIGNATURE_LEN)?;

        let verifying_key = Key::<32>::from(public);
        let verifying_key = PasetoAsymmetricPublicKey::<V4, Public>::from(&verifying_key);
        Paseto::<V4, Public>::try_verify(token, &verifying_key, None, None)
            .map(String::into_bytes)
            .map_err(|_| TokenError::Tampered)
    }

    fn unverified_payload(&self, token: &str) -> Result<Vec<u8>, TokenError> {
        let mut body = paseto::parse(token, VERSION_PURPOSE, SIGNATURE_LEN)?.bytes;
        body.truncate(body.len() - SIGNATURE_LEN);
        Ok(body)
    }
}
