//! PASETO v3.local: AES-256-CTR encryption with an HMAC-SHA384 tag, both
//! keyed per token through HKDF-SHA384 over a random 32-byte nonce.

use super::paseto;
use super::{FormatAdapter, TokenFormat};
use crate::error::TokenError;
use crate::keys::KeyMaterial;
use rand::RngCore;
use rand::rngs::OsRng;
use rusty_paseto::core::{Key, Local, Paseto, PasetoNonce, PasetoSymmetricKey, Payload, V3};

const VERSION_PURPOSE: &str = "v3.local";
const NONCE_LEN: usize = 32;
const TAG_LEN: usize = 48;
const KEY_LEN: usize = 32;

/// Adapter for [`TokenFormat::PasetoV3Local`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PasetoLocal;

impl PasetoLocal {
    /// Seal with a caller-chosen nonce. Nonces must never repeat under a key.
    pub(crate) fn seal_with_nonce(
        &self,
        payload: &[u8],
        key: &KeyMaterial,
        nonce: &[u8; NONCE_LEN],
    ) -> Result<String, TokenError> {
        let key = self.symmetric_key(key)?;
        let payload = std::str::from_utf8(payload)
            .map_err(|e| TokenError::signing(format!("payload is not UTF-8: {e}")))?;
        let nonce = Key::<NONCE_LEN>::from(nonce);
        let nonce = PasetoNonce::<V3, Local>::from(&nonce);

        Paseto::<V3, Local>::builder()
            .set_payload(Payload::from(payload))
            .try_encrypt(&key, &nonce)
            .map_err(|e| TokenError::signing(format!("v3.local encryption failed: {e}")))
    }

    fn symmetric_key(&self, key: &KeyMaterial) -> Result<PasetoSymmetricKey<V3, Local>, TokenError> {
        let secret: &[u8; KEY_LEN] = key
            .secret_for(self.family())?
            .try_into()
            .map_err(|_| TokenError::key_format(format!("v3.local needs a {KEY_LEN}-byte secret")))?;
        Ok(PasetoSymmetricKey::<V3, Local>::from(Key::<KEY_LEN>::from(secret)))
    }
}

impl FormatAdapter for PasetoLocal {
    fn format(&self) -> TokenFormat {
        TokenFormat::PasetoV3Local
    }

    fn seal(&self, payload: &[u8], key: &KeyMaterial) -> Result<String, TokenError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| TokenError::signing(format!("nonce generation failed: {e}")))?;
        self.seal_with_nonce(payload, key, &nonce)
    }

    fn open(&self, token: &str, key: &KeyMaterial) -> Result<Vec<u8>, TokenError> {
        let key = self.symmetric_key(key)?;
        paseto::parse(token, VERSION_PURPOSE, NONCE_LEN + TAG_LEN)?;

        Paseto::<V3, Local>::try_decrypt(token, &key, None, None)
            .map(String::into_bytes)
            .map_err(|_| TokenError::Tampered)
    }

    fn unverified_payload(&self, token: &str) -> Result<Vec<u8>, TokenError> {
        paseto::parse(token, VERSION_PURPOSE, NONCE_LEN + TAG_LEN)?;
        Err(TokenError::decode("v3.local payload is encrypted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{AlgorithmFamily, RawKey};
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn key(family: AlgorithmFamily, first: u8) -> KeyMaterial {
        let bytes = (first..first + 32).collect();
        KeyMaterial::from_raw(family, RawKey::Secret(bytes)).unwrap()
    }

    const MESSAGE: &[u8] = br#"{"data":"this is a secret message","exp":"2022-01-01T00:00:00+00:00"}"#;

    #[test]
    fn test_v3_local_vector() {
        let key = key(AlgorithmFamily::AeadSymmetric, 0x70);
        let expected = "v3.local.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAADbfcIURX_0pVZVU1mAESUzrKZAsRm2EsD6yBoZYn6cpVZNzSJOhSDN-sRaWjfLU-yn9OJH1J_B8GKtOQ9gSQlb8yk9Iza7teRdkiR89ZFyvPPsVjjFiepFUVcMa-LP18zV77f_crJrVXWa5PDNRkCSeHfBBeg";

        assert_eq!(PasetoLocal.seal_with_nonce(MESSAGE, &key, &[0; NONCE_LEN]).unwrap(), expected);
        assert_eq!(PasetoLocal.open(expected, &key).unwrap(), MESSAGE);
    }

    #[test]
    fn test_random_nonce_per_token() {
        let key = key(AlgorithmFamily::AeadSymmetric, 0x70);
        let first = PasetoLocal.seal(MESSAGE, &key).unwrap();
        let second = PasetoLocal.seal(MESSAGE, &key).unwrap();

        assert_ne!(first, second);
        assert_eq!(PasetoLocal.open(&first, &key).unwrap(), MESSAGE);
        assert_eq!(PasetoLocal.open(&second, &key).unwrap(), MESSAGE);
    }

    #[test]
    fn test_ciphertext_hides_plaintext() {
        let key = key(AlgorithmFamily::AeadSymmetric, 0x70);
        let token = PasetoLocal.seal(MESSAGE, &key).unwrap();
        let body = URL_SAFE_NO_PAD.decode(&token["v3.local.".len()..]).unwrap();

        assert!(!body.windows(6).any(|w| w == b"secret"));
        assert!(matches!(PasetoLocal.unverified_payload(&token), Err(TokenError::Decode { .. })));
    }

    #[test]
    fn test_wrong_secret_is_tampered() {
        let token = PasetoLocal.seal(MESSAGE, &key(AlgorithmFamily::AeadSymmetric, 0x70)).unwrap();
        assert!(matches!(
            PasetoLocal.open(&token, &key(AlgorithmFamily::AeadSymmetric, 0x10)),
            Err(TokenError::Tampered)
        ));
    }

    #[test]
    fn test_tag_bit_flip_is_tampered() {
        let key = key(AlgorithmFamily::AeadSymmetric, 0x70);
        let token = PasetoLocal.seal(MESSAGE, &key).unwrap();
        let mut body = URL_SAFE_NO_PAD.decode(&token[VERSION_PURPOSE.len() + 1..]).unwrap();
        body[NONCE_LEN] ^= 0x80;

        let forged = paseto::render(VERSION_PURPOSE, &body);
        assert!(matches!(PasetoLocal.open(&forged, &key), Err(TokenError::Tampered)));
    }

    #[test]
    fn test_hmac_family_secret_rejected() {
        let same_bytes = key(AlgorithmFamily::Hmac, 0x70);
        assert!(matches!(
            PasetoLocal.seal(MESSAGE, &same_bytes),
            Err(TokenError::AlgorithmMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_payload_malformed() {
        let key = key(AlgorithmFamily::AeadSymmetric, 0x70);
        let token = paseto::render(VERSION_PURPOSE, &[0u8; NONCE_LEN + TAG_LEN - 1]);
        assert!(matches!(PasetoLocal.open(&token, &key), Err(TokenError::Malformed { .. })));
    }
}
