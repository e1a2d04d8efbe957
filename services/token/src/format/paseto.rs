//! PASETO token framing shared by the local and public adapters.
//!
//! Cryptography lives in `rusty_paseto`; this module only checks the shape
//! of a token before it reaches the library, so that structural damage and
//! integrity damage are reported apart.

use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Decoded body of a `version.purpose.payload` token.
#[derive(Debug)]
pub(super) struct PasetoBody {
    pub bytes: Vec<u8>,
}

/// Split a token, check its header against `expected` (`v4.public`) and
/// decode the body.
///
/// Tokens are issued without a footer, so a present footer can only be an
/// alteration and is reported as `Tampered`, as is a body that is not
/// valid base64url. A body shorter than `min_body_len` is `Malformed`.
pub(super) fn parse(
    token: &str,
    expected: &str,
    min_body_len: usize,
) -> Result<PasetoBody, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let (version, purpose, payload, footer) = match segments.as_slice() {
        [version, purpose, payload] => (*version, *purpose, *payload, None),
        [version, purpose, payload, footer] => (*version, *purpose, *payload, Some(*footer)),
        _ => {
            return Err(TokenError::malformed(format!(
                "expected 3 or 4 segments, got {}",
                segments.len()
            )));
        }
    };

    let actual = format!("{version}.{purpose}");
    if actual != expected {
        return Err(if looks_like_header(version, purpose) {
            TokenError::algorithm_mismatch(expected, actual)
        } else {
            TokenError::malformed("not a PASETO token")
        });
    }
    if footer.is_some() {
        return Err(TokenError::Tampered);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Tampered)?;
    if bytes.len() < min_body_len {
        return Err(TokenError::malformed(format!(
            "{expected} body shorter than {min_body_len} bytes"
        )));
    }
    Ok(PasetoBody { bytes })
}

fn looks_like_header(version: &str, purpose: &str) -> bool {
    let numbered = version
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
    numbered && matches!(purpose, "local" | "public")
}

/// Render `version.purpose.b64(body)` with no cryptography applied.
#[cfg(test)]
pub(super) fn render(expected: &str, body: &[u8]) -> String {
    let mut token = format!("{expected}.");
    URL_SAFE_NO_PAD.encode_string(body, &mut token);
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let token = render("v4.public", b"payload");
        assert!(token.starts_with("v4.public."));

        let body = parse(&token, "v4.public", 0).unwrap();
        assert_eq!(body.bytes, b"payload");
    }

    #[test]
    fn test_footer_rejected() {
        let token = format!("{}.a2lk", render("v3.local", b"body"));
        assert!(matches!(parse(&token, "v3.local", 0), Err(TokenError::Tampered)));
    }

    #[test]
    fn test_parse_other_paseto_header() {
        let token = render("v3.local", b"body");
        let err = parse(&token, "v4.public", 0).unwrap_err();
        assert!(matches!(
            err,
            TokenError::AlgorithmMismatch { ref expected, ref actual }
                if expected == "v4.public" && actual == "v3.local"
        ));
    }

    #[test]
    fn test_parse_jwt_is_malformed() {
        let err = parse("eyJhbGciOiJIUzI1NiJ9.e30.c2ln", "v4.public", 0).unwrap_err();
        assert!(matches!(err, TokenError::Malformed { .. }));
    }

    #[test]
    fn test_parse_bad_segments() {
        assert!(matches!(parse("v4.public", "v4.public", 0), Err(TokenError::Malformed { .. })));
        assert!(matches!(
            parse("v4.public.a.b.c", "v4.public", 0),
            Err(TokenError::Malformed { .. })
        ));
    }

    #[test]
    fn test_undecodable_body_is_tampered() {
        assert!(matches!(parse("v4.public.!!!", "v4.public", 0), Err(TokenError::Tampered)));
        // One bit apart: "aQ" is canonical, "aR" leaves a non-zero trailing bit.
        assert_eq!(parse("v4.public.aQ", "v4.public", 0).unwrap().bytes, b"i");
        assert!(matches!(parse("v4.public.aR", "v4.public", 0), Err(TokenError::Tampered)));
    }

    #[test]
    fn test_short_body_is_malformed() {
        let token = render("v4.public", &[0u8; 10]);
        assert!(matches!(parse(&token, "v4.public", 64), Err(TokenError::Malformed { .. })));
    }
}
