//! End-to-end issuance and validation scenarios.

mod common;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::TimeDelta;
use common::{EPOCH, KeySet, clock, purpose_for, service};
use jsonwebtoken::{Algorithm, EncodingKey};
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures;
use token_core::keys::{KeyPaths, load_registry};
use token_core::{
    AuthFailure, Claims, ClaimsCodec, Clock, FailureReason, Purpose, TokenError, TokenFormat,
    TokenProfile, TokenService, UnsignedClaims, VerificationResult,
};

fn juan_perez() -> UnsignedClaims {
    UnsignedClaims::builder()
        .subject("juanPerez")
        .role("admin")
        .build()
        .unwrap()
}

#[test]
fn test_v4_public_valid_then_expired_after_25_hours() {
    let clock = clock();
    let service = service(KeySet::Primary, clock.clone());

    let token = service.issue(&juan_perez(), &Purpose::PUBLIC_SIGNING).unwrap();
    assert!(token.as_str().starts_with("v4.public."));

    let VerificationResult::Valid(claims) = service.validate(token.as_str(), &Purpose::PUBLIC_SIGNING)
    else {
        panic!("fresh token must validate");
    };
    assert_eq!(claims.subject(), "juanPerez");
    assert_eq!(claims.role(), "admin");
    assert_eq!(claims.issued_at().timestamp(), EPOCH);
    assert_eq!(claims.expires_at() - claims.issued_at(), TimeDelta::hours(24));

    clock.advance(Duration::from_secs(25 * 60 * 60));
    assert_eq!(
        service.validate(token.as_str(), &Purpose::PUBLIC_SIGNING),
        VerificationResult::Invalid(FailureReason::Expired)
    );
}

#[test]
fn test_round_trip_every_purpose() {
    let clock = clock();
    let service = service(KeySet::Primary, clock.clone());

    for format in TokenFormat::ALL {
        let purpose = purpose_for(format);
        let unsigned = UnsignedClaims::builder()
            .subject("user-42")
            .role("editor")
            .claim("tenant", "acme")
            .claim("mfa", true)
            .build()
            .unwrap();

        let (token, issued) = service.issue_claims(&unsigned, &purpose).unwrap();
        assert_eq!(token.format(), format);

        let expected =
            Claims::issue(&unsigned, clock.now(), Duration::from_secs(24 * 60 * 60)).unwrap();
        assert_eq!(issued, expected);
        assert_eq!(
            service.validate(token.as_str(), &purpose),
            VerificationResult::Valid(expected),
            "{format}"
        );
    }
}

#[test]
fn test_v3_local_payload_unreadable_without_secret() {
    let service = service(KeySet::Primary, clock());
    let token = service.issue(&juan_perez(), &Purpose::LOCAL_ENCRYPTION).unwrap();

    let err = ClaimsCodec::decode_unverified(token.as_str(), TokenFormat::PasetoV3Local).unwrap_err();
    assert!(matches!(err, TokenError::Decode { .. }));

    let body = URL_SAFE_NO_PAD.decode(&token.as_str()["v3.local.".len()..]).unwrap();
    assert!(matches!(
        ClaimsCodec::decode(&body, TokenFormat::PasetoV3Local),
        Err(TokenError::Decode { .. })
    ));
    assert!(!String::from_utf8_lossy(&body).contains("juanPerez"));
}

#[test]
fn test_public_formats_readable_without_key() {
    let service = service(KeySet::Primary, clock());

    for format in [TokenFormat::PasetoV4Public, TokenFormat::JwtHs256, TokenFormat::JwtRs256] {
        let token = service.issue(&juan_perez(), &purpose_for(format)).unwrap();
        let claims = ClaimsCodec::decode_unverified(token.as_str(), format).unwrap();
        assert_eq!(claims.to_unsigned(), juan_perez());
    }
}

#[test]
fn test_cross_key_rejection() {
    let clock = clock();
    let primary = service(KeySet::Primary, clock.clone());
    let alternate = service(KeySet::Alternate, clock);

    for format in TokenFormat::ALL {
        let purpose = purpose_for(format);
        let token = primary.issue(&juan_perez(), &purpose).unwrap();
        assert_eq!(
            alternate.validate(token.as_str(), &purpose),
            VerificationResult::Invalid(FailureReason::Tampered),
            "{format}"
        );
    }
}

#[test]
fn test_rsa_token_rejected_by_hmac_purpose() {
    let service = service(KeySet::Primary, clock());
    let token = service.issue(&juan_perez(), &Purpose::JWT_RSA).unwrap();

    assert_eq!(
        service.validate(token.as_str(), &Purpose::JWT_HMAC),
        VerificationResult::Invalid(FailureReason::AlgorithmMismatch)
    );
}

#[test]
fn test_hmac_forged_with_rsa_public_key_rejected() {
    let service = service(KeySet::Primary, clock());
    let token = service.issue(&juan_perez(), &Purpose::JWT_RSA).unwrap();

    // Re-sign the genuine claims as HS256 keyed with the published RSA key.
    let payload = token.as_str().split('.').nth(1).unwrap();
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let input = format!("{header}.{payload}");
    let signature = jsonwebtoken::crypto::sign(
        input.as_bytes(),
        &EncodingKey::from_secret(fixtures::RSA_PUBLIC_PEM.as_bytes()),
        Algorithm::HS256,
    )
    .unwrap();
    let forged = format!("{input}.{signature}");

    assert_eq!(
        service.validate(&forged, &Purpose::JWT_RSA),
        VerificationResult::Invalid(FailureReason::AlgorithmMismatch)
    );
    assert_eq!(service.authenticate(&forged, &Purpose::JWT_RSA), Err(AuthFailure));
}

#[test]
fn test_cross_format_tokens_rejected() {
    let service = service(KeySet::Primary, clock());

    for issued_as in TokenFormat::ALL {
        let token = service.issue(&juan_perez(), &purpose_for(issued_as)).unwrap();
        for checked_as in TokenFormat::ALL.into_iter().filter(|f| *f != issued_as) {
            let result = service.validate(token.as_str(), &purpose_for(checked_as));
            assert!(!result.is_valid(), "{issued_as} accepted as {checked_as}");
        }
    }
}

#[test]
fn test_every_failure_looks_the_same() {
    let clock = clock();
    let service = service(KeySet::Primary, clock.clone());
    let token = service.issue(&juan_perez(), &Purpose::JWT_HMAC).unwrap();
    clock.advance(Duration::from_secs(48 * 60 * 60));

    let failures = [
        service.authenticate(token.as_str(), &Purpose::JWT_HMAC),
        service.authenticate("not-a-token", &Purpose::JWT_HMAC),
        service.authenticate(token.as_str(), &Purpose::new("unknown")),
    ];
    for failure in failures {
        let err = failure.unwrap_err();
        assert_eq!(err, AuthFailure);
        assert_eq!(err.to_string(), "unauthorized");
    }
}

#[test]
fn test_concurrent_validation() {
    let service = Arc::new(service(KeySet::Primary, clock()));
    let tokens: Vec<_> = TokenFormat::ALL
        .into_iter()
        .map(|format| (purpose_for(format), service.issue(&juan_perez(), &purpose_for(format)).unwrap()))
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let tokens = &tokens;
            scope.spawn(move || {
                for _ in 0..10 {
                    for (purpose, token) in tokens {
                        assert!(service.validate(token.as_str(), purpose).is_valid());
                        assert!(service.issue(&juan_perez(), purpose).is_ok());
                    }
                }
            });
        }
    });
}

#[test]
fn test_loader_registers_fixture_files() {
    let dir = fixtures::fixtures_dir();
    let paths = KeyPaths {
        ed25519_private: dir.join("ed25519_private.pem"),
        ed25519_public: dir.join("ed25519_public.pem"),
        secret: dir.join("secret.b64"),
        rsa_private: dir.join("rsa_private.pem"),
        rsa_public: dir.join("rsa_public.pem"),
    };

    let registry = Arc::new(load_registry(&paths).unwrap());
    assert_eq!(registry.len(), 4);

    let loaded = TokenService::new(registry)
        .with_profiles(TokenProfile::defaults(Duration::from_secs(60)))
        .with_clock(clock());
    loaded.check_profiles().unwrap();

    // Tokens from the file-loaded registry verify under the fixture registry.
    let reference = service(KeySet::Primary, clock());
    for format in TokenFormat::ALL {
        let purpose = purpose_for(format);
        let token = loaded.issue(&juan_perez(), &purpose).unwrap();
        assert!(reference.validate(token.as_str(), &purpose).is_valid(), "{format}");
    }
}

#[test]
fn test_loader_rejects_mismatched_key_pair() {
    let dir = fixtures::fixtures_dir();
    let paths = KeyPaths {
        ed25519_private: dir.join("ed25519_private.pem"),
        ed25519_public: dir.join("ed25519_alt_public.pem"),
        secret: dir.join("secret.b64"),
        rsa_private: dir.join("rsa_private.pem"),
        rsa_public: dir.join("rsa_public.pem"),
    };

    assert!(matches!(load_registry(&paths), Err(TokenError::KeyFormat { .. })));
}
