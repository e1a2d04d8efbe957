//! Command-line front end: issues login tokens and verifies tokens per purpose.

use anyhow::{Context, Result, bail};
use serde_json::json;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use token_core::keys::load_registry;
use token_core::observability::init_tracing;
use token_core::{ClaimsCodec, Config, Purpose, TokenService, UnsignedClaims};
use tracing::info;

const USAGE: &str = "usage: token-core login [subject] [role]\n       token-core verify <purpose> <token>";

fn main() -> Result<ExitCode> {
    let config = Config::from_env()?;
    init_tracing(&config.tracing())?;

    let registry = load_registry(&config.key_paths).context("loading keys")?;
    let service = TokenService::from_config(&config, Arc::new(registry))?;
    info!(ttl_secs = config.token_ttl.as_secs(), "Token core ready");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["login", rest @ ..] if rest.len() <= 2 => {
            let subject = rest.first().copied().unwrap_or("juanPerez");
            let role = rest.get(1).copied().unwrap_or("admin");
            login(&service, subject, role)
        }
        ["verify", purpose, token] => verify(&service, &Purpose::new(*purpose), token),
        _ => bail!("{USAGE}"),
    }
}

/// Issue one token per built-in purpose.
fn login(service: &TokenService, subject: &str, role: &str) -> Result<ExitCode> {
    let claims = UnsignedClaims::builder().subject(subject).role(role).build()?;

    let body = json!({
        "public": service.issue(&claims, &Purpose::PUBLIC_SIGNING)?.into_string(),
        "local": service.issue(&claims, &Purpose::LOCAL_ENCRYPTION)?.into_string(),
        "jwtRSA": service.issue(&claims, &Purpose::JWT_RSA)?.into_string(),
        "jwtHMAC": service.issue(&claims, &Purpose::JWT_HMAC)?.into_string(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(ExitCode::SUCCESS)
}

/// Print the token's claims, or `unauthorized` with a failing exit code.
fn verify(service: &TokenService, purpose: &Purpose, token: &str) -> Result<ExitCode> {
    match service.authenticate(token, purpose) {
        Ok(claims) => {
            let format = service.profile(purpose)?.format;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&ClaimsCodec::encode(&claims, format)?)?;
            writeln!(stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            println!("{failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}
