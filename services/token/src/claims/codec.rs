use super::model::{Claims, EXPIRES_AT, ISSUED_AT, ROLE, SUBJECT};
use crate::clock;
use crate::error::TokenError;
use crate::format::TokenFormat;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// How a format writes timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeEncoding {
    /// RFC 3339 strings, as PASETO registers them
    Rfc3339,
    /// Integer seconds since the epoch (JWT `NumericDate`)
    NumericDate,
}

impl From<TokenFormat> for TimeEncoding {
    fn from(format: TokenFormat) -> Self {
        match format {
            TokenFormat::PasetoV4Public | TokenFormat::PasetoV3Local => Self::Rfc3339,
            TokenFormat::JwtHs256 | TokenFormat::JwtRs256 => Self::NumericDate,
        }
    }
}

/// Canonical JSON encoding of claims for each token format.
///
/// Object keys are emitted in sorted order, so equal claims always encode
/// to identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsCodec;

impl ClaimsCodec {
    /// Encode claims into the payload bytes of `format`.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if a custom value cannot be serialized.
    pub fn encode(claims: &Claims, format: TokenFormat) -> Result<Vec<u8>, TokenError> {
        let encoding = TimeEncoding::from(format);
        let mut object: Map<String, Value> = claims
            .custom()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        object.insert(SUBJECT.to_owned(), Value::from(claims.subject()));
        object.insert(ROLE.to_owned(), Value::from(claims.role()));
        object.insert(ISSUED_AT.to_owned(), encode_time(claims.issued_at(), encoding));
        object.insert(EXPIRES_AT.to_owned(), encode_time(claims.expires_at(), encoding));

        Ok(serde_json::to_vec(&Value::Object(object))?)
    }

    /// Decode payload bytes of `format` into claims.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if a required claim is absent and `Decode` if
    /// the bytes are not a claims object or a claim has the wrong type.
    pub fn decode(bytes: &[u8], format: TokenFormat) -> Result<Claims, TokenError> {
        let encoding = TimeEncoding::from(format);
        let Value::Object(mut object) = serde_json::from_slice::<Value>(bytes)? else {
            return Err(TokenError::decode("claims payload is not a JSON object"));
        };

        let subject = take_string(&mut object, SUBJECT)?;
        let role = take_string(&mut object, ROLE)?;
        let issued_at = take_time(&mut object, ISSUED_AT, encoding)?;
        let expires_at = take_time(&mut object, EXPIRES_AT, encoding)?;

        Claims::from_parts(subject, role, issued_at, expires_at, object.into_iter().collect())
            .map_err(|e| TokenError::decode(e.to_string()))
    }

    /// Read claims out of a token without checking its integrity.
    ///
    /// Only public formats can be read this way; encrypted payloads always
    /// fail with `Decode`. Never use the result for authorization.
    ///
    /// # Errors
    ///
    /// Returns `Decode` for encrypted formats, otherwise any error of
    /// [`ClaimsCodec::decode`] or `Malformed` for an unparseable token.
    pub fn decode_unverified(token: &str, format: TokenFormat) -> Result<Claims, TokenError> {
        let payload = format.adapter().unverified_payload(token)?;
        Self::decode(&payload, format)
    }
}

fn encode_time(at: DateTime<Utc>, encoding: TimeEncoding) -> Value {
    match encoding {
        TimeEncoding::Rfc3339 => Value::from(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        TimeEncoding::NumericDate => Value::from(at.timestamp()),
    }
}

fn take_string(object: &mut Map<String, Value>, field: &str) -> Result<String, TokenError> {
    match object.remove(field) {
        None => Err(TokenError::missing_field(field)),
        Some(Value::String(s)) if s.is_empty() => Err(TokenError::missing_field(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(TokenError::decode(format!(
            "claim {field} must be a string, got {other}"
        ))),
    }
}

fn take_time(
    object: &mut Map<String, Value>,
    field: &str,
    encoding: TimeEncoding,
) -> Result<DateTime<Utc>, TokenError> {
    let value = object
        .remove(field)
        .ok_or_else(|| TokenError::missing_field(field))?;

    let parsed = match (encoding, &value) {
        (TimeEncoding::Rfc3339, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| clock::truncate(dt.with_timezone(&Utc))),
        (TimeEncoding::NumericDate, Value::Number(n)) => {
            n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0))
        }
        _ => None,
    };

    parsed.ok_or_else(|| TokenError::decode(format!("claim {field} is not a valid timestamp: {value}")))
}
