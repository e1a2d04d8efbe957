//! Claims model, builder and per-format codec.

mod builder;
mod codec;
mod model;

pub use builder::ClaimsBuilder;
pub use codec::ClaimsCodec;
pub use model::{Claims, EXPIRES_AT, ISSUED_AT, RESERVED, ROLE, SUBJECT, UnsignedClaims};
