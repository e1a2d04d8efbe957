//! Shared proptest generators.

use proptest::collection::btree_map;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

/// Claim names the token codec manages itself.
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "role", "iat", "exp"];

/// Generate subject identifiers.
pub fn subject_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("juanPerez".to_string()),
        "[a-zA-Z][a-zA-Z0-9._-]{0,31}",
        "[a-z0-9._%+-]{1,16}@[a-z0-9-]{1,12}\\.[a-z]{2,4}",
    ]
}

/// Generate role names.
pub fn role_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("admin".to_string()),
        Just("editor".to_string()),
        Just("viewer".to_string()),
        "[a-z][a-z-]{2,15}",
    ]
}

/// Generate custom claim names that do not collide with reserved ones.
pub fn claim_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{1,15}".prop_filter("reserved claim name", |name| {
        !RESERVED_CLAIMS.contains(&name.as_str())
    })
}

/// Generate arbitrary JSON claim values, including finite floats and
/// nested objects.
pub fn claim_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON has no NaN or infinity", |f| f.is_finite())
            .prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::from),
        Just(Value::Null),
    ];
    leaf.prop_recursive(2, 8, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Generate a set of custom claims.
pub fn custom_claims_strategy() -> impl Strategy<Value = BTreeMap<String, Value>> {
    btree_map(claim_name_strategy(), claim_value_strategy(), 0..4)
}

/// Generate token lifetimes in seconds, from one second to a week.
pub fn ttl_secs_strategy() -> impl Strategy<Value = u64> {
    1u64..=7 * 24 * 60 * 60
}

/// Generate issuance instants as Unix seconds (2001 to 2100).
pub fn epoch_secs_strategy() -> impl Strategy<Value = i64> {
    1_000_000_000i64..4_102_444_800
}
