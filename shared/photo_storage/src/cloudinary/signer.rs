//! Request signing for the asset host's authenticated upload API

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Value sent as `signature_algorithm` alongside every signed request
pub const SIGNATURE_ALGORITHM: &str = "sha256";

/// Signs request parameters.
///
/// Parameters are serialized sorted by name as `key=value` pairs joined with
/// `&`, the API secret is appended and the SHA-256 digest is hex encoded.
/// Empty values are left out. `file`, `api_key`, `cloud_name`,
/// `resource_type` and `signature_algorithm` must not be passed in.
#[must_use]
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
