use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs an exchange API query string: HMAC-SHA256 over the raw query,
/// hex-encoded. The signature is appended to the query as `signature=...`.
pub fn sign_exchange_query(query: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signs a wallet API request: HMAC-SHA256 over
/// `timestamp ++ method ++ request_path ++ body`, base64-encoded.
///
/// Credential validation happens upstream; an empty secret still produces a
/// deterministic signature.
pub fn sign_wallet_request(
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
    secret: &str,
) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());
    mac.update(body.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}
