use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs a session id for transport in a cookie: `"{value}.{hex_mac}"`.
pub fn sign(secret: &str, value: &str) -> String {
    format!("{}.{}", value, mac_hex(secret, value))
}

/// Verifies a signed cookie value and returns the embedded session id.
/// Anything malformed or tampered with yields `None` and is treated by the
/// callers as "no session".
pub fn verify<'a>(secret: &str, signed: &'a str) -> Option<&'a str> {
    let (value, tag_hex) = signed.rsplit_once('.')?;
    if value.is_empty() {
        return None;
    }

    let tag = hex::decode(tag_hex).ok()?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    mac.verify_slice(&tag).ok()?;

    Some(value)
}

fn mac_hex(secret: &str, value: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
