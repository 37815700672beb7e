//! Signed session cookies.
//!
//! The HTTP session layer stores `s:<sid>.<signature>` URL-encoded in the
//! cookie, where the signature is HMAC-SHA256 of the sid keyed by the
//! session secret, base64 encoded with the padding stripped. Both layers
//! must agree on this format byte for byte.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_PREFIX: &str = "s:";

/// Sign `value`, producing `value.signature`.
pub fn sign(value: &str, secret: &str) -> String {
    format!("{}.{}", value, signature(value, secret))
}

/// Verify a `value.signature` string and return the value.
pub fn unsign<'a>(signed: &'a str, secret: &str) -> Option<&'a str> {
    let (value, given) = signed.rsplit_once('.')?;
    let expected = signature(value, secret);
    if given.len() == expected.len() && bool::from(given.as_bytes().ct_eq(expected.as_bytes())) {
        Some(value)
    } else {
        None
    }
}

/// Decode a raw cookie value and return the session id it carries.
///
/// Returns `None` for values that are not signed, do not decode to UTF-8, or
/// whose signature does not match `secret`. A literal `+` is kept, not read
/// as a space.
pub fn session_id(raw: &str, secret: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    let signed = decoded.strip_prefix(SIGNED_PREFIX)?;
    unsign(signed, secret).map(str::to_owned)
}

/// Build the cookie value the HTTP session layer would set for `sid`.
pub fn encode_session_id(sid: &str, secret: &str) -> String {
    urlencoding::encode(&format!("{}{}", SIGNED_PREFIX, sign(sid, secret))).into_owned()
}

/// Find cookie `name` in a `Cookie` header value.
pub fn find(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() != name {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some(value.to_string())
    })
}

fn signature(value: &str, secret: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(value.as_bytes());
    STANDARD_NO_PAD.encode(mac.finalize().into_bytes())
}
