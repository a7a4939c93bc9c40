//! OAuth 1.0a (HMAC-SHA1) request signing for the posting provider.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{digest::InvalidLength, Hmac, Mac};
use itertools::Itertools;
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;

use crate::config::TwitterCredentials;

type HmacSha1 = Hmac<Sha1>;

/// Per-request values; random in production, fixed in tests.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Nonce {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `METHOD&url&sorted-params`, every part percent-encoded.
pub fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let normalized = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .sorted()
        .map(|(k, v)| format!("{}={}", k, v))
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&normalized)
    )
}

pub fn sign(
    base: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, InvalidLength> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value for the `Authorization` header. `extra` holds query or form
/// parameters that take part in the signature; JSON bodies do not.
pub fn authorization_header(
    method: &str,
    url: &str,
    extra: &[(&str, &str)],
    creds: &TwitterCredentials,
    nonce: &Nonce,
) -> Result<String, InvalidLength> {
    let timestamp = nonce.timestamp.to_string();
    let oauth = [
        ("oauth_consumer_key", creds.app_key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", creds.oauth_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let params: Vec<(&str, &str)> = oauth.iter().chain(extra.iter()).copied().collect();
    let base = signature_base(method, url, &params);
    let signature = sign(&base, &creds.app_secret, &creds.oauth_secret)?;

    let fields = oauth
        .iter()
        .copied()
        .chain(std::iter::once(("oauth_signature", signature.as_str())))
        .sorted()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .join(", ");
    Ok(format!("OAuth {}", fields))
}
