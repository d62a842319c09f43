//! Signed cookie codec for session values.
//!
//! The cookie holds `{base64url(json)}.{hex(hmac_sha256)}`. The values are
//! readable by the client but any change breaks the signature. The signed
//! body carries its own expiry, so a copied cookie stops working after the
//! session lifetime whatever the client does with `Max-Age`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{SessionConfig, SessionValues};
use crate::SecretString;
use crate::crypto::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct SignedBody {
    authenticated: bool,
    user_id: Option<i64>,
    /// Unix seconds.
    exp: i64,
}

/// Serializes and signs session values for the cookie body, valid until
/// `expires_at`.
pub fn sign_session_values(
    values: &SessionValues,
    expires_at: DateTime<Utc>,
    secret: &SecretString,
) -> String {
    let body = SignedBody {
        authenticated: values.authenticated,
        user_id: values.user_id,
        exp: expires_at.timestamp(),
    };
    // a bool and two integers; serializing cannot fail
    let json = serde_json::to_vec(&body).unwrap_or_default();
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = compute_hmac(payload.as_bytes(), secret.expose_secret().as_bytes());
    format!("{}.{}", payload, hex::encode(signature))
}

/// Verifies a signed cookie value and decodes the session values.
///
/// Returns `None` if the signature is invalid, the payload does not parse,
/// or the signed expiry has passed.
pub fn verify_signed_cookie(cookie_value: &str, secret: &SecretString) -> Option<SessionValues> {
    let (payload, signature_hex) = cookie_value.rsplit_once('.')?;

    let actual_sig = hex::decode(signature_hex).ok()?;
    let expected_sig = compute_hmac(payload.as_bytes(), secret.expose_secret().as_bytes());

    if !constant_time_eq(&expected_sig, &actual_sig) {
        log::warn!(target: "verigate::session", "msg=\"session cookie tampered\" cookie_prefix=\"{}...\"", &cookie_value.chars().take(8).collect::<String>());
        return None;
    }

    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let body: SignedBody = serde_json::from_slice(&json).ok()?;

    if body.exp <= Utc::now().timestamp() {
        log::debug!(target: "verigate::session", "msg=\"session cookie expired\" user_id={:?}", body.user_id);
        return None;
    }

    Some(SessionValues {
        authenticated: body.authenticated,
        user_id: body.user_id,
    })
}

/// `Set-Cookie` header value carrying the signed session.
pub fn session_cookie_header(signed_value: &str, config: &SessionConfig) -> String {
    let max_age = config.session_lifetime.num_seconds();
    let mut header = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        config.cookie_name,
        signed_value,
        config.cookie_path,
        max_age,
        config.cookie_same_site.as_str()
    );
    push_attributes(&mut header, config);
    header
}

/// `Set-Cookie` header value that tells the client to drop the session.
pub fn removal_cookie_header(config: &SessionConfig) -> String {
    let mut header = format!(
        "{}=; Path={}; Max-Age=-1; SameSite={}",
        config.cookie_name,
        config.cookie_path,
        config.cookie_same_site.as_str()
    );
    push_attributes(&mut header, config);
    header
}

fn push_attributes(header: &mut String, config: &SessionConfig) {
    if let Some(ref domain) = config.cookie_domain {
        header.push_str("; Domain=");
        header.push_str(domain);
    }
    if config.cookie_http_only {
        header.push_str("; HttpOnly");
    }
    if config.cookie_secure {
        header.push_str("; Secure");
    }
}

/// Finds the named cookie in a `Cookie` request header.
pub fn find_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Computes HMAC-SHA256.
fn compute_hmac(message: &[u8], key: &[u8]) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length, so this cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn secret() -> SecretString {
        SecretString::new("test-secret-key-that-is-long-enough")
    }

    fn in_two_hours() -> DateTime<Utc> {
        Utc::now() + Duration::hours(2)
    }

    fn logged_in(user_id: i64) -> SessionValues {
        SessionValues {
            authenticated: true,
            user_id: Some(user_id),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let signed = sign_session_values(&logged_in(42), in_two_hours(), &secret());
        assert_eq!(verify_signed_cookie(&signed, &secret()), Some(logged_in(42)));
    }

    #[test]
    fn test_tampered_payload() {
        let signed = sign_session_values(&logged_in(42), in_two_hours(), &secret());
        let signature = signed.rsplit_once('.').unwrap().1;

        let forged = sign_session_values(&logged_in(1), in_two_hours(), &secret());
        let forged_payload = forged.rsplit_once('.').unwrap().0;
        let tampered = format!("{forged_payload}.{signature}");

        assert!(verify_signed_cookie(&tampered, &secret()).is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let other = SecretString::new("secret-key-two-that-is-long-enough");
        let signed = sign_session_values(&logged_in(42), in_two_hours(), &secret());
        assert!(verify_signed_cookie(&signed, &other).is_none());
    }

    #[test]
    fn test_expired_cookie() {
        let signed = sign_session_values(
            &logged_in(42),
            Utc::now() - Duration::seconds(1),
            &secret(),
        );
        assert!(verify_signed_cookie(&signed, &secret()).is_none());
    }

    #[test]
    fn test_cookie_without_expiry_rejected() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"authenticated":true,"user_id":42}"#);
        let signature = compute_hmac(
            payload.as_bytes(),
            secret().expose_secret().as_bytes(),
        );
        let unexpiring = format!("{payload}.{}", hex::encode(signature));

        assert!(verify_signed_cookie(&unexpiring, &secret()).is_none());
    }

    #[test]
    fn test_malformed_cookie() {
        assert!(verify_signed_cookie("noseparator", &secret()).is_none());
        assert!(verify_signed_cookie("session.notahexsignature", &secret()).is_none());
    }

    #[test]
    fn test_cookie_headers() {
        let config = SessionConfig::new("test-secret-key-that-is-long-enough");

        let set = session_cookie_header("abc.def", &config);
        assert!(set.starts_with("verigate_session=abc.def; Path=/; Max-Age=7200"));
        assert!(set.contains("SameSite=Lax"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Secure"));

        let removal = removal_cookie_header(&config);
        assert!(removal.starts_with("verigate_session=; Path=/; Max-Age=-1"));
    }

    #[test]
    fn test_find_cookie() {
        let header = "theme=dark; verigate_session=abc.def; other=1";
        assert_eq!(find_cookie(header, "verigate_session"), Some("abc.def"));
        assert_eq!(find_cookie(header, "missing"), None);
    }
}
