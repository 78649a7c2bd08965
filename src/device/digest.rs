//! RFC 2617 digest challenge parsing and response computation.
//!
//! Only `algorithm=MD5` (or no algorithm) and `qop=auth` (or no qop) are
//! answered; anything else is reported as an unsupported scheme.

use std::collections::HashMap;

use md5::{Digest, Md5};
use uuid::Uuid;

use crate::error::AuthError;

/// The client only ever sends one request per nonce.
pub const NONCE_COUNT: &str = "00000001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
}

impl DigestChallenge {
    /// Parse a full `WWW-Authenticate` header value (`Digest realm="…", …`).
    pub fn from_header(value: &str) -> Result<Self, AuthError> {
        let value = value.trim();
        let (scheme, params) = value.split_once(char::is_whitespace).unwrap_or((value, ""));

        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(AuthError::AuthSchemeUnsupported(scheme.to_string()));
        }

        Self::parse(params)
    }

    /// Parse the parameter list that follows the `Digest` scheme token.
    pub fn parse(params: &str) -> Result<Self, AuthError> {
        let mut map = parse_params(params);

        let realm = map
            .remove("realm")
            .ok_or_else(|| AuthError::MalformedChallenge("missing realm".into()))?;
        let nonce = map
            .remove("nonce")
            .ok_or_else(|| AuthError::MalformedChallenge("missing nonce".into()))?;

        let algorithm = map.remove("algorithm");
        if let Some(alg) = &algorithm {
            if !alg.eq_ignore_ascii_case("md5") {
                return Err(AuthError::AuthSchemeUnsupported(format!("Digest algorithm={alg}")));
            }
        }

        let qop = match map.remove("qop") {
            None => None,
            Some(offered) => {
                let supports_auth = offered
                    .split(',')
                    .map(str::trim)
                    .any(|q| q.eq_ignore_ascii_case("auth"));
                if !supports_auth {
                    return Err(AuthError::AuthSchemeUnsupported(format!("Digest qop={offered}")));
                }
                Some("auth".to_string())
            }
        };

        Ok(Self {
            realm,
            nonce,
            qop,
            opaque: map.remove("opaque"),
            algorithm,
        })
    }
}

/// Split a comma separated parameter list, ignoring commas inside quotes.
pub fn split_params(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }

    parts
}

/// `key=value` pairs with lower-cased keys and unquoted values.
pub fn parse_params(input: &str) -> HashMap<String, String> {
    split_params(input)
        .into_iter()
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_ascii_lowercase(), unquote(value.trim())))
        })
        .collect()
}

/// Inverse of `unquote`: wraps in quotes, escaping `"` and `\\`.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Request digest for `challenge`. `cnonce` is only used when qop is present.
pub fn response_hash(
    challenge: &DigestChallenge,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> String {
    let ha1 = md5_hex(&format!("{username}:{}:{password}", challenge.realm));
    let ha2 = md5_hex(&format!("{method}:{uri}"));

    match &challenge.qop {
        Some(qop) => md5_hex(&format!(
            "{ha1}:{}:{NONCE_COUNT}:{cnonce}:{qop}:{ha2}",
            challenge.nonce
        )),
        None => md5_hex(&format!("{ha1}:{}:{ha2}", challenge.nonce)),
    }
}

/// Full `Authorization` header value answering `challenge`.
pub fn authorization(
    challenge: &DigestChallenge,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> String {
    let response = response_hash(challenge, username, password, method, uri, cnonce);

    let mut header = format!(
        "Digest username={}, realm={}, nonce={}, uri={}",
        quote(username),
        quote(&challenge.realm),
        quote(&challenge.nonce),
        quote(uri)
    );

    if let Some(alg) = &challenge.algorithm {
        header.push_str(&format!(", algorithm={alg}"));
    }

    if let Some(qop) = &challenge.qop {
        header.push_str(&format!(", qop={qop}, nc={NONCE_COUNT}, cnonce=\"{cnonce}\""));
    }

    header.push_str(&format!(", response=\"{response}\""));

    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(", opaque={}", quote(opaque)));
    }

    header
}

/// Fresh 128-bit client nonce, hex encoded.
pub fn new_cnonce() -> String {
    Uuid::new_v4().to_simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc_challenge() -> DigestChallenge {
        DigestChallenge::from_header(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap()
    }

    #[test]
    fn rfc2617_reference_response() {
        let challenge = rfc_challenge();
        assert_eq!(challenge.qop.as_deref(), Some("auth"));

        let response = response_hash(
            &challenge,
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            "0a4f113b",
        );
        assert_eq!(response, "6629fae49393a05397450978507c4ef1");
    }

    #[test]
    fn rfc2617_intermediate_hashes() {
        assert_eq!(
            md5_hex("Mufasa:testrealm@host.com:Circle Of Life"),
            "939e7578ed9e3c518a452acee763bce9"
        );
        assert_eq!(
            md5_hex("GET:/dir/index.html"),
            "39aff3a2bab6126f332b942af96d3366"
        );
    }

    #[test]
    fn header_carries_qop_fields_and_opaque() {
        let challenge = rfc_challenge();
        let header = authorization(
            &challenge,
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            "0a4f113b",
        );

        assert!(header.starts_with("Digest username=\"Mufasa\""));
        assert!(header.contains("qop=auth, nc=00000001, cnonce=\"0a4f113b\""));
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.ends_with("opaque=\"5ccc069c403ebaf9f0171e9517f40e41\""));
    }

    #[test]
    fn no_qop_uses_legacy_response() {
        let challenge =
            DigestChallenge::from_header(r#"Digest realm="IP Camera", nonce="abc123""#).unwrap();
        assert_eq!(challenge.qop, None);

        let ha1 = md5_hex("admin:IP Camera:secret");
        let ha2 = md5_hex("POST:/ISAPI/AccessControl/AcsEvent?format=json");
        let expected = md5_hex(&format!("{ha1}:abc123:{ha2}"));

        let header = authorization(
            &challenge,
            "admin",
            "secret",
            "POST",
            "/ISAPI/AccessControl/AcsEvent?format=json",
            "ignored",
        );
        assert!(header.contains(&format!("response=\"{expected}\"")));
        assert!(!header.contains("qop="));
        assert!(!header.contains("cnonce"));
    }

    #[test]
    fn quoted_value_may_contain_commas() {
        let params = parse_params(r#"realm="Door, Main Gate", nonce="n1", qop=auth"#);
        assert_eq!(params["realm"], "Door, Main Gate");
        assert_eq!(params["nonce"], "n1");
        assert_eq!(params["qop"], "auth");
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let params = parse_params(r#"realm="say \"hi\", ok", nonce="n""#);
        assert_eq!(params["realm"], r#"say "hi", ok"#);
        assert_eq!(params["nonce"], "n");
    }

    #[test]
    fn header_escapes_quoted_values() {
        let challenge = DigestChallenge::from_header(
            r#"Digest realm="say \"hi\"", nonce="a\\b", qop="auth", opaque="o\"p""#,
        )
        .unwrap();
        assert_eq!(challenge.realm, r#"say "hi""#);

        let header = authorization(&challenge, "admin", "pw", "GET", "/ISAPI", "c1");
        assert!(header.contains(r#"realm="say \"hi\"""#));
        assert!(header.contains(r#"nonce="a\\b""#));
        assert!(header.contains(r#"opaque="o\"p""#));

        let params = parse_params(header.trim_start_matches("Digest "));
        assert_eq!(params["realm"], challenge.realm);
        assert_eq!(params["nonce"], r"a\b");
        assert_eq!(params["opaque"], r#"o"p"#);
    }

    #[test]
    fn basic_challenge_is_rejected() {
        let err = DigestChallenge::from_header(r#"Basic realm="device""#).unwrap_err();
        assert!(matches!(err, AuthError::AuthSchemeUnsupported(s) if s == "Basic"));
    }

    #[test]
    fn missing_nonce_is_malformed() {
        let err = DigestChallenge::from_header(r#"Digest realm="device""#).unwrap_err();
        assert!(matches!(err, AuthError::MalformedChallenge(_)));
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let err = DigestChallenge::from_header(
            r#"Digest realm="r", nonce="n", algorithm=SHA-256"#,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::AuthSchemeUnsupported(_)));
    }

    #[test]
    fn scheme_match_is_case_insensitive() {
        let challenge = DigestChallenge::from_header(r#"digest realm="r", nonce="n""#).unwrap();
        assert_eq!(challenge.realm, "r");
    }

    #[test]
    fn cnonce_is_fresh_hex() {
        let a = new_cnonce();
        let b = new_cnonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
