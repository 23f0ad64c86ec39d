use chrono::Utc;
use http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::session::config::CSRF_COOKIE_NAME;
use crate::session::errors::SessionError;
use crate::session::types::{CSRF_SECRET_KEY, CsrfToken};
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes, header_set_cookie};

use super::session::Session;

const CSRF_SECRET_BYTES: usize = 32;

async fn current_secret(session: &Session) -> Option<(String, Vec<u8>)> {
    let encoded = session.get_string(CSRF_SECRET_KEY).await?;
    let bytes = base64url_decode(&encoded).ok()?;
    (bytes.len() == CSRF_SECRET_BYTES).then_some((encoded, bytes))
}

/// Masks the secret with a fresh one-time pad: `pad || pad ^ secret`.
fn mask_secret(secret: &[u8]) -> Result<String, SessionError> {
    let pad = gen_random_bytes(secret.len())?;
    let mut token = pad.clone();
    token.extend(pad.iter().zip(secret).map(|(p, s)| p ^ s));
    Ok(base64url_encode(&token))
}

/// Recovers the secret from a masked token. A token of secret length is taken as unmasked.
fn unmask_token(token: &str) -> Option<Vec<u8>> {
    let bytes = base64url_decode(token).ok()?;
    match bytes.len() {
        CSRF_SECRET_BYTES => Some(bytes),
        n if n == 2 * CSRF_SECRET_BYTES => {
            let (pad, masked) = bytes.split_at(CSRF_SECRET_BYTES);
            Some(pad.iter().zip(masked).map(|(p, m)| p ^ m).collect())
        }
        _ => None,
    }
}

/// Makes a token available for the page being rendered.
///
/// Creates the session secret on first use. The returned headers carry the
/// double-submit cookie whenever the request did not already present the
/// current secret in it.
pub async fn issue_csrf_token(
    session: &Session,
    cookie_secret: Option<&str>,
) -> Result<(CsrfToken, HeaderMap), SessionError> {
    let (encoded, secret) = match current_secret(session).await {
        Some(found) => found,
        None => {
            let secret = gen_random_bytes(CSRF_SECRET_BYTES)?;
            let encoded = base64url_encode(&secret);
            session.put(CSRF_SECRET_KEY, &encoded).await?;
            tracing::debug!("Created CSRF secret for session");
            (encoded, secret)
        }
    };

    let token = CsrfToken::new(mask_secret(&secret)?);

    let mut headers = HeaderMap::new();
    if cookie_secret != Some(encoded.as_str()) {
        let max_age = (session.expires_at().await - Utc::now()).num_seconds().max(1);
        header_set_cookie(&mut headers, CSRF_COOKIE_NAME.as_str(), &encoded, max_age)?;
    }

    Ok((token, headers))
}

/// Checks a state-changing request against the session secret.
///
/// Both the double-submit cookie and the submitted token must match the
/// secret. Comparisons run in constant time. The session is never written.
pub async fn verify_csrf_token(
    session: &Session,
    submitted: Option<&str>,
    cookie_secret: Option<&str>,
) -> Result<(), SessionError> {
    let Some((encoded, secret)) = current_secret(session).await else {
        return Err(SessionError::CsrfToken(
            "No CSRF secret in session".to_string(),
        ));
    };

    let cookie_secret = cookie_secret
        .ok_or_else(|| SessionError::CsrfToken("No CSRF cookie found".to_string()))?;
    if !bool::from(cookie_secret.as_bytes().ct_eq(encoded.as_bytes())) {
        return Err(SessionError::CsrfToken("CSRF cookie mismatch".to_string()));
    }

    let submitted =
        submitted.ok_or_else(|| SessionError::CsrfToken("No CSRF token found".to_string()))?;
    let candidate = unmask_token(submitted)
        .ok_or_else(|| SessionError::CsrfToken("Malformed CSRF token".to_string()))?;

    if !bool::from(candidate.ct_eq(&secret)) {
        return Err(SessionError::CsrfToken("CSRF token mismatch".to_string()));
    }

    Ok(())
}
