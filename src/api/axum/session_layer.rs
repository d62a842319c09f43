use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use super::error::AppError;
use crate::session::{
    CookieAction, SessionConfig, find_cookie, removal_cookie_header, session_cookie_header,
    sign_session_values,
};
use crate::{AuthError, CookieSession};

/// Loads the signed session cookie into a [`CookieSession`] request
/// extension, runs the handler, then writes back whatever the handler did
/// to the session.
///
/// Install with `axum::middleware::from_fn_with_state(session_config, session_layer)`.
pub async fn session_layer(
    State(config): State<SessionConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie = request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| find_cookie(header, &config.cookie_name))
        .map(ToOwned::to_owned);

    let session = CookieSession::from_cookie(cookie.as_deref(), &config.secret_key);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let header = match session.pending() {
        Ok((CookieAction::Unchanged, _)) => return response,
        Ok((CookieAction::Set, values)) => session_cookie_header(
            &sign_session_values(
                &values,
                Utc::now() + config.session_lifetime,
                &config.secret_key,
            ),
            &config,
        ),
        Ok((CookieAction::Remove, _)) => removal_cookie_header(&config),
        Err(e) => return AppError(e).into_response(),
    };

    match HeaderValue::from_str(&header) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
            response
        }
        Err(_) => AppError(AuthError::SessionError(
            "session cookie is not a valid header value".to_owned(),
        ))
        .into_response(),
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CookieSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CookieSession>().cloned().ok_or_else(|| {
            AppError(AuthError::SessionError(
                "session layer is not installed".to_owned(),
            ))
        })
    }
}
