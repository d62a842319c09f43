use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::AppError;
use super::routes::AppState;
use crate::{
    AuthError, Cache, CookieSession, Mailer, Messenger, PasswordResetRepository, RequestContext,
    UserRepository,
};

/// Classifies the request from its session.
///
/// Never rejects for lack of a session: handlers call
/// [`RequestContext::require`] with the level they need. A session that
/// points at a deleted user is purged and the request continues anonymous.
impl<U, P, C, M, L> FromRequestParts<AppState<U, P, C, M, L>> for RequestContext
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<U, P, C, M, L>,
    ) -> Result<Self, Self::Rejection> {
        let session = CookieSession::from_request_parts(parts, state).await?;
        let sessions = state.sessions(session);

        let user_id = match sessions.authenticated_user_id().await {
            Ok(user_id) => user_id,
            Err(AuthError::NotAuthenticated) => return Ok(RequestContext::anonymous()),
            Err(e) => return Err(AppError(e)),
        };

        match state.current_user().find(user_id).await {
            Ok(user) => Ok(RequestContext::new(Some(user))),
            Err(AuthError::UserNotFound) => {
                sessions.purge(user_id).await?;
                Ok(RequestContext::anonymous())
            }
            Err(e) => Err(AppError(e)),
        }
    }
}
