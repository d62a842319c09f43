use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use super::handlers;
use super::session_layer::session_layer;
use crate::actions::{GetAuthenticatedUserAction, ResetTokenService};
use crate::jwt::JwtService;
use crate::session::SessionConfig;
use crate::{
    Argon2Hasher, Cache, CookieSession, Mailer, Messenger, PasswordResetRepository,
    SessionManager, UserRepository, VerificationService, VerigateConfig,
};

const FALLBACK_INVALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState<U, P, C, M, L> {
    pub user_repo: U,
    pub password_reset: P,
    pub cache: C,
    pub messenger: M,
    pub mailer: L,
    pub jwt: JwtService,
    pub hasher: Argon2Hasher,
    pub config: VerigateConfig,
    pub session_config: SessionConfig,
}

impl<U, P, C, M, L> AppState<U, P, C, M, L>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: U,
        password_reset: P,
        cache: C,
        messenger: M,
        mailer: L,
        jwt: JwtService,
        config: VerigateConfig,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            user_repo,
            password_reset,
            cache,
            messenger,
            mailer,
            jwt,
            hasher: Argon2Hasher::default(),
            config,
            session_config,
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Argon2Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub(super) fn sessions(&self, session: CookieSession) -> SessionManager<CookieSession, C> {
        let timeout = self
            .config
            .cache_invalidation_timeout
            .to_std()
            .unwrap_or(FALLBACK_INVALIDATION_TIMEOUT);
        SessionManager::new(session, self.cache.clone()).with_invalidation_timeout(timeout)
    }

    pub(super) fn current_user(&self) -> GetAuthenticatedUserAction<U, C> {
        GetAuthenticatedUserAction::new(
            self.user_repo.clone(),
            self.cache.clone(),
            self.config.user_cache_ttl,
        )
    }

    pub(super) fn reset_tokens(&self) -> ResetTokenService<P, Argon2Hasher> {
        ResetTokenService::new(
            self.password_reset.clone(),
            self.hasher.clone(),
            self.config.reset_token_length,
            self.config.tokens.password_reset_expiry,
        )
    }

    pub(super) fn verification(&self) -> VerificationService<U, C, M, Argon2Hasher> {
        VerificationService::new(
            self.user_repo.clone(),
            self.cache.clone(),
            self.messenger.clone(),
            self.jwt.clone(),
            self.hasher.clone(),
            self.config.app_base_url.clone(),
        )
    }
}

/// Every route with the session cookie layer applied and the state bound.
pub fn router<U, P, C, M, L>(state: AppState<U, P, C, M, L>) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    auth_routes()
        .layer(from_fn_with_state(
            state.session_config.clone(),
            session_layer,
        ))
        .with_state(state)
}

/// Route table without the session layer, for nesting under a caller's
/// router. The caller must install [`session_layer`] around it.
pub fn auth_routes<U, P, C, M, L>() -> Router<AppState<U, P, C, M, L>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(public_routes())
        .merge(private_routes())
}

pub fn public_routes<U, P, C, M, L>() -> Router<AppState<U, P, C, M, L>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/login", post(handlers::login::<U, P, C, M, L>))
        .route("/logout", post(handlers::logout::<U, P, C, M, L>))
        .route(
            "/forgot-password",
            post(handlers::forgot_password::<U, P, C, M, L>),
        )
        .route(
            "/reset-password",
            post(handlers::reset_password::<U, P, C, M, L>),
        )
        .route(
            "/forgot-password/whatsapp",
            post(handlers::whatsapp_forgot_password::<U, P, C, M, L>),
        )
        .route(
            "/reset-password/whatsapp",
            post(handlers::whatsapp_reset_password::<U, P, C, M, L>),
        )
        .route(
            "/webhooks/whatsapp",
            post(handlers::whatsapp_webhook::<U, P, C, M, L>),
        )
}

/// Routes behind the gate; each handler declares its minimum access level.
pub fn private_routes<U, P, C, M, L>() -> Router<AppState<U, P, C, M, L>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/me", get(handlers::me::<U, P, C, M, L>))
        .route(
            "/verification-notice",
            get(handlers::verification_notice::<U, P, C, M, L>),
        )
        .route(
            "/verification/resend",
            post(handlers::resend_verification::<U, P, C, M, L>),
        )
        .route("/admin/status", get(handlers::admin_status::<U, P, C, M, L>))
}
