use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::error::AppError;
use super::routes::AppState;
use crate::actions::{ForgotPasswordAction, LoginAction, ResetPasswordAction};
use crate::api::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, ResetPasswordRequest, UserResponse,
    VerificationNoticeResponse, WebhookResponse, WhatsappForgotPasswordRequest,
    WhatsappResetPasswordRequest,
};
use crate::verification::InboundMessage;
use crate::{
    AccessLevel, AuthError, Cache, CookieSession, Mailer, Messenger, PasswordResetRepository,
    RequestContext, UserRepository,
};

const RESET_REQUESTED: &str = "If that account exists, reset instructions are on their way.";

pub async fn login<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    session: CookieSession,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    let sessions = state.sessions(session);
    let user = LoginAction::new(state.user_repo.clone(), state.hasher.clone())
        .execute(&sessions, &body.identifier, &body.password)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Open to every level; always answers 200.
pub async fn logout<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    session: CookieSession,
) -> Json<MessageResponse>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    // the invalidation task is left to finish on its own
    let _ = state.sessions(session).logout().await;

    Json(MessageResponse::new("Logged out"))
}

pub async fn me<U, P, C, M, L>(
    State(_state): State<AppState<U, P, C, M, L>>,
    ctx: RequestContext,
) -> Result<Json<UserResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    ctx.require(AccessLevel::AuthenticatedVerified)
        .map_err(AuthError::from)?;
    let user = ctx.into_user().ok_or(AuthError::NotAuthenticated)?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn verification_notice<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    ctx: RequestContext,
) -> Result<Json<VerificationNoticeResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    let user = ctx
        .require(AccessLevel::AuthenticatedUnverified)
        .map_err(AuthError::from)?;

    if user.is_verified() {
        return Ok(Json(VerificationNoticeResponse {
            verified: true,
            phone_number: user.phone_number.clone(),
            code: None,
            message: "Your phone number is verified.".to_owned(),
        }));
    }

    // cached records never carry the code
    let stored = state
        .user_repo
        .find_user_by_id(user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let message = if stored.verification_code.is_some() {
        "Open WhatsApp and tap the button showing this code."
    } else {
        "Request a verification message to continue."
    };

    Ok(Json(VerificationNoticeResponse {
        verified: false,
        phone_number: stored.phone_number,
        code: stored.verification_code,
        message: message.to_owned(),
    }))
}

pub async fn resend_verification<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    ctx: RequestContext,
) -> Result<(StatusCode, Json<MessageResponse>), AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    let user = ctx
        .require(AccessLevel::AuthenticatedUnverified)
        .map_err(AuthError::from)?;

    if user.is_verified() {
        return Ok((
            StatusCode::OK,
            Json(MessageResponse::new("Your phone number is already verified.")),
        ));
    }

    state.verification().send_phone_verification(user).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("A new verification message is on its way.")),
    ))
}

/// Answers the same whether or not the email is known.
pub async fn forgot_password<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    ForgotPasswordAction::new(
        state.user_repo.clone(),
        state.reset_tokens(),
        state.mailer.clone(),
        state.config.app_base_url.clone(),
    )
    .execute(&body.email)
    .await?;

    Ok(Json(MessageResponse::new(RESET_REQUESTED)))
}

pub async fn reset_password<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    ResetPasswordAction::new(
        state.user_repo.clone(),
        state.reset_tokens(),
        state.hasher.clone(),
        state.cache.clone(),
    )
    .execute(body.user_id, body.token_id, &body.token, &body.password)
    .await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// Answers the same whether or not a verified user owns the number.
pub async fn whatsapp_forgot_password<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    Json(body): Json<WhatsappForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    state
        .verification()
        .request_password_reset(&body.phone_number)
        .await?;

    Ok(Json(MessageResponse::new(RESET_REQUESTED)))
}

pub async fn whatsapp_reset_password<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    Json(body): Json<WhatsappResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    state
        .verification()
        .complete_password_reset(body.token.expose_secret(), &body.password)
        .await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// Rejections are answered to the sender on the chat channel, so the
/// provider always gets 200 unless a backend failed.
pub async fn whatsapp_webhook<U, P, C, M, L>(
    State(state): State<AppState<U, P, C, M, L>>,
    Json(message): Json<InboundMessage>,
) -> Result<Json<WebhookResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    let outcome = state.verification().handle_inbound(&message).await?;

    Ok(Json(WebhookResponse {
        outcome: outcome.name().to_owned(),
    }))
}

pub async fn admin_status<U, P, C, M, L>(
    State(_state): State<AppState<U, P, C, M, L>>,
    ctx: RequestContext,
) -> Result<Json<MessageResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    P: PasswordResetRepository + Clone + Send + Sync + 'static,
    C: Cache + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
    L: Mailer + Clone + Send + Sync + 'static,
{
    let admin = ctx.require(AccessLevel::Admin).map_err(AuthError::from)?;
    log::debug!(target: "verigate", "msg=\"admin status\" user_id={}", admin.id);

    Ok(Json(MessageResponse::new("ok")))
}
