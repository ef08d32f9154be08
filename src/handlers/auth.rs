// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{error::AppError, extract::AppJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::{
            EsqueciSenhaPayload, LoginPayload, LoginResponse, MensagemResponse, PrimeiroAcessoPayload,
            RecuperacaoIniciada, RedefinirSenhaPayload,
        },
        usuario::Usuario,
    },
};

// ---
// Handler: login
// ---
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Sessão aberta ou primeiro acesso pendente", body = LoginResponse),
        (status = 401, description = "Usuário não encontrado ou senha incorreta")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resposta = app_state.auth_service.login(&payload).await?;
    Ok((StatusCode::OK, Json(resposta)))
}

// ---
// Handler: primeiro acesso (define a senha inicial)
// ---
#[utoipa::path(
    post,
    path = "/auth/first-access",
    tag = "Auth",
    request_body = PrimeiroAcessoPayload,
    responses(
        (status = 200, description = "Senha definida", body = MensagemResponse),
        (status = 400, description = "Usuário já possui senha"),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn primeiro_acesso(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<PrimeiroAcessoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resposta = app_state.auth_service.primeiro_acesso(&payload).await?;
    Ok((StatusCode::OK, Json(resposta)))
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Auth",
    request_body = EsqueciSenhaPayload,
    responses(
        (status = 200, description = "Código gerado e enviado pelos canais configurados", body = RecuperacaoIniciada),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn esqueci_senha(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<EsqueciSenhaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resposta = app_state.auth_service.esqueci_senha(&payload).await?;
    Ok((StatusCode::OK, Json(resposta)))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "Auth",
    request_body = RedefinirSenhaPayload,
    responses(
        (status = 200, description = "Senha redefinida", body = MensagemResponse),
        (status = 400, description = "Token inválido ou expirado")
    )
)]
pub async fn redefinir_senha(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<RedefinirSenhaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resposta = app_state.auth_service.redefinir_senha(&payload).await?;
    Ok((StatusCode::OK, Json(resposta)))
}

// ---
// Handler: me (protegido pelo auth_guard)
// ---
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = Usuario),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn me(user: AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(user.0)))
}
