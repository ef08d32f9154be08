// src/handlers/lojas.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, OneOrMany},
        pagination::Lista,
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::{
        auth::MensagemResponse,
        loja::{AtualizarLojaPayload, Loja, LojaInput},
    },
};

fn loja_nao_encontrada() -> AppError {
    AppError::NotFound("Loja nao encontrada.".into())
}

#[utoipa::path(
    get,
    path = "/lojas",
    tag = "Lojas",
    responses((status = 200, description = "Lojas ordenadas por nome", body = Lista<Loja>))
)]
pub async fn listar(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let lojas = app_state.loja_repo.listar().await?;
    Ok((StatusCode::OK, Json(Lista::from(lojas))))
}

#[utoipa::path(
    post,
    path = "/lojas/cadastrar",
    tag = "Lojas",
    request_body = Vec<LojaInput>,
    responses(
        (status = 201, description = "Lote reconciliado", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<LojaInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.loja_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}

#[utoipa::path(
    put,
    path = "/lojas/{id}",
    tag = "Lojas",
    request_body = AtualizarLojaPayload,
    params(("id" = i32, Path, description = "Id interno da loja")),
    responses(
        (status = 200, description = "Loja atualizada", body = Loja),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn atualizar(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AtualizarLojaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let loja = app_state
        .loja_repo
        .atualizar_por_id(id, &payload)
        .await?
        .ok_or_else(loja_nao_encontrada)?;
    Ok((StatusCode::OK, Json(loja)))
}

#[utoipa::path(
    delete,
    path = "/lojas/{id}",
    tag = "Lojas",
    params(("id" = i32, Path, description = "Id interno da loja")),
    responses(
        (status = 200, description = "Loja removida", body = MensagemResponse),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn remover(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.loja_repo.remover_por_id(id).await? {
        return Err(loja_nao_encontrada());
    }

    tracing::info!("Loja {} removida", id);
    Ok((
        StatusCode::OK,
        Json(MensagemResponse {
            message: "Loja removida com sucesso.".into(),
        }),
    ))
}
