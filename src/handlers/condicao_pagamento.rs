// src/handlers/condicao_pagamento.rs
// Servido em /condicao-pagamento e no alias /condpag.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery, OneOrMany},
        pagination::Lista,
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::{
        condicao_pagamento::{CondicaoPagamento, CondicaoPagamentoInput},
        produto::LojaQuery,
    },
};

#[utoipa::path(
    get,
    path = "/condicao-pagamento",
    tag = "Condicao de pagamento",
    params(LojaQuery),
    responses((status = 200, description = "Condições da loja", body = Lista<CondicaoPagamento>))
)]
pub async fn listar(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<LojaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let condicoes = app_state.condicao_pagamento_repo.listar(query.cod_loja).await?;
    Ok((StatusCode::OK, Json(Lista::from(condicoes))))
}

#[utoipa::path(
    get,
    path = "/condicao-pagamento/{id}",
    tag = "Condicao de pagamento",
    params(("id" = i32, Path, description = "Id interno da condição")),
    responses(
        (status = 200, description = "Condição de pagamento", body = CondicaoPagamento),
        (status = 404, description = "Não encontrada")
    )
)]
pub async fn buscar(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let condicao = app_state
        .condicao_pagamento_repo
        .buscar_por_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Condicao de pagamento nao encontrada.".into()))?;
    Ok((StatusCode::OK, Json(condicao)))
}

#[utoipa::path(
    post,
    path = "/condicao-pagamento/cadastrar",
    tag = "Condicao de pagamento",
    request_body = Vec<CondicaoPagamentoInput>,
    responses(
        (status = 201, description = "Lote reconciliado", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<CondicaoPagamentoInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.condicao_pagamento_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}
