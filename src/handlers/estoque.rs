// src/handlers/estoque.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery, OneOrMany},
        pagination::Lista,
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::estoque::{Estoque, EstoqueAtual, EstoqueAtualQuery, EstoqueInput, EstoqueQuery},
};

#[utoipa::path(
    get,
    path = "/estoque",
    tag = "Estoque",
    params(EstoqueQuery),
    responses((status = 200, description = "Saldos da loja", body = Lista<Estoque>))
)]
pub async fn listar(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<EstoqueQuery>,
) -> Result<impl IntoResponse, AppError> {
    let estoque = app_state
        .estoque_repo
        .listar(query.cod_loja, query.cod_produto)
        .await?;
    Ok((StatusCode::OK, Json(Lista::from(estoque))))
}

#[utoipa::path(
    get,
    path = "/estoque/atual",
    tag = "Estoque",
    params(EstoqueAtualQuery),
    responses((status = 200, description = "Saldo atual; quantidade nula sem registro", body = EstoqueAtual))
)]
pub async fn atual(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<EstoqueAtualQuery>,
) -> Result<impl IntoResponse, AppError> {
    let quantidade = app_state
        .estoque_repo
        .quantidade_atual(query.cod_loja, query.cod_produto)
        .await?;

    Ok((
        StatusCode::OK,
        Json(EstoqueAtual {
            cod_loja: query.cod_loja,
            cod_produto: query.cod_produto,
            quantidade,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/estoque/cadastrar",
    tag = "Estoque",
    request_body = Vec<EstoqueInput>,
    responses(
        (status = 201, description = "Lote reconciliado", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<EstoqueInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.estoque_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}
