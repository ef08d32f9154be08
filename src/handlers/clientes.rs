// src/handlers/clientes.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery, OneOrMany},
        pagination::{Pagina, Paginacao},
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::cliente::{BuscaClienteQuery, Cliente, ClienteInput},
};

// Busca por nome, código exato ou CPF/CNPJ (comparando só os dígitos).
#[utoipa::path(
    get,
    path = "/clientes/search",
    tag = "Clientes",
    params(BuscaClienteQuery),
    responses((status = 200, description = "Clientes encontrados", body = Pagina<Cliente>))
)]
pub async fn buscar(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<BuscaClienteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let paginacao = Paginacao::new(query.limit, query.offset);
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();

    let (total, clientes) = app_state
        .cliente_repo
        .buscar(query.cod_loja, q, paginacao)
        .await?;
    Ok((StatusCode::OK, Json(Pagina::new(total, clientes, paginacao))))
}

#[utoipa::path(
    post,
    path = "/clientes/cadastrar",
    tag = "Clientes",
    request_body = Vec<ClienteInput>,
    responses(
        (status = 201, description = "Lote reconciliado", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<ClienteInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.cliente_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}
