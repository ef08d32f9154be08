// src/handlers/produtos.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery, OneOrMany},
        pagination::{Lista, Pagina, Paginacao},
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::{
        auth::MensagemResponse,
        produto::{
            parece_codigo_barras, AtualizarProdutoPayload, BuscaProdutoQuery, Ean, LojaQuery, Produto, ProdutoInput,
        },
    },
};

// ---
// Handler: search
// ---
// Sem `q`: lista paginada. Leitura de scanner: código de barras exato.
// Demais casos: nome (ILIKE) ou código.
#[utoipa::path(
    get,
    path = "/produtos/search",
    tag = "Produtos",
    params(BuscaProdutoQuery),
    responses((status = 200, description = "Produtos encontrados", body = Pagina<Produto>))
)]
pub async fn buscar(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<BuscaProdutoQuery>,
) -> Result<impl IntoResponse, AppError> {
    let paginacao = Paginacao::new(query.limit, query.offset);
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();

    let pagina = if q.is_empty() {
        let (total, produtos) = app_state.produto_repo.listar(query.cod_loja, paginacao).await?;
        Pagina::new(total, produtos, paginacao)
    } else if parece_codigo_barras(q) {
        let produtos = app_state
            .produto_repo
            .buscar_por_codigo_barras(query.cod_loja, q)
            .await?;
        Pagina::completa(produtos)
    } else {
        let (total, produtos) = app_state
            .produto_repo
            .buscar_por_texto(query.cod_loja, q, paginacao)
            .await?;
        Pagina::new(total, produtos, paginacao)
    };

    Ok((StatusCode::OK, Json(pagina)))
}

#[utoipa::path(
    get,
    path = "/produtos/eans",
    tag = "Produtos",
    params(LojaQuery),
    responses((status = 200, description = "EANs secundários da loja", body = Lista<Ean>))
)]
pub async fn listar_eans(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<LojaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let eans = app_state.produto_repo.listar_eans(query.cod_loja).await?;
    Ok((StatusCode::OK, Json(Lista::from(eans))))
}

#[utoipa::path(
    post,
    path = "/produtos/cadastrar",
    tag = "Produtos",
    request_body = Vec<ProdutoInput>,
    responses(
        (status = 201, description = "Lote reconciliado (produtos e EANs)", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<ProdutoInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.produto_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}

#[utoipa::path(
    put,
    path = "/produtos/{id}",
    tag = "Produtos",
    request_body = AtualizarProdutoPayload,
    params(("id" = i32, Path, description = "Id interno do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Produto),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn atualizar(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AtualizarProdutoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let produto = app_state.produto_service.atualizar(id, &payload).await?;
    Ok((StatusCode::OK, Json(produto)))
}

#[utoipa::path(
    delete,
    path = "/produtos/{id}",
    tag = "Produtos",
    params(("id" = i32, Path, description = "Id interno do produto")),
    responses(
        (status = 200, description = "Produto e EANs removidos", body = MensagemResponse),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn remover(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.produto_service.remover(id).await?;

    Ok((
        StatusCode::OK,
        Json(MensagemResponse {
            message: "Produto removido com sucesso.".into(),
        }),
    ))
}

// ---
// Handler: /eans (mesma consulta, rota própria)
// ---
#[utoipa::path(
    get,
    path = "/eans",
    tag = "Produtos",
    params(LojaQuery),
    responses((status = 200, description = "EANs secundários da loja", body = Lista<Ean>))
)]
pub async fn eans(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<LojaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let eans = app_state.produto_repo.listar_eans(query.cod_loja).await?;
    Ok((StatusCode::OK, Json(Lista::from(eans))))
}
