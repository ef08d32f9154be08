// src/handlers/pedidos.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery},
        pagination::Lista,
    },
    config::AppState,
    models::{
        pedido::{EnviarPedidoPayload, PedidoRegistrado},
        pedido_restaurante::{
            CadastrarPedidoRestaurantePayload, LiberadosQuery, PedidoRestaurante, PedidoRestauranteComItens,
            PedidoRestauranteRegistrado, StatusPedidoPayload,
        },
    },
};

// ---
// Pedido de venda
// ---
#[utoipa::path(
    post,
    path = "/pedidos/enviar",
    tag = "Pedidos",
    request_body = EnviarPedidoPayload,
    responses(
        (status = 201, description = "Pedido gravado", body = PedidoRegistrado),
        (status = 400, description = "Pedido sem itens ou item inválido (com índice)")
    )
)]
pub async fn enviar(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<EnviarPedidoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let registrado = app_state.pedido_service.enviar(&payload).await?;
    Ok((StatusCode::CREATED, Json(registrado)))
}

// ---
// Pedido de restaurante
// ---
#[utoipa::path(
    post,
    path = "/pedidos/restaurante/cadastrar",
    tag = "Pedidos",
    request_body = CadastrarPedidoRestaurantePayload,
    responses(
        (status = 201, description = "Pedido criado ou substituído, status liberado", body = PedidoRestauranteRegistrado),
        (status = 404, description = "Pedido informado não existe")
    )
)]
pub async fn cadastrar_restaurante(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CadastrarPedidoRestaurantePayload>,
) -> Result<impl IntoResponse, AppError> {
    let registrado = app_state.pedido_service.cadastrar_restaurante(payload).await?;
    Ok((StatusCode::CREATED, Json(registrado)))
}

#[utoipa::path(
    get,
    path = "/pedidos/restaurante/liberados",
    tag = "Pedidos",
    params(LiberadosQuery),
    responses((status = 200, description = "Pedidos liberados com itens", body = Lista<PedidoRestauranteComItens>))
)]
pub async fn liberados(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<LiberadosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pedidos = app_state.pedido_repo.listar_liberados(query.cod_loja).await?;
    Ok((StatusCode::OK, Json(Lista::from(pedidos))))
}

#[utoipa::path(
    post,
    path = "/pedidos/restaurante/status",
    tag = "Pedidos",
    request_body = StatusPedidoPayload,
    responses(
        (status = 200, description = "Status alterado", body = PedidoRestaurante),
        (status = 400, description = "Status fora de 0..=3"),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn alterar_status(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<StatusPedidoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let pedido = app_state
        .pedido_repo
        .alterar_status_restaurante(payload.id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido nao encontrado.".into()))?;

    tracing::info!("Pedido de restaurante {} agora com status {}", pedido.id, pedido.status);
    Ok((StatusCode::OK, Json(pedido)))
}
