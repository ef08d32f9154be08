// src/handlers/contagens.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery},
    },
    config::AppState,
    models::{
        contagem::{
            ContagensPendentes, MarcarSincronizadoPayload, MarcarSincronizadoResponse, SyncContagensPayload,
            SyncContagensResponse,
        },
        produto::LojaQuery,
    },
};

// ---
// Handler: sync (coletor envia leituras)
// ---
#[utoipa::path(
    post,
    path = "/contagens/sync",
    tag = "Contagens",
    request_body = SyncContagensPayload,
    responses(
        (status = 200, description = "Leituras gravadas", body = SyncContagensResponse),
        (status = 400, description = "cod_loja ou cod_usuario ausente")
    )
)]
pub async fn sync(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<SyncContagensPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (Some(cod_loja), Some(cod_usuario)) = (payload.cod_loja, payload.cod_usuario) else {
        return Err(AppError::BadRequest("cod_loja e cod_usuario sao obrigatorios.".into()));
    };

    let itens = payload.itens_validos(Utc::now());
    let descartados = payload.itens.len() - itens.len();
    if descartados > 0 {
        tracing::warn!("Contagens: {} itens sem cod_produto/qtde descartados (loja {})", descartados, cod_loja);
    }

    let ids = if itens.is_empty() {
        Vec::new()
    } else {
        app_state.contagem_repo.inserir(cod_loja, cod_usuario, &itens).await?
    };

    tracing::info!("📋 {} contagens recebidas do usuário {} (loja {})", ids.len(), cod_usuario, cod_loja);

    Ok((
        StatusCode::OK,
        Json(SyncContagensResponse {
            status: "ok".into(),
            inseridos: ids.len(),
            ids,
        }),
    ))
}

// ---
// Handler: pendentes
// ---
// Buscar já marca como sincronizado: uma segunda chamada logo em seguida vem vazia.
#[utoipa::path(
    get,
    path = "/contagens/pendentes",
    tag = "Contagens",
    params(LojaQuery),
    responses((status = 200, description = "Pendentes reservadas num lote novo", body = ContagensPendentes))
)]
pub async fn pendentes(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<LojaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lote = Uuid::new_v4();
    let data = app_state
        .contagem_repo
        .reservar_pendentes(query.cod_loja, lote)
        .await?;

    let lote = (!data.is_empty()).then_some(lote);
    if let Some(lote) = lote {
        tracing::info!("Lote {} com {} contagens entregue (loja {})", lote, data.len(), query.cod_loja);
    }

    Ok((
        StatusCode::OK,
        Json(ContagensPendentes {
            total: data.len(),
            lote,
            data,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/contagens/marcar-sincronizado",
    tag = "Contagens",
    request_body = MarcarSincronizadoPayload,
    responses(
        (status = 200, description = "Contagens marcadas", body = MarcarSincronizadoResponse),
        (status = 400, description = "Lista de ids vazia")
    )
)]
pub async fn marcar_sincronizado(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<MarcarSincronizadoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let total_atualizadas = app_state.contagem_repo.marcar_sincronizado(&payload.ids).await?;

    Ok((
        StatusCode::OK,
        Json(MarcarSincronizadoResponse {
            message: "Contagens marcadas como sincronizadas.".into(),
            total_atualizadas,
        }),
    ))
}
