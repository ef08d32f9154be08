// src/handlers/sync.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::{
        error::AppError,
        extract::AppQuery,
        pagination::Lista,
    },
    config::AppState,
    models::{
        contagem::Contagem,
        produto::{Ean, LojaQuery, Produto},
        usuario::Usuario,
    },
};

/// Carga completa do coletor ao abrir o app.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncCompleto {
    pub usuarios: Lista<Usuario>,
    pub produtos: Lista<Produto>,
    pub eans: Lista<Ean>,
    pub contagens: Lista<Contagem>,
}

#[utoipa::path(
    get,
    path = "/sync/full",
    tag = "Sync",
    params(LojaQuery),
    responses((status = 200, description = "Usuários, produtos, EANs e contagens da loja", body = SyncCompleto))
)]
pub async fn full(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<LojaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cod_loja = query.cod_loja;

    let (usuarios, produtos, eans, contagens) = tokio::try_join!(
        app_state.usuario_repo.listar(Some(cod_loja)),
        app_state.produto_repo.listar_todos(cod_loja),
        app_state.produto_repo.listar_eans(cod_loja),
        app_state.contagem_repo.listar(cod_loja),
    )?;

    tracing::info!(
        "🔄 Sync completo da loja {}: {} usuários, {} produtos, {} EANs, {} contagens",
        cod_loja,
        usuarios.len(),
        produtos.len(),
        eans.len(),
        contagens.len()
    );

    Ok((
        StatusCode::OK,
        Json(SyncCompleto {
            usuarios: usuarios.into(),
            produtos: produtos.into(),
            eans: eans.into(),
            contagens: contagens.into(),
        }),
    ))
}
