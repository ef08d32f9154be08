// src/handlers/validade.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{TimeDelta, Utc};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery, OneOrMany},
        pagination::Lista,
    },
    config::AppState,
    models::validade::{
        InativarValidadePayload, NovaValidade, ProdutoValidade, ProximosQuery, ValidadeInput, ValidadesRegistradas,
    },
};

#[utoipa::path(
    post,
    path = "/validade/cadastrar",
    tag = "Validade",
    request_body = Vec<ValidadeInput>,
    responses(
        (status = 201, description = "Lotes de validade gravados", body = ValidadesRegistradas),
        (status = 400, description = "Nenhum lote ou item inválido (com índice)")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<ValidadeInput>>,
) -> Result<impl IntoResponse, AppError> {
    let itens = corpo.into_vec();
    if itens.is_empty() {
        return Err(AppError::BadRequest("Nenhuma validade informada.".into()));
    }

    let mut validades: Vec<NovaValidade> = Vec::with_capacity(itens.len());
    for (index, item) in itens.into_iter().enumerate() {
        item.validate().map_err(|e| AppError::item_invalido(index, e))?;
        let validade = item.em_registro().ok_or_else(|| AppError::ItemInvalido {
            index,
            message: "Campos obrigatorios: cod_loja, cod_produto e vencimento.".into(),
            details: serde_json::Value::Null,
        })?;
        validades.push(validade);
    }

    let data = app_state.validade_repo.inserir(&validades).await?;

    Ok((
        StatusCode::CREATED,
        Json(ValidadesRegistradas {
            message: "Validades cadastradas com sucesso.".into(),
            total: data.len(),
            data,
        }),
    ))
}

// Lotes ativos; com `dias`, só os que vencem até hoje + dias.
#[utoipa::path(
    get,
    path = "/validade/proximos",
    tag = "Validade",
    params(ProximosQuery),
    responses(
        (status = 200, description = "Lotes ativos por vencimento", body = Lista<ProdutoValidade>),
        (status = 400, description = "dias inválido")
    )
)]
pub async fn proximos(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<ProximosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limite = match query.dias {
        None => None,
        Some(dias) => {
            let limite = TimeDelta::try_days(dias)
                .filter(|_| dias >= 0)
                .and_then(|janela| Utc::now().date_naive().checked_add_signed(janela))
                .ok_or_else(|| AppError::BadRequest("dias deve ser inteiro >= 0.".into()))?;
            Some(limite)
        }
    };

    let validades = app_state
        .validade_repo
        .proximos(query.cod_loja, query.cod_produto, limite)
        .await?;
    Ok((StatusCode::OK, Json(Lista::from(validades))))
}

#[utoipa::path(
    patch,
    path = "/validade/inativar",
    tag = "Validade",
    request_body = InativarValidadePayload,
    responses(
        (status = 200, description = "Lote inativado", body = ProdutoValidade),
        (status = 404, description = "Lote não encontrado")
    )
)]
pub async fn inativar(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<InativarValidadePayload>,
) -> Result<impl IntoResponse, AppError> {
    let validade = app_state
        .validade_repo
        .inativar(payload.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Validade nao encontrada.".into()))?;
    Ok((StatusCode::OK, Json(validade)))
}
