// src/handlers/configuracao.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery, OneOrMany},
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::configuracao::{
        valor_como_texto, AlterarConfiguracaoPayload, BuscarConfiguracaoQuery, Configuracao, ConfiguracaoInput,
        ValorConfiguracao,
    },
};

fn configuracao_nao_encontrada() -> AppError {
    AppError::NotFound("Configuracao nao encontrada.".into())
}

#[utoipa::path(
    post,
    path = "/configuracao/cadastrar",
    tag = "Configuracao",
    request_body = Vec<ConfiguracaoInput>,
    responses(
        (status = 201, description = "Lote reconciliado", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<ConfiguracaoInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.configuracao_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}

#[utoipa::path(
    get,
    path = "/configuracao/buscar",
    tag = "Configuracao",
    params(BuscarConfiguracaoQuery),
    responses(
        (status = 200, description = "Valor da configuração", body = ValorConfiguracao),
        (status = 404, description = "Não encontrada")
    )
)]
pub async fn buscar(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<BuscarConfiguracaoQuery>,
) -> Result<impl IntoResponse, AppError> {
    let configuracao = app_state
        .configuracao_repo
        .buscar(query.cod_loja, query.codigo)
        .await?
        .ok_or_else(configuracao_nao_encontrada)?;

    Ok((
        StatusCode::OK,
        Json(ValorConfiguracao {
            valor: configuracao.valor,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/configuracao/alterar",
    tag = "Configuracao",
    request_body = AlterarConfiguracaoPayload,
    responses(
        (status = 200, description = "Valor alterado", body = Configuracao),
        (status = 404, description = "Não encontrada")
    )
)]
pub async fn alterar(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<AlterarConfiguracaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let obrigatorios = || AppError::BadRequest("Campos obrigatorios: cod_loja, codigo e valor.".into());
    let (Some(cod_loja), Some(codigo)) = (payload.cod_loja, payload.codigo) else {
        return Err(obrigatorios());
    };
    let valor = payload.valor.as_ref().and_then(valor_como_texto).ok_or_else(obrigatorios)?;

    let configuracao = app_state
        .configuracao_repo
        .alterar_valor(cod_loja, codigo, &valor)
        .await?
        .ok_or_else(configuracao_nao_encontrada)?;
    Ok((StatusCode::OK, Json(configuracao)))
}
