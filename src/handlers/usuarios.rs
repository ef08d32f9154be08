// src/handlers/usuarios.rs

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery, OneOrMany},
        pagination::Lista,
        reconcile::ResumoCadastro,
    },
    config::AppState,
    models::{
        auth::MensagemResponse,
        loja::LojaResumo,
        usuario::{AtualizarUsuarioPayload, Usuario, UsuarioComLoja, UsuarioInput, UsuariosQuery},
    },
};

fn usuario_nao_encontrado() -> AppError {
    AppError::NotFound("Usuario nao encontrado.".into())
}

/// Lista usuários com o resumo da loja de cada um (uma consulta só para as lojas).
#[utoipa::path(
    get,
    path = "/usuarios",
    tag = "Usuarios",
    params(UsuariosQuery),
    responses((status = 200, description = "Usuários", body = Lista<UsuarioComLoja>))
)]
pub async fn listar(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<UsuariosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let usuarios = app_state.usuario_repo.listar(query.cod_loja).await?;

    let mut codigos: Vec<i32> = usuarios.iter().map(|u| u.cod_loja).collect();
    codigos.sort_unstable();
    codigos.dedup();

    let lojas: HashMap<i32, LojaResumo> = app_state
        .loja_repo
        .buscar_por_codigos(&codigos)
        .await?
        .iter()
        .map(|loja| (loja.codigo, LojaResumo::from(loja)))
        .collect();

    let data: Vec<UsuarioComLoja> = usuarios
        .into_iter()
        .map(|usuario| UsuarioComLoja {
            loja: lojas.get(&usuario.cod_loja).cloned(),
            usuario,
        })
        .collect();

    Ok((StatusCode::OK, Json(Lista::from(data))))
}

#[utoipa::path(
    post,
    path = "/usuarios/cadastrar",
    tag = "Usuarios",
    request_body = Vec<UsuarioInput>,
    responses(
        (status = 201, description = "Lote reconciliado", body = ResumoCadastro),
        (status = 400, description = "Lote vazio, item inválido ou duplicado")
    )
)]
pub async fn cadastrar(
    State(app_state): State<AppState>,
    AppJson(corpo): AppJson<OneOrMany<UsuarioInput>>,
) -> Result<impl IntoResponse, AppError> {
    let resumo = app_state
        .cadastro_service
        .processar(&app_state.usuario_repo, corpo)
        .await?;
    Ok((StatusCode::CREATED, Json(resumo)))
}

#[utoipa::path(
    put,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    request_body = AtualizarUsuarioPayload,
    params(("id" = i32, Path, description = "Id interno do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = Usuario),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn atualizar(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AtualizarUsuarioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let usuario = app_state
        .usuario_repo
        .atualizar_por_id(id, &payload)
        .await?
        .ok_or_else(usuario_nao_encontrado)?;
    Ok((StatusCode::OK, Json(usuario)))
}

#[utoipa::path(
    delete,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "Id interno do usuário")),
    responses(
        (status = 200, description = "Usuário removido", body = MensagemResponse),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn remover(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.usuario_repo.remover_por_id(id).await? {
        return Err(usuario_nao_encontrado());
    }

    Ok((
        StatusCode::OK,
        Json(MensagemResponse {
            message: "Usuario removido com sucesso.".into(),
        }),
    ))
}
