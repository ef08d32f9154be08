// src/handlers/mensagens.rs

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery},
        pagination::Pagina,
    },
    config::AppState,
    models::mensagens::{
        Atendimento, AtendimentoResumo, EnviarMensagemPayload, FinalizarAtendimentoPayload,
        IniciarAtendimentoPayload, ListarAtendimentosQuery, ListarMensagensQuery, MensagemRegistrada,
        MensagensDoAtendimento, MensagensDoContato, WebhookIgnorado, WebhookProcessado,
    },
    services::mensagens_service::ResultadoWebhook,
};

// ---
// Webhook do provedor de WhatsApp
// ---

async fn processar_webhook(
    app_state: &AppState,
    headers: &HeaderMap,
    corpo: &Value,
    sufixo: Option<&str>,
) -> Result<Response, AppError> {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());

    let resposta = match app_state
        .mensagens_service
        .processar_webhook(corpo, apikey, sufixo)
        .await?
    {
        ResultadoWebhook::Processado(processado) => (StatusCode::CREATED, Json(processado)).into_response(),
        ResultadoWebhook::Ignorado(ignorado) => (StatusCode::OK, Json(ignorado)).into_response(),
    };
    Ok(resposta)
}

#[utoipa::path(
    post,
    path = "/mensagens/webhook",
    tag = "Mensagens",
    request_body(content = Object, description = "Evento do provedor ou formato simplificado"),
    params(("apikey" = Option<String>, Header, description = "Chave da instância; tem precedência sobre o corpo")),
    responses(
        (status = 201, description = "Mensagem gravada", body = WebhookProcessado),
        (status = 200, description = "Evento ou mensagem ignorados", body = WebhookIgnorado),
        (status = 400, description = "Telefone ausente ou direção inválida"),
        (status = 401, description = "Credenciais do webhook inválidas")
    )
)]
pub async fn webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    AppJson(corpo): AppJson<Value>,
) -> Result<Response, AppError> {
    processar_webhook(&app_state, &headers, &corpo, None).await
}

// O provedor pode anexar o nome do evento à URL (`/webhook/messages-upsert`).
#[utoipa::path(
    post,
    path = "/mensagens/webhook/{evento}",
    tag = "Mensagens",
    request_body(content = Object, description = "Evento do provedor"),
    params(
        ("evento" = String, Path, description = "Sufixo com o nome do evento"),
        ("apikey" = Option<String>, Header, description = "Chave da instância")
    ),
    responses(
        (status = 201, description = "Mensagem gravada", body = WebhookProcessado),
        (status = 200, description = "Evento ou mensagem ignorados", body = WebhookIgnorado),
        (status = 401, description = "Credenciais do webhook inválidas")
    )
)]
pub async fn webhook_evento(
    State(app_state): State<AppState>,
    AppPath(evento): AppPath<String>,
    headers: HeaderMap,
    AppJson(corpo): AppJson<Value>,
) -> Result<Response, AppError> {
    processar_webhook(&app_state, &headers, &corpo, Some(&evento)).await
}

// ---
// Envio e transições do atendimento
// ---

#[utoipa::path(
    post,
    path = "/mensagens/enviar",
    tag = "Mensagens",
    request_body = EnviarMensagemPayload,
    responses(
        (status = 201, description = "Mensagem registrada", body = MensagemRegistrada),
        (status = 400, description = "Campos ausentes ou atendimento finalizado"),
        (status = 403, description = "Atendimento de outro usuário"),
        (status = 404, description = "Atendimento não encontrado")
    )
)]
pub async fn enviar(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<EnviarMensagemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let registrada = app_state.mensagens_service.enviar(&payload).await?;
    Ok((StatusCode::CREATED, Json(registrada)))
}

#[utoipa::path(
    post,
    path = "/mensagens/atendimento/{id}/iniciar",
    tag = "Mensagens",
    request_body = IniciarAtendimentoPayload,
    params(("id" = i32, Path, description = "Id do atendimento")),
    responses(
        (status = 200, description = "Atendimento em andamento", body = Atendimento),
        (status = 400, description = "Atendimento finalizado"),
        (status = 404, description = "Atendimento não encontrado"),
        (status = 409, description = "Atendimento já assumido por outro usuário")
    )
)]
pub async fn iniciar(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<IniciarAtendimentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let atendimento = app_state.mensagens_service.iniciar(id, &payload).await?;
    Ok((StatusCode::OK, Json(atendimento)))
}

#[utoipa::path(
    post,
    path = "/mensagens/atendimento/{id}/finalizar",
    tag = "Mensagens",
    request_body = FinalizarAtendimentoPayload,
    params(("id" = i32, Path, description = "Id do atendimento")),
    responses(
        (status = 200, description = "Atendimento finalizado", body = Atendimento),
        (status = 403, description = "Atendimento de outro usuário"),
        (status = 404, description = "Atendimento não encontrado")
    )
)]
pub async fn finalizar(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<FinalizarAtendimentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let atendimento = app_state.mensagens_service.finalizar(id, &payload).await?;
    Ok((StatusCode::OK, Json(atendimento)))
}

// ---
// Consultas
// ---

#[utoipa::path(
    get,
    path = "/mensagens/atendimentos",
    tag = "Mensagens",
    params(ListarAtendimentosQuery),
    responses((status = 200, description = "Atendimentos visíveis ao usuário", body = Pagina<AtendimentoResumo>))
)]
pub async fn listar_atendimentos(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<ListarAtendimentosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagina = app_state.mensagens_service.listar_atendimentos(&query).await?;
    Ok((StatusCode::OK, Json(pagina)))
}

#[utoipa::path(
    get,
    path = "/mensagens/atendimento/{id}",
    tag = "Mensagens",
    params(("id" = i32, Path, description = "Id do atendimento"), ListarMensagensQuery),
    responses(
        (status = 200, description = "Mensagens do atendimento, mais antigas primeiro", body = MensagensDoAtendimento),
        (status = 403, description = "Atendimento de outro usuário"),
        (status = 404, description = "Atendimento não encontrado")
    )
)]
pub async fn mensagens_do_atendimento(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<ListarMensagensQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mensagens = app_state
        .mensagens_service
        .mensagens_do_atendimento(id, &query)
        .await?;
    Ok((StatusCode::OK, Json(mensagens)))
}

#[utoipa::path(
    get,
    path = "/mensagens/contato/{id}",
    tag = "Mensagens",
    params(("id" = i32, Path, description = "Id do contato"), ListarMensagensQuery),
    responses(
        (status = 200, description = "Mensagens dos atendimentos visíveis do contato", body = MensagensDoContato),
        (status = 404, description = "Contato não encontrado")
    )
)]
pub async fn mensagens_do_contato(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppQuery(query): AppQuery<ListarMensagensQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mensagens = app_state.mensagens_service.mensagens_do_contato(id, &query).await?;
    Ok((StatusCode::OK, Json(mensagens)))
}
