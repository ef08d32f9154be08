// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub const LIMITE_CORPO: usize = 5 * 1024 * 1024;
// Webhook pode trazer mídia em base64.
pub const LIMITE_CORPO_WEBHOOK: usize = 25 * 1024 * 1024;

fn condicao_pagamento_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::condicao_pagamento::listar))
        .route("/cadastrar", post(handlers::condicao_pagamento::cadastrar))
        .route("/{id}", get(handlers::condicao_pagamento::buscar))
}

/// Monta o router completo. Separado do `main` para os testes usarem o mesmo.
pub fn app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas) e /me (protegida)
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/first-access", post(handlers::auth::primeiro_acesso))
        .route("/forgot-password", post(handlers::auth::esqueci_senha))
        .route("/reset-password", post(handlers::auth::redefinir_senha))
        .route(
            "/me",
            get(handlers::auth::me).layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard)),
        );

    let loja_routes = Router::new()
        .route("/", get(handlers::lojas::listar))
        .route("/cadastrar", post(handlers::lojas::cadastrar))
        .route("/{id}", put(handlers::lojas::atualizar).delete(handlers::lojas::remover));

    let usuario_routes = Router::new()
        .route("/", get(handlers::usuarios::listar))
        .route("/cadastrar", post(handlers::usuarios::cadastrar))
        .route("/{id}", put(handlers::usuarios::atualizar).delete(handlers::usuarios::remover));

    let produto_routes = Router::new()
        .route("/search", get(handlers::produtos::buscar))
        .route("/eans", get(handlers::produtos::listar_eans))
        .route("/cadastrar", post(handlers::produtos::cadastrar))
        .route("/{id}", put(handlers::produtos::atualizar).delete(handlers::produtos::remover));

    let estoque_routes = Router::new()
        .route("/", get(handlers::estoque::listar))
        .route("/atual", get(handlers::estoque::atual))
        .route("/cadastrar", post(handlers::estoque::cadastrar));

    let contagem_routes = Router::new()
        .route("/sync", post(handlers::contagens::sync))
        .route("/pendentes", get(handlers::contagens::pendentes))
        .route("/marcar-sincronizado", post(handlers::contagens::marcar_sincronizado));

    let cliente_routes = Router::new()
        .route("/search", get(handlers::clientes::buscar))
        .route("/cadastrar", post(handlers::clientes::cadastrar));

    let configuracao_routes = Router::new()
        .route("/cadastrar", post(handlers::configuracao::cadastrar))
        .route("/buscar", get(handlers::configuracao::buscar))
        .route("/alterar", put(handlers::configuracao::alterar));

    let pedido_routes = Router::new()
        .route("/enviar", post(handlers::pedidos::enviar))
        .route("/restaurante/cadastrar", post(handlers::pedidos::cadastrar_restaurante))
        .route("/restaurante/liberados", get(handlers::pedidos::liberados))
        .route("/restaurante/status", post(handlers::pedidos::alterar_status));

    let validade_routes = Router::new()
        .route("/cadastrar", post(handlers::validade::cadastrar))
        .route("/proximos", get(handlers::validade::proximos))
        .route("/inativar", patch(handlers::validade::inativar));

    let webhook_routes = Router::new()
        .route("/webhook", post(handlers::mensagens::webhook))
        .route("/webhook/{*evento}", post(handlers::mensagens::webhook_evento))
        .layer(DefaultBodyLimit::max(LIMITE_CORPO_WEBHOOK));

    let mensagem_routes = Router::new()
        .route("/enviar", post(handlers::mensagens::enviar))
        .route("/atendimentos", get(handlers::mensagens::listar_atendimentos))
        .route("/atendimento/{id}", get(handlers::mensagens::mensagens_do_atendimento))
        .route("/atendimento/{id}/iniciar", post(handlers::mensagens::iniciar))
        .route("/atendimento/{id}/finalizar", post(handlers::mensagens::finalizar))
        .route("/contato/{id}", get(handlers::mensagens::mensagens_do_contato))
        .merge(webhook_routes);

    let sync_routes = Router::new().route("/full", get(handlers::sync::full));

    // Combina tudo no router principal
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/eans", get(handlers::produtos::eans))
        .nest("/auth", auth_routes)
        .nest("/lojas", loja_routes)
        .nest("/usuarios", usuario_routes)
        .nest("/produtos", produto_routes)
        .nest("/estoque", estoque_routes)
        .nest("/contagens", contagem_routes)
        .nest("/clientes", cliente_routes)
        .nest("/condicao-pagamento", condicao_pagamento_routes())
        .nest("/condpag", condicao_pagamento_routes())
        .nest("/configuracao", configuracao_routes)
        .nest("/pedidos", pedido_routes)
        .nest("/validade", validade_routes)
        .nest("/mensagens", mensagem_routes)
        .nest("/sync", sync_routes)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(LIMITE_CORPO))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
