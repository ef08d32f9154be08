// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common::reconcile::ResumoCadastro;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::primeiro_acesso,
        handlers::auth::esqueci_senha,
        handlers::auth::redefinir_senha,
        handlers::auth::me,

        // --- Lojas / Usuarios ---
        handlers::lojas::listar,
        handlers::lojas::cadastrar,
        handlers::lojas::atualizar,
        handlers::lojas::remover,
        handlers::usuarios::listar,
        handlers::usuarios::cadastrar,
        handlers::usuarios::atualizar,
        handlers::usuarios::remover,

        // --- Produtos / Estoque ---
        handlers::produtos::buscar,
        handlers::produtos::listar_eans,
        handlers::produtos::cadastrar,
        handlers::produtos::atualizar,
        handlers::produtos::remover,
        handlers::produtos::eans,
        handlers::estoque::listar,
        handlers::estoque::atual,
        handlers::estoque::cadastrar,
        handlers::contagens::sync,
        handlers::contagens::pendentes,
        handlers::contagens::marcar_sincronizado,
        handlers::validade::cadastrar,
        handlers::validade::proximos,
        handlers::validade::inativar,

        // --- Comercial ---
        handlers::clientes::buscar,
        handlers::clientes::cadastrar,
        handlers::condicao_pagamento::listar,
        handlers::condicao_pagamento::buscar,
        handlers::condicao_pagamento::cadastrar,
        handlers::configuracao::cadastrar,
        handlers::configuracao::buscar,
        handlers::configuracao::alterar,
        handlers::pedidos::enviar,
        handlers::pedidos::cadastrar_restaurante,
        handlers::pedidos::liberados,
        handlers::pedidos::alterar_status,

        // --- Mensagens ---
        handlers::mensagens::webhook,
        handlers::mensagens::webhook_evento,
        handlers::mensagens::enviar,
        handlers::mensagens::iniciar,
        handlers::mensagens::finalizar,
        handlers::mensagens::listar_atendimentos,
        handlers::mensagens::mensagens_do_atendimento,
        handlers::mensagens::mensagens_do_contato,

        // --- Sync ---
        handlers::sync::full,
    ),
    components(
        schemas(
            // --- Respostas comuns ---
            ResumoCadastro,

            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::LoginResponse,
            models::auth::PrimeiroAcessoPayload,
            models::auth::EsqueciSenhaPayload,
            models::auth::RedefinirSenhaPayload,
            models::auth::MensagemResponse,
            models::auth::RecuperacaoIniciada,

            // --- Cadastros ---
            models::loja::Loja,
            models::loja::LojaResumo,
            models::loja::LojaInput,
            models::loja::AtualizarLojaPayload,
            models::usuario::Usuario,
            models::usuario::UsuarioComLoja,
            models::usuario::UsuarioInput,
            models::usuario::AtualizarUsuarioPayload,
            models::produto::Produto,
            models::produto::Ean,
            models::produto::ProdutoInput,
            models::produto::AtualizarProdutoPayload,
            models::estoque::Estoque,
            models::estoque::EstoqueAtual,
            models::estoque::EstoqueInput,
            models::cliente::Cliente,
            models::cliente::ClienteInput,
            models::condicao_pagamento::CondicaoPagamento,
            models::condicao_pagamento::CondicaoPagamentoInput,
            models::configuracao::Configuracao,
            models::configuracao::ConfiguracaoInput,
            models::configuracao::ValorConfiguracao,
            models::configuracao::AlterarConfiguracaoPayload,

            // --- Contagens / Validade ---
            models::contagem::Contagem,
            models::contagem::ItemContagemPayload,
            models::contagem::SyncContagensPayload,
            models::contagem::SyncContagensResponse,
            models::contagem::ContagensPendentes,
            models::contagem::MarcarSincronizadoPayload,
            models::contagem::MarcarSincronizadoResponse,
            models::validade::ProdutoValidade,
            models::validade::ValidadeInput,
            models::validade::InativarValidadePayload,
            models::validade::ValidadesRegistradas,

            // --- Pedidos ---
            models::pedido::ItemPedidoPayload,
            models::pedido::EnviarPedidoPayload,
            models::pedido::PedidoRegistrado,
            models::pedido_restaurante::PedidoRestaurante,
            models::pedido_restaurante::ItemPedidoRestaurante,
            models::pedido_restaurante::PedidoRestauranteComItens,
            models::pedido_restaurante::ItemRestaurantePayload,
            models::pedido_restaurante::TotaisPayload,
            models::pedido_restaurante::CadastrarPedidoRestaurantePayload,
            models::pedido_restaurante::PedidoRestauranteRegistrado,
            models::pedido_restaurante::StatusPedidoPayload,

            // --- Mensagens ---
            models::mensagens::StatusAtendimento,
            models::mensagens::DirecaoMensagem,
            models::mensagens::TipoMensagem,
            models::mensagens::Contato,
            models::mensagens::Atendimento,
            models::mensagens::Mensagem,
            models::mensagens::AtendimentoResumo,
            models::mensagens::EnviarMensagemPayload,
            models::mensagens::IniciarAtendimentoPayload,
            models::mensagens::FinalizarAtendimentoPayload,
            models::mensagens::MensagemRegistrada,
            models::mensagens::WebhookProcessado,
            models::mensagens::WebhookIgnorado,
            models::mensagens::MensagensDoAtendimento,
            models::mensagens::MensagensDoContato,

            // --- Sync ---
            handlers::sync::SyncCompleto,
        )
    ),
    tags(
        (name = "Auth", description = "Login, primeiro acesso e recuperação de senha"),
        (name = "Lojas", description = "Cadastro de lojas e credenciais do WhatsApp"),
        (name = "Usuarios", description = "Usuários do app por loja"),
        (name = "Produtos", description = "Produtos, códigos de barras e EANs"),
        (name = "Estoque", description = "Saldos por produto"),
        (name = "Contagens", description = "Inventário feito no coletor"),
        (name = "Validade", description = "Lotes de validade"),
        (name = "Clientes", description = "Cadastro de clientes"),
        (name = "Condicao de pagamento", description = "Condições de pagamento (também em /condpag)"),
        (name = "Configuracao", description = "Parâmetros por loja"),
        (name = "Pedidos", description = "Pedidos de venda e de restaurante"),
        (name = "Mensagens", description = "Webhook do WhatsApp e atendimentos"),
        (name = "Sync", description = "Carga completa do coletor")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
