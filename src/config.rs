// src/config.rs

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        ClienteRepository, CondicaoPagamentoRepository, ConfiguracaoRepository, ContagemRepository,
        EstoqueRepository, LojaRepository, MensagemRepository, PedidoRepository, ProdutoRepository,
        UsuarioRepository, ValidadeRepository,
    },
    services::{
        auth::AuthService, cadastro_service::CadastroService, mensagens_service::MensagensService,
        notificacao::Notificacoes, pedido_service::PedidoService, produto_service::ProdutoService,
    },
};

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub usuario: String,
    pub senha: String,
    pub remetente: String,
}

#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub url: String,
    pub instancia: String,
    pub apikey: String,
}

/// Variáveis de ambiente lidas uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub email: Option<EmailConfig>,
    pub evolution: Option<EvolutionConfig>,
}

fn obrigatoria(nome: &str) -> anyhow::Result<String> {
    env::var(nome).with_context(|| format!("{nome} deve ser definida"))
}

fn opcional(nome: &str) -> Option<String> {
    env::var(nome).ok().filter(|v| !v.trim().is_empty())
}

fn numero<T: FromStr>(nome: &str, padrao: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match opcional(nome) {
        Some(valor) => valor.parse().with_context(|| format!("{nome} inválida: {valor}")),
        None => Ok(padrao),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        // SMTP só é usado com host, usuário e senha.
        let email = match (opcional("SMTP_HOST"), opcional("SMTP_USER"), opcional("SMTP_PASSWORD")) {
            (Some(host), Some(usuario), Some(senha)) => Some(EmailConfig {
                host,
                port: numero("SMTP_PORT", 587)?,
                remetente: opcional("SMTP_FROM").unwrap_or_else(|| format!("SGE Estoque <{usuario}>")),
                usuario,
                senha,
            }),
            _ => None,
        };

        let evolution = match (
            opcional("EVOLUTION_URL"),
            opcional("EVOLUTION_INSTANCE"),
            opcional("EVOLUTION_API_KEY"),
        ) {
            (Some(url), Some(instancia), Some(apikey)) => Some(EvolutionConfig { url, instancia, apikey }),
            _ => None,
        };

        Ok(Self {
            database_url: obrigatoria("DATABASE_URL")?,
            jwt_secret: obrigatoria("JWT_SECRET")?,
            port: numero("PORT", 3001)?,
            database_max_connections: numero("DATABASE_MAX_CONNECTIONS", 5)?,
            email,
            evolution,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,

    pub loja_repo: LojaRepository,
    pub usuario_repo: UsuarioRepository,
    pub produto_repo: ProdutoRepository,
    pub estoque_repo: EstoqueRepository,
    pub cliente_repo: ClienteRepository,
    pub condicao_pagamento_repo: CondicaoPagamentoRepository,
    pub configuracao_repo: ConfiguracaoRepository,
    pub contagem_repo: ContagemRepository,
    pub pedido_repo: PedidoRepository,
    pub validade_repo: ValidadeRepository,
    pub mensagem_repo: MensagemRepository,

    pub auth_service: AuthService,
    pub cadastro_service: CadastroService,
    pub produto_service: ProdutoService,
    pub pedido_service: PedidoService,
    pub mensagens_service: MensagensService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let notificacoes = Notificacoes::from_config(config)?;
        Ok(Self::from_pool(db_pool, config, notificacoes))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, config: &Config, notificacoes: Notificacoes) -> Self {
        let loja_repo = LojaRepository::new(db_pool.clone());
        let usuario_repo = UsuarioRepository::new(db_pool.clone());
        let produto_repo = ProdutoRepository::new(db_pool.clone());
        let pedido_repo = PedidoRepository::new(db_pool.clone());
        let mensagem_repo = MensagemRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            db_pool.clone(),
            usuario_repo.clone(),
            loja_repo.clone(),
            notificacoes,
            config.jwt_secret.clone(),
        );
        let cadastro_service = CadastroService::new(db_pool.clone());
        let produto_service = ProdutoService::new(db_pool.clone(), produto_repo.clone());
        let pedido_service = PedidoService::new(db_pool.clone(), pedido_repo.clone());
        let mensagens_service =
            MensagensService::new(db_pool.clone(), mensagem_repo.clone(), loja_repo.clone());

        Self {
            loja_repo,
            usuario_repo,
            produto_repo,
            estoque_repo: EstoqueRepository::new(db_pool.clone()),
            cliente_repo: ClienteRepository::new(db_pool.clone()),
            condicao_pagamento_repo: CondicaoPagamentoRepository::new(db_pool.clone()),
            configuracao_repo: ConfiguracaoRepository::new(db_pool.clone()),
            contagem_repo: ContagemRepository::new(db_pool.clone()),
            pedido_repo,
            validade_repo: ValidadeRepository::new(db_pool.clone()),
            mensagem_repo,
            auth_service,
            cadastro_service,
            produto_service,
            pedido_service,
            mensagens_service,
            db_pool,
        }
    }
}
