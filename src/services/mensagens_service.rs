// src/services/mensagens_service.rs

use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        pagination::{Pagina, Paginacao},
    },
    db::{LojaRepository, MensagemRepository},
    models::{
        loja::Loja,
        mensagens::{
            Atendimento, AtendimentoResumo, DirecaoMensagem, EnviarMensagemPayload, FinalizarAtendimentoPayload,
            IniciarAtendimentoPayload, ListarAtendimentosQuery, ListarMensagensQuery, MensagemRegistrada,
            MensagensDoAtendimento, MensagensDoContato, StatusAtendimento, WebhookIgnorado, WebhookProcessado,
        },
    },
    services::webhook::{self, Credenciais},
};

fn atendimento_nao_encontrado() -> AppError {
    AppError::NotFound("Atendimento nao encontrado.".into())
}

/// Resultado do webhook: mensagem gravada ou evento descartado.
#[derive(Debug)]
pub enum ResultadoWebhook {
    Processado(WebhookProcessado),
    Ignorado(WebhookIgnorado),
}

#[derive(Clone)]
pub struct MensagensService {
    pool: PgPool,
    mensagem_repo: MensagemRepository,
    loja_repo: LojaRepository,
}

impl MensagensService {
    pub fn new(pool: PgPool, mensagem_repo: MensagemRepository, loja_repo: LojaRepository) -> Self {
        Self {
            pool,
            mensagem_repo,
            loja_repo,
        }
    }

    // ---
    // Webhook
    // ---

    /// apikey, depois instância + URL, depois `cod_loja` explícito.
    async fn resolver_loja(&self, credenciais: &Credenciais) -> Result<Option<Loja>, AppError> {
        if let Some(apikey) = &credenciais.apikey {
            if let Some(loja) = self.loja_repo.buscar_por_apikey(apikey).await? {
                return Ok(Some(loja));
            }
        }
        if let (Some(instancia), Some(url)) = (&credenciais.instancia, &credenciais.server_url) {
            if let Some(loja) = self.loja_repo.buscar_por_instancia(instancia, url).await? {
                return Ok(Some(loja));
            }
        }
        match credenciais.cod_loja {
            Some(cod_loja) => self.loja_repo.buscar_por_codigo(cod_loja).await,
            None => Ok(None),
        }
    }

    pub async fn processar_webhook(
        &self,
        corpo: &Value,
        apikey_header: Option<&str>,
        sufixo_rota: Option<&str>,
    ) -> Result<ResultadoWebhook, AppError> {
        let evento = webhook::evento(corpo, sufixo_rota);
        if !webhook::e_evento_de_mensagem(evento.as_deref()) {
            tracing::debug!("Webhook: evento {:?} ignorado", evento);
            return Ok(ResultadoWebhook::Ignorado(WebhookIgnorado {
                message: "Evento ignorado.".into(),
                ignorado: true,
            }));
        }

        let credenciais = webhook::credenciais(corpo, apikey_header);
        let loja = self
            .resolver_loja(&credenciais)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciais do webhook invalidas.".into()))?;

        let Some(recebida) = webhook::normalizar(corpo)? else {
            return Ok(ResultadoWebhook::Ignorado(WebhookIgnorado {
                message: "Mensagem sem texto ou midia ignorada.".into(),
                ignorado: true,
            }));
        };

        let mut tx = self.pool.begin().await?;

        let contato = self
            .mensagem_repo
            .garantir_contato(
                &mut *tx,
                loja.codigo,
                &recebida.telefone,
                recebida.nome_contato.as_deref(),
                recebida.mensagem.direcao == DirecaoMensagem::Entrada,
            )
            .await?;

        let (atendimento, novo_atendimento) = self.mensagem_repo.garantir_atendimento(&mut *tx, &contato).await?;
        let mensagem = self
            .mensagem_repo
            .inserir_mensagem(&mut *tx, &atendimento, &recebida.mensagem)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "💬 Webhook loja {}: mensagem {} no atendimento {} (contato {})",
            loja.codigo,
            mensagem.id,
            atendimento.id,
            contato.id
        );

        Ok(ResultadoWebhook::Processado(WebhookProcessado {
            message: "Mensagem processada com sucesso.".into(),
            atendimento_id: atendimento.id,
            mensagem_id: mensagem.id,
            contato_id: contato.id,
            novo_atendimento,
        }))
    }

    // ---
    // Envio e transições
    // ---

    pub async fn enviar(&self, payload: &EnviarMensagemPayload) -> Result<MensagemRegistrada, AppError> {
        let (Some(cod_loja), Some(atendimento_id), Some(usuario_id)) =
            (payload.cod_loja, payload.atendimento_id, payload.usuario_id)
        else {
            return Err(AppError::BadRequest(
                "cod_loja, atendimento_id e usuario_id sao obrigatorios.".into(),
            ));
        };

        let mut tx = self.pool.begin().await?;

        let mut atendimento = self
            .mensagem_repo
            .travar_atendimento(&mut *tx, cod_loja, atendimento_id)
            .await?
            .ok_or_else(atendimento_nao_encontrado)?;

        atendimento.validar_envio(usuario_id)?;

        if payload.iniciar_atendimento && atendimento.status == StatusAtendimento::Aberto {
            atendimento.iniciar(usuario_id, Utc::now())?;
            self.mensagem_repo.salvar_estado(&mut *tx, &atendimento).await?;
        }

        let mensagem = self
            .mensagem_repo
            .inserir_mensagem(&mut *tx, &atendimento, &payload.nova_mensagem(usuario_id))
            .await?;

        tx.commit().await?;

        Ok(MensagemRegistrada {
            message: "Mensagem registrada com sucesso.".into(),
            atendimento_id: atendimento.id,
            mensagem_id: mensagem.id,
            status_atendimento: atendimento.status,
        })
    }

    pub async fn iniciar(&self, id: i32, payload: &IniciarAtendimentoPayload) -> Result<Atendimento, AppError> {
        let (Some(cod_loja), Some(cod_usuario)) = (payload.cod_loja, payload.cod_usuario) else {
            return Err(AppError::BadRequest("cod_loja e cod_usuario sao obrigatorios.".into()));
        };

        let mut tx = self.pool.begin().await?;
        let mut atendimento = self
            .mensagem_repo
            .travar_atendimento(&mut *tx, cod_loja, id)
            .await?
            .ok_or_else(atendimento_nao_encontrado)?;

        atendimento.iniciar(cod_usuario, Utc::now())?;
        self.mensagem_repo.salvar_estado(&mut *tx, &atendimento).await?;
        tx.commit().await?;

        tracing::info!("Atendimento {} iniciado pelo usuário {}", atendimento.id, cod_usuario);
        Ok(atendimento)
    }

    pub async fn finalizar(&self, id: i32, payload: &FinalizarAtendimentoPayload) -> Result<Atendimento, AppError> {
        let cod_loja = payload
            .cod_loja
            .ok_or_else(|| AppError::BadRequest("cod_loja e obrigatorio.".into()))?;

        let mut tx = self.pool.begin().await?;
        let mut atendimento = self
            .mensagem_repo
            .travar_atendimento(&mut *tx, cod_loja, id)
            .await?
            .ok_or_else(atendimento_nao_encontrado)?;

        atendimento.finalizar(payload.cod_usuario, Utc::now())?;
        self.mensagem_repo.salvar_estado(&mut *tx, &atendimento).await?;
        tx.commit().await?;

        Ok(atendimento)
    }

    // ---
    // Consultas
    // ---

    pub async fn listar_atendimentos(
        &self,
        query: &ListarAtendimentosQuery,
    ) -> Result<Pagina<AtendimentoResumo>, AppError> {
        let paginacao = Paginacao::new(query.limit, query.offset);
        let (total, atendimentos) = self
            .mensagem_repo
            .listar_atendimentos(query.cod_loja, query.cod_usuario, query.status, paginacao)
            .await?;
        Ok(Pagina::new(total, atendimentos, paginacao))
    }

    pub async fn mensagens_do_atendimento(
        &self,
        id: i32,
        query: &ListarMensagensQuery,
    ) -> Result<MensagensDoAtendimento, AppError> {
        let atendimento = self
            .mensagem_repo
            .buscar_atendimento(query.cod_loja, id)
            .await?
            .ok_or_else(atendimento_nao_encontrado)?;
        atendimento.exigir_acesso(query.cod_usuario)?;

        let paginacao = Paginacao::new(query.limit, query.offset);
        let (total, data) = self
            .mensagem_repo
            .listar_por_atendimento(query.cod_loja, id, query.apos_id, paginacao)
            .await?;

        Ok(MensagensDoAtendimento {
            total,
            data,
            atendimento,
            next_offset: paginacao.proximo_offset(total),
        })
    }

    /// Só as mensagens dos atendimentos que o usuário pode ver.
    pub async fn mensagens_do_contato(
        &self,
        id: i32,
        query: &ListarMensagensQuery,
    ) -> Result<MensagensDoContato, AppError> {
        let contato = self
            .mensagem_repo
            .buscar_contato(query.cod_loja, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contato nao encontrado.".into()))?;

        let paginacao = Paginacao::new(query.limit, query.offset);
        let (total, data) = self
            .mensagem_repo
            .listar_por_contato(query.cod_loja, id, query.cod_usuario, query.apos_id, paginacao)
            .await?;

        Ok(MensagensDoContato {
            total,
            data,
            contato,
            next_offset: paginacao.proximo_offset(total),
        })
    }
}
