// src/services/notificacao.rs
//
// Envio do código de recuperação de senha. Cada canal é opcional: sem
// configuração ele simplesmente não é registrado.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;

use crate::{
    config::{Config, EmailConfig, EvolutionConfig},
    models::usuario::Usuario,
};

pub const ASSUNTO_RECUPERACAO: &str = "🔐 Recuperação de Senha - SGE Estoque";

/// Só dígitos, com o DDI 55 quando ausente.
pub fn normalizar_telefone(telefone: &str) -> Option<String> {
    let digitos: String = telefone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digitos.is_empty() {
        return None;
    }
    if digitos.starts_with("55") {
        Some(digitos)
    } else {
        Some(format!("55{digitos}"))
    }
}

pub fn texto_whatsapp(token: &str) -> String {
    format!(
        "🔐 *Recuperação de Senha - SGE Estoque*\n\nSeu código de recuperação é: *{token}*\n\nEste código expira em 15 minutos."
    )
}

pub fn html_email(nome: &str, token: &str) -> String {
    format!(
        r#"<h2>Recuperação de Senha - SGE Estoque</h2>
<p>Olá <strong>{nome}</strong>,</p>
<p>Seu código de recuperação é:</p>
<h1 style="color:#0052D4;">{token}</h1>
<p>Este código expira em 15 minutos.</p>
<br/>
<p style="font-size:12px;color:#777;">SGE Software ©</p>"#
    )
}

#[async_trait]
pub trait Notificador: Send + Sync {
    fn canal(&self) -> &'static str;

    /// `Ok(false)` quando o usuário não tem destino para este canal.
    async fn enviar_token(&self, usuario: &Usuario, token: &str) -> anyhow::Result<bool>;
}

// ---
// WhatsApp (Evolution API)
// ---

pub struct WhatsAppNotificador {
    client: reqwest::Client,
    url: String,
    apikey: String,
}

impl WhatsAppNotificador {
    pub fn new(client: reqwest::Client, config: &EvolutionConfig) -> Self {
        let url = format!(
            "{}/message/sendText/{}",
            config.url.trim_end_matches('/'),
            config.instancia
        );
        Self {
            client,
            url,
            apikey: config.apikey.clone(),
        }
    }
}

#[async_trait]
impl Notificador for WhatsAppNotificador {
    fn canal(&self) -> &'static str {
        "whatsapp"
    }

    async fn enviar_token(&self, usuario: &Usuario, token: &str) -> anyhow::Result<bool> {
        let Some(numero) = usuario.telefone.as_deref().and_then(normalizar_telefone) else {
            return Ok(false);
        };

        self.client
            .post(&self.url)
            .header("apikey", &self.apikey)
            .json(&json!({ "number": numero, "text": texto_whatsapp(token) }))
            .send()
            .await
            .context("falha na requisição para a Evolution API")?
            .error_for_status()
            .context("Evolution API recusou a mensagem")?;

        tracing::info!("✅ Token enviado via WhatsApp para {}", numero);
        Ok(true)
    }
}

// ---
// E-mail (SMTP com STARTTLS)
// ---

pub struct EmailNotificador {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    remetente: Mailbox,
}

impl EmailNotificador {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("SMTP_HOST inválido")?
            .port(config.port)
            .credentials(Credentials::new(config.usuario.clone(), config.senha.clone()))
            .build();
        let remetente = config
            .remetente
            .parse()
            .context("SMTP_FROM não é um endereço válido")?;
        Ok(Self { transport, remetente })
    }
}

#[async_trait]
impl Notificador for EmailNotificador {
    fn canal(&self) -> &'static str {
        "e-mail"
    }

    async fn enviar_token(&self, usuario: &Usuario, token: &str) -> anyhow::Result<bool> {
        let Some(email) = usuario.email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(false);
        };

        let mensagem = Message::builder()
            .from(self.remetente.clone())
            .to(email.trim().parse().context("e-mail do usuário inválido")?)
            .subject(ASSUNTO_RECUPERACAO)
            .header(ContentType::TEXT_HTML)
            .body(html_email(&usuario.nome, token))?;

        self.transport.send(mensagem).await?;

        tracing::info!("📧 Token enviado por e-mail para {}", email);
        Ok(true)
    }
}

// ---
// Conjunto de canais
// ---

/// Canais ativos. Falhas de envio são apenas registradas em log.
#[derive(Clone, Default)]
pub struct Notificacoes {
    canais: Vec<Arc<dyn Notificador>>,
}

impl Notificacoes {
    pub fn new(canais: Vec<Arc<dyn Notificador>>) -> Self {
        Self { canais }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut canais: Vec<Arc<dyn Notificador>> = Vec::new();

        match &config.evolution {
            Some(evolution) => {
                let client = reqwest::Client::new();
                canais.push(Arc::new(WhatsAppNotificador::new(client, evolution)));
            }
            None => tracing::warn!("⚠️ EVOLUTION_* não configurado: recuperação de senha sem WhatsApp."),
        }

        match &config.email {
            Some(email) => canais.push(Arc::new(EmailNotificador::new(email)?)),
            None => tracing::warn!("⚠️ SMTP_* não configurado: recuperação de senha sem e-mail."),
        }

        Ok(Self { canais })
    }

    pub async fn enviar_token(&self, usuario: &Usuario, token: &str) {
        for canal in &self.canais {
            match canal.enviar_token(usuario, token).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("Usuário {} sem destino para {}", usuario.id, canal.canal()),
                Err(e) => tracing::warn!("Erro ao enviar token via {}: {:#}", canal.canal(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telefone_recebe_ddi() {
        assert_eq!(normalizar_telefone("(11) 98765-4321").as_deref(), Some("5511987654321"));
        assert_eq!(normalizar_telefone("5511987654321").as_deref(), Some("5511987654321"));
        assert_eq!(normalizar_telefone("sem numero"), None);
    }

    #[test]
    fn texto_contem_token_e_validade() {
        let texto = texto_whatsapp("123456");
        assert!(texto.contains("*123456*"));
        assert!(texto.contains("15 minutos"));
        assert!(html_email("Ana", "123456").contains("<strong>Ana</strong>"));
    }
}
