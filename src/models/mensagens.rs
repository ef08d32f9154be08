// src/models/mensagens.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

// ---
// Enums (espelham os tipos do Postgres)
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_atendimento", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusAtendimento {
    Aberto,
    EmAtendimento,
    Finalizado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "direcao_mensagem", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DirecaoMensagem {
    Entrada,
    Saida,
}

impl DirecaoMensagem {
    pub fn parse(valor: &str) -> Option<Self> {
        match valor.trim().to_lowercase().as_str() {
            "entrada" => Some(Self::Entrada),
            "saida" | "saída" => Some(Self::Saida),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_mensagem", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoMensagem {
    Texto,
    Imagem,
    Video,
    Audio,
    Documento,
}

impl TipoMensagem {
    /// Tipo de mídia deduzido do MIME; desconhecido vira documento.
    pub fn pelo_mimetype(mimetype: &str) -> Self {
        let m = mimetype.to_lowercase();
        if m.starts_with("image/") {
            Self::Imagem
        } else if m.starts_with("video/") {
            Self::Video
        } else if m.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Documento
        }
    }

    pub fn parse(valor: &str) -> Option<Self> {
        match valor.trim().to_lowercase().as_str() {
            "texto" | "text" => Some(Self::Texto),
            "imagem" | "image" => Some(Self::Imagem),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "documento" | "document" => Some(Self::Documento),
            _ => None,
        }
    }
}

// ---
// Entidades
// ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Contato {
    pub id: i32,
    pub cod_loja: i32,
    pub telefone: String,
    pub contato: String,
    pub tipo: String,
    pub cliente_codigo: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Atendimento {
    pub id: i32,
    pub cod_loja: i32,
    pub contato_id: i32,
    pub cliente_codigo: Option<i32>,
    pub usuario_id: Option<i32>,
    pub origem: String,
    pub status: StatusAtendimento,
    pub aberto_em: DateTime<Utc>,
    pub iniciado_em: Option<DateTime<Utc>>,
    pub finalizado_em: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Mensagem {
    pub id: i32,
    pub cod_loja: i32,
    pub atendimento_id: i32,
    pub contato_id: i32,
    pub usuario_id: Option<i32>,
    pub direcao: DirecaoMensagem,
    pub tipo: TipoMensagem,
    pub texto: Option<String>,
    pub midia_base64: Option<String>,
    pub mimetype: Option<String>,
    pub id_externo: Option<String>,
    // Corpo bruto do provedor, guardado para auditoria.
    #[serde(skip_serializing)]
    pub payload: Option<Value>,
    pub criado_em: DateTime<Utc>,
}

/// Linha da listagem de atendimentos.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AtendimentoResumo {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub atendimento: Atendimento,
    pub contato_nome: String,
    pub telefone: String,
    pub ultima_mensagem_em: Option<DateTime<Utc>>,
}

/// Mensagem pronta para inserir.
#[derive(Debug, Clone, PartialEq)]
pub struct NovaMensagem {
    pub direcao: DirecaoMensagem,
    pub tipo: TipoMensagem,
    pub texto: Option<String>,
    pub midia_base64: Option<String>,
    pub mimetype: Option<String>,
    pub id_externo: Option<String>,
    pub usuario_id: Option<i32>,
    pub payload: Option<Value>,
}

// ---
// Máquina de estados do atendimento
// ---
//
//   aberto -> em_atendimento -> finalizado
//   aberto -> finalizado
//   em_atendimento -> em_atendimento (mesmo dono)
//
// Nada sai de finalizado.

const MSG_EM_POSSE: &str = "Atendimento em posse de outro usuario.";

impl Atendimento {
    /// Visível para `usuario_id` se não está em atendimento, não tem dono ou é dele.
    pub fn pode_acessar(&self, usuario_id: Option<i32>) -> bool {
        self.status != StatusAtendimento::EmAtendimento
            || self.usuario_id.is_none()
            || self.usuario_id == usuario_id
    }

    pub fn exigir_acesso(&self, usuario_id: Option<i32>) -> Result<(), AppError> {
        if self.pode_acessar(usuario_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(MSG_EM_POSSE.into()))
        }
    }

    pub fn validar_envio(&self, usuario_id: i32) -> Result<(), AppError> {
        self.exigir_acesso(Some(usuario_id))?;
        if self.status == StatusAtendimento::Finalizado {
            return Err(AppError::BadRequest(
                "Atendimento finalizado. Nao e possivel enviar mensagens.".into(),
            ));
        }
        Ok(())
    }

    pub fn iniciar(&mut self, usuario_id: i32, agora: DateTime<Utc>) -> Result<(), AppError> {
        match self.status {
            StatusAtendimento::Finalizado => Err(AppError::BadRequest(
                "Atendimento finalizado. Nao e possivel iniciar.".into(),
            )),
            StatusAtendimento::EmAtendimento if self.usuario_id.is_some_and(|dono| dono != usuario_id) => {
                Err(AppError::Conflict(
                    "Atendimento ja esta em atendimento por outro usuario.".into(),
                ))
            }
            _ => {
                self.status = StatusAtendimento::EmAtendimento;
                self.usuario_id = Some(usuario_id);
                self.iniciado_em.get_or_insert(agora);
                Ok(())
            }
        }
    }

    /// Idempotente: um `finalizado_em` existente é preservado.
    pub fn finalizar(&mut self, usuario_id: Option<i32>, agora: DateTime<Utc>) -> Result<(), AppError> {
        if usuario_id.is_some() {
            self.exigir_acesso(usuario_id)?;
        }
        self.status = StatusAtendimento::Finalizado;
        self.finalizado_em.get_or_insert(agora);
        Ok(())
    }
}

// ---
// Payloads
// ---

fn validar_conteudo(payload: &EnviarMensagemPayload) -> Result<(), ValidationError> {
    let tem_texto = payload.texto.as_deref().is_some_and(|t| !t.trim().is_empty());
    if tem_texto || payload.midia_base64.is_some() || payload.payload.is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("conteudo");
    err.message = Some("Informe texto ou midia.".into());
    Err(err)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validar_conteudo"))]
pub struct EnviarMensagemPayload {
    #[validate(required(message = "cod_loja, atendimento_id e usuario_id sao obrigatorios."))]
    pub cod_loja: Option<i32>,

    #[validate(required(message = "cod_loja, atendimento_id e usuario_id sao obrigatorios."))]
    pub atendimento_id: Option<i32>,

    #[validate(required(message = "cod_loja, atendimento_id e usuario_id sao obrigatorios."))]
    pub usuario_id: Option<i32>,

    pub texto: Option<String>,
    pub midia_base64: Option<String>,
    pub mimetype: Option<String>,
    pub tipo: Option<TipoMensagem>,
    pub direcao: Option<DirecaoMensagem>,
    pub id_externo: Option<String>,

    #[serde(default)]
    pub iniciar_atendimento: bool,

    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

impl EnviarMensagemPayload {
    pub fn nova_mensagem(&self, usuario_id: i32) -> NovaMensagem {
        let tipo = self.tipo.unwrap_or_else(|| match (&self.midia_base64, &self.mimetype) {
            (Some(_), Some(mimetype)) => TipoMensagem::pelo_mimetype(mimetype),
            (Some(_), None) => TipoMensagem::Documento,
            _ => TipoMensagem::Texto,
        });

        NovaMensagem {
            direcao: self.direcao.unwrap_or(DirecaoMensagem::Saida),
            tipo,
            texto: self.texto.clone(),
            midia_base64: self.midia_base64.clone(),
            mimetype: self.mimetype.clone(),
            id_externo: self.id_externo.clone(),
            usuario_id: Some(usuario_id),
            payload: self.payload.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IniciarAtendimentoPayload {
    #[validate(required(message = "cod_loja e cod_usuario sao obrigatorios."))]
    pub cod_loja: Option<i32>,

    #[validate(required(message = "cod_loja e cod_usuario sao obrigatorios."))]
    pub cod_usuario: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FinalizarAtendimentoPayload {
    #[validate(required(message = "cod_loja e obrigatorio."))]
    pub cod_loja: Option<i32>,

    pub cod_usuario: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListarAtendimentosQuery {
    pub cod_loja: i32,
    pub cod_usuario: Option<i32>,
    pub status: Option<StatusAtendimento>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListarMensagensQuery {
    pub cod_loja: i32,
    pub cod_usuario: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Só mensagens com id maior (sincronização incremental).
    pub apos_id: Option<i32>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct MensagemRegistrada {
    pub message: String,
    pub atendimento_id: i32,
    pub mensagem_id: i32,
    pub status_atendimento: StatusAtendimento,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookProcessado {
    pub message: String,
    pub atendimento_id: i32,
    pub mensagem_id: i32,
    pub contato_id: i32,
    pub novo_atendimento: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookIgnorado {
    pub message: String,
    pub ignorado: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MensagensDoAtendimento {
    pub total: i64,
    pub data: Vec<Mensagem>,
    pub atendimento: Atendimento,
    #[serde(rename = "nextOffset")]
    pub next_offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MensagensDoContato {
    pub total: i64,
    pub data: Vec<Mensagem>,
    pub contato: Contato,
    #[serde(rename = "nextOffset")]
    pub next_offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atendimento(status: StatusAtendimento, usuario_id: Option<i32>) -> Atendimento {
        Atendimento {
            id: 1,
            cod_loja: 1,
            contato_id: 1,
            cliente_codigo: None,
            usuario_id,
            origem: "whatsapp".into(),
            status,
            aberto_em: Utc::now(),
            iniciado_em: None,
            finalizado_em: None,
        }
    }

    #[test]
    fn visibilidade() {
        assert!(atendimento(StatusAtendimento::Aberto, None).pode_acessar(Some(2)));
        assert!(atendimento(StatusAtendimento::EmAtendimento, None).pode_acessar(Some(2)));
        assert!(atendimento(StatusAtendimento::EmAtendimento, Some(2)).pode_acessar(Some(2)));
        assert!(!atendimento(StatusAtendimento::EmAtendimento, Some(1)).pode_acessar(Some(2)));
        assert!(!atendimento(StatusAtendimento::EmAtendimento, Some(1)).pode_acessar(None));
        assert!(atendimento(StatusAtendimento::Finalizado, Some(1)).pode_acessar(Some(2)));
    }

    #[test]
    fn iniciar_atribui_dono_e_preserva_primeiro_inicio() {
        let mut a = atendimento(StatusAtendimento::Aberto, None);
        let primeiro = Utc::now();
        a.iniciar(7, primeiro).unwrap();
        assert_eq!(a.status, StatusAtendimento::EmAtendimento);
        assert_eq!(a.usuario_id, Some(7));

        a.iniciar(7, primeiro + chrono::Duration::minutes(5)).unwrap();
        assert_eq!(a.iniciado_em, Some(primeiro));
    }

    #[test]
    fn iniciar_em_posse_de_outro_e_conflito() {
        let mut a = atendimento(StatusAtendimento::EmAtendimento, Some(1));
        assert!(matches!(a.iniciar(2, Utc::now()), Err(AppError::Conflict(_))));
    }

    #[test]
    fn finalizado_nao_reinicia_nem_recebe_envio() {
        let mut a = atendimento(StatusAtendimento::Finalizado, None);
        assert!(matches!(a.iniciar(2, Utc::now()), Err(AppError::BadRequest(_))));
        assert!(matches!(a.validar_envio(2), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn envio_por_outro_usuario_e_proibido() {
        let a = atendimento(StatusAtendimento::EmAtendimento, Some(1));
        assert!(matches!(a.validar_envio(2), Err(AppError::Forbidden(_))));
        assert!(a.validar_envio(1).is_ok());
    }

    #[test]
    fn finalizar_e_idempotente() {
        let mut a = atendimento(StatusAtendimento::EmAtendimento, Some(1));
        let primeiro = Utc::now();
        a.finalizar(Some(1), primeiro).unwrap();
        a.finalizar(None, primeiro + chrono::Duration::hours(1)).unwrap();
        assert_eq!(a.status, StatusAtendimento::Finalizado);
        assert_eq!(a.finalizado_em, Some(primeiro));
    }

    #[test]
    fn finalizar_por_outro_dono_e_proibido() {
        let mut a = atendimento(StatusAtendimento::EmAtendimento, Some(1));
        assert!(matches!(a.finalizar(Some(2), Utc::now()), Err(AppError::Forbidden(_))));
        assert_eq!(a.status, StatusAtendimento::EmAtendimento);
    }

    #[test]
    fn refinalizar_por_outro_usuario_mantem_o_registro() {
        let mut a = atendimento(StatusAtendimento::Finalizado, Some(1));
        let fechado_em = Utc::now() - chrono::Duration::hours(2);
        a.finalizado_em = Some(fechado_em);

        assert!(a.pode_acessar(Some(2)));
        a.finalizar(Some(2), Utc::now()).unwrap();
        assert_eq!(a.status, StatusAtendimento::Finalizado);
        assert_eq!(a.usuario_id, Some(1));
        assert_eq!(a.finalizado_em, Some(fechado_em));
    }

    #[test]
    fn aberto_pode_ser_finalizado_direto() {
        let mut a = atendimento(StatusAtendimento::Aberto, None);
        a.finalizar(Some(3), Utc::now()).unwrap();
        assert_eq!(a.status, StatusAtendimento::Finalizado);
        assert_eq!(a.usuario_id, None);
    }

    #[test]
    fn tipo_deduzido_da_midia() {
        let payload: EnviarMensagemPayload = serde_json::from_str(
            r#"{"cod_loja": 1, "atendimento_id": 2, "usuario_id": 3, "midia_base64": "AAAA", "mimetype": "image/png"}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        let nova = payload.nova_mensagem(3);
        assert_eq!(nova.tipo, TipoMensagem::Imagem);
        assert_eq!(nova.direcao, DirecaoMensagem::Saida);
    }

    #[test]
    fn envio_sem_conteudo_e_invalido() {
        let payload: EnviarMensagemPayload =
            serde_json::from_str(r#"{"cod_loja": 1, "atendimento_id": 2, "usuario_id": 3, "texto": "  "}"#).unwrap();
        assert!(payload.validate().is_err());
    }
}
