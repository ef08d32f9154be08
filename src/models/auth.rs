// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{loja::LojaResumo, usuario::Usuario};

// Login aceita e-mail ou telefone; a senha chega como digest MD5 do cliente.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Informe o e-mail ou telefone."))]
    #[serde(default)]
    pub login: String,

    pub senha_md5: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PrimeiroAcessoPayload {
    #[validate(length(min = 1, message = "Informe o e-mail ou telefone."))]
    #[serde(default)]
    pub login: String,

    #[validate(length(min = 1, message = "Informe a nova senha."))]
    #[serde(default)]
    pub senha_md5: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EsqueciSenhaPayload {
    #[validate(length(min = 1, message = "Informe o e-mail ou telefone."))]
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RedefinirSenhaPayload {
    #[validate(length(equal = 6, message = "Token inválido ou expirado."))]
    #[serde(default)]
    pub token: String,

    #[validate(length(min = 1, message = "Informe a nova senha."))]
    #[serde(default)]
    pub nova_senha_md5: String,
}

/// Resposta do login: primeiro acesso (sem senha cadastrada) ou sessão aberta.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum LoginResponse {
    PrimeiroAcesso {
        primeiro_acesso: bool,
        mensagem: String,
        usuario: Usuario,
    },
    Autenticado {
        primeiro_acesso: bool,
        usuario: Usuario,
        loja: Option<LojaResumo>,
        token: String,
    },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MensagemResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecuperacaoIniciada {
    pub message: String,
    pub expira_em: DateTime<Utc>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,      // id interno do usuário
    pub cod_loja: i32, // loja do usuário
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRecuperacao {
    pub id: i32,
    pub id_usuario: i32,
    pub token: String,
    pub expira_em: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecuperacao {
    pub fn expirado(&self, agora: DateTime<Utc>) -> bool {
        self.expira_em <= agora
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expira_no_instante_limite() {
        let agora = Utc::now();
        let token = TokenRecuperacao {
            id: 1,
            id_usuario: 1,
            token: "123456".into(),
            expira_em: agora,
            created_at: agora - chrono::Duration::minutes(15),
        };
        assert!(token.expirado(agora));
        assert!(!token.expirado(agora - chrono::Duration::seconds(1)));
    }

    #[test]
    fn login_vazio_e_invalido() {
        let payload: LoginPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.validate().is_err());
    }
}
