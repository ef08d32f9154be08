// src/services/auth.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{LojaRepository, UsuarioRepository},
    models::{
        auth::{
            Claims, EsqueciSenhaPayload, LoginPayload, LoginResponse, MensagemResponse, PrimeiroAcessoPayload,
            RecuperacaoIniciada, RedefinirSenhaPayload,
        },
        loja::LojaResumo,
        usuario::Usuario,
    },
    services::notificacao::Notificacoes,
};

/// Validade do código de recuperação.
pub const VALIDADE_TOKEN_MINUTOS: i64 = 15;
const VALIDADE_JWT_DIAS: i64 = 7;
const TENTATIVAS_TOKEN: usize = 5;

const MSG_TOKEN_INVALIDO: &str = "Token inválido ou expirado.";

/// Código numérico de 6 dígitos, sem zero à esquerda.
pub fn gerar_token_recuperacao() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn expiracao_token(agora: DateTime<Utc>) -> DateTime<Utc> {
    agora + Duration::minutes(VALIDADE_TOKEN_MINUTOS)
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    usuario_repo: UsuarioRepository,
    loja_repo: LojaRepository,
    notificacoes: Notificacoes,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        usuario_repo: UsuarioRepository,
        loja_repo: LojaRepository,
        notificacoes: Notificacoes,
        jwt_secret: String,
    ) -> Self {
        Self {
            pool,
            usuario_repo,
            loja_repo,
            notificacoes,
            jwt_secret,
        }
    }

    async fn usuario_por_login(&self, login: &str) -> Result<Option<Usuario>, AppError> {
        self.usuario_repo.buscar_por_login(login.trim()).await
    }

    pub async fn login(&self, payload: &LoginPayload) -> Result<LoginResponse, AppError> {
        let usuario = self
            .usuario_por_login(&payload.login)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Usuário não encontrado.".into()))?;

        let Some(senha) = usuario.senha_md5.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(LoginResponse::PrimeiroAcesso {
                primeiro_acesso: true,
                mensagem: "Usuário sem senha cadastrada. Crie uma senha para continuar.".into(),
                usuario,
            });
        };

        if payload.senha_md5.as_deref() != Some(senha) {
            return Err(AppError::Unauthorized("Senha incorreta.".into()));
        }

        let loja = self
            .loja_repo
            .buscar_por_codigo(usuario.cod_loja)
            .await?
            .map(|l| LojaResumo::from(&l));
        let token = self.criar_jwt(&usuario)?;

        tracing::info!("🔓 Login do usuário {} (loja {})", usuario.id, usuario.cod_loja);

        Ok(LoginResponse::Autenticado {
            primeiro_acesso: false,
            usuario,
            loja,
            token,
        })
    }

    pub async fn primeiro_acesso(&self, payload: &PrimeiroAcessoPayload) -> Result<MensagemResponse, AppError> {
        let usuario = self
            .usuario_por_login(&payload.login)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))?;

        if usuario.senha_md5.as_deref().is_some_and(|s| !s.is_empty()) {
            return Err(AppError::BadRequest("Usuário já possui senha cadastrada.".into()));
        }

        self.usuario_repo
            .definir_senha(&self.pool, usuario.id, &payload.senha_md5)
            .await?;

        Ok(MensagemResponse {
            message: "Senha definida com sucesso.".into(),
        })
    }

    /// Gera o código e tenta enviá-lo. Falhas de envio não abortam.
    pub async fn esqueci_senha(&self, payload: &EsqueciSenhaPayload) -> Result<RecuperacaoIniciada, AppError> {
        let usuario = self
            .usuario_por_login(&payload.login)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))?;

        let expira_em = expiracao_token(Utc::now());
        let token = self.emitir_token(usuario.id, expira_em).await?;

        self.notificacoes.enviar_token(&usuario, &token).await;

        Ok(RecuperacaoIniciada {
            message: "Token de recuperação gerado e enviado via WhatsApp e e-mail.".into(),
            expira_em,
        })
    }

    /// Sorteia códigos até achar um livre entre os tokens ativos.
    async fn emitir_token(&self, id_usuario: i32, expira_em: DateTime<Utc>) -> Result<String, AppError> {
        for _ in 0..TENTATIVAS_TOKEN {
            let token = gerar_token_recuperacao();
            if self.usuario_repo.criar_token(id_usuario, &token, expira_em).await?.is_some() {
                return Ok(token);
            }
            tracing::debug!("Código de recuperação em uso, sorteando outro");
        }
        Err(AppError::Conflict(
            "Não foi possível gerar um código de recuperação. Tente novamente.".into(),
        ))
    }

    /// Token de uso único: é apagado junto com a troca de senha.
    pub async fn redefinir_senha(&self, payload: &RedefinirSenhaPayload) -> Result<MensagemResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let token = self
            .usuario_repo
            .buscar_token(&mut *tx, payload.token.trim())
            .await?
            .filter(|t| !t.expirado(Utc::now()))
            .ok_or_else(|| AppError::BadRequest(MSG_TOKEN_INVALIDO.into()))?;

        self.usuario_repo
            .definir_senha(&mut *tx, token.id_usuario, &payload.nova_senha_md5)
            .await?;
        self.usuario_repo.remover_token(&mut *tx, token.id).await?;

        tx.commit().await?;

        Ok(MensagemResponse {
            message: "Senha redefinida com sucesso.".into(),
        })
    }

    pub async fn validar_token(&self, token: &str) -> Result<Usuario, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.usuario_repo
            .buscar_por_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    fn criar_jwt(&self, usuario: &Usuario) -> Result<String, AppError> {
        let agora = Utc::now();
        let claims = Claims {
            sub: usuario.id,
            cod_loja: usuario.cod_loja,
            exp: (agora + Duration::days(VALIDADE_JWT_DIAS)).timestamp() as usize,
            iat: agora.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_tem_seis_digitos() {
        for _ in 0..200 {
            let token = gerar_token_recuperacao();
            assert_eq!(token.len(), 6);
            assert!(token.bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(token.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn expira_em_quinze_minutos() {
        let agora = Utc::now();
        assert_eq!(expiracao_token(agora) - agora, Duration::minutes(15));
    }
}
