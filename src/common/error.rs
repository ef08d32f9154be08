use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // Falha de validação de um item dentro de um lote (cadastrar, pedidos).
    #[error("Item {index} inválido: {message}")]
    ItemInvalido {
        index: usize,
        message: String,
        details: Value,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),

    #[error(transparent)]
    QueryRejection(#[from] QueryRejection),

    #[error(transparent)]
    PathRejection(#[from] PathRejection),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação de um item de lote: a primeira mensagem vira `error`,
    /// o mapa completo vai em `details`.
    pub fn item_invalido(index: usize, errors: ValidationErrors) -> Self {
        // Campo ausente tem prioridade; entre os demais, ordem alfabética do campo.
        let campos: BTreeMap<_, _> = errors.field_errors().into_iter().collect();
        let todos = || campos.values().flat_map(|erros| erros.iter());
        let message = todos()
            .find(|e| e.code == "required")
            .or_else(|| todos().next())
            .map(mensagem_do_erro)
            .unwrap_or_else(|| "Registro inválido.".to_string());

        AppError::ItemInvalido {
            index,
            message,
            details: json!(detalhes_validacao(&errors)),
        }
    }
}

fn mensagem_do_erro(e: &ValidationError) -> String {
    e.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| e.code.to_string())
}

/// Campo -> mensagens, na forma devolvida ao cliente.
pub fn detalhes_validacao(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            (field.to_string(), field_errors.iter().map(mensagem_do_erro).collect())
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": detalhes_validacao(&errors),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ItemInvalido {
                index,
                message,
                details,
            } => {
                let body = Json(json!({
                    "error": message,
                    "index": index,
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Corpo, query ou path malformados: devolvemos o texto do axum.
            AppError::JsonRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::QueryRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::PathRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),

            // Violações de constraint viram erros do cliente; o resto é 500.
            AppError::DatabaseError(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    "Violação de unicidade: {:?}",
                    db_err.constraint().unwrap_or_default()
                );
                (
                    StatusCode::CONFLICT,
                    "Registro duplicado: já existe um registro com a mesma chave.".to_string(),
                )
            }
            AppError::DatabaseError(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                tracing::warn!(
                    "Violação de chave estrangeira: {:?}",
                    db_err.constraint().unwrap_or_default()
                );
                (
                    StatusCode::BAD_REQUEST,
                    "Referência inválida: registro relacionado não existe.".to_string(),
                )
            }

            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_invalido_usa_primeira_mensagem() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("required");
        err.message = Some("Campos obrigatorios: cod_loja e codigo.".into());
        errors.add("cod_loja", err);

        match AppError::item_invalido(3, errors) {
            AppError::ItemInvalido { index, message, details } => {
                assert_eq!(index, 3);
                assert_eq!(message, "Campos obrigatorios: cod_loja e codigo.");
                assert!(details.get("cod_loja").is_some());
            }
            other => panic!("variante inesperada: {other:?}"),
        }
    }

    #[test]
    fn item_invalido_prefere_campo_ausente_de_forma_estavel() {
        let erros = || {
            let mut errors = ValidationErrors::new();
            let mut faixa = ValidationError::new("range");
            faixa.message = Some("codigo deve ser inteiro positivo.".into());
            errors.add("codigo", faixa);
            let mut vazio = ValidationError::new("length");
            vazio.message = Some("nome nao pode ser vazio.".into());
            errors.add("nome", vazio);
            let mut ausente = ValidationError::new("required");
            ausente.message = Some("Campos obrigatorios: cod_loja, codigo, nome e unidade_medida.".into());
            errors.add("unidade_medida", ausente);
            errors
        };

        for _ in 0..20 {
            match AppError::item_invalido(0, erros()) {
                AppError::ItemInvalido { message, .. } => {
                    assert_eq!(message, "Campos obrigatorios: cod_loja, codigo, nome e unidade_medida.");
                }
                other => panic!("variante inesperada: {other:?}"),
            }
        }

        let mut sem_ausente = ValidationErrors::new();
        sem_ausente.add("nome", ValidationError::new("length"));
        sem_ausente.add("codigo", ValidationError::new("range"));
        match AppError::item_invalido(0, sem_ausente) {
            AppError::ItemInvalido { message, .. } => assert_eq!(message, "range"),
            other => panic!("variante inesperada: {other:?}"),
        }
    }

    #[test]
    fn status_dos_erros_de_negocio() {
        let casos = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::DatabaseError(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (erro, esperado) in casos {
            assert_eq!(erro.into_response().status(), esperado);
        }
    }
}
