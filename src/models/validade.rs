// src/models/validade.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Lote de validade de um produto. `ativo` é 1/0 como no ERP.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ProdutoValidade {
    pub id: i32,
    pub cod_loja: i32,
    pub cod_produto: i32,
    pub vencimento: NaiveDate,
    pub ativo: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidadeInput {
    #[validate(
        required(message = "Campos obrigatorios: cod_loja, cod_produto e vencimento."),
        range(min = 1, message = "cod_loja deve ser inteiro positivo.")
    )]
    pub cod_loja: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, cod_produto e vencimento."),
        range(min = 1, message = "cod_produto deve ser inteiro positivo.")
    )]
    pub cod_produto: Option<i32>,

    /// Formato YYYY-MM-DD.
    #[validate(required(message = "Campos obrigatorios: cod_loja, cod_produto e vencimento."))]
    pub vencimento: Option<NaiveDate>,

    #[validate(range(min = 0, max = 1, message = "ativo deve ser 0 ou 1."))]
    pub ativo: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovaValidade {
    pub cod_loja: i32,
    pub cod_produto: i32,
    pub vencimento: NaiveDate,
    pub ativo: i32,
}

impl ValidadeInput {
    pub fn em_registro(self) -> Option<NovaValidade> {
        Some(NovaValidade {
            cod_loja: self.cod_loja?,
            cod_produto: self.cod_produto?,
            vencimento: self.vencimento?,
            ativo: self.ativo.unwrap_or(1),
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProximosQuery {
    pub cod_loja: i32,
    pub cod_produto: Option<i32>,
    /// Janela em dias a partir de hoje; ausente = todos os lotes ativos.
    pub dias: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InativarValidadePayload {
    pub id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidadesRegistradas {
    pub message: String,
    pub total: usize,
    pub data: Vec<ProdutoValidade>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ativo_padrao_e_um() {
        let input: ValidadeInput =
            serde_json::from_str(r#"{"cod_loja": 1, "cod_produto": 2, "vencimento": "2025-12-31"}"#).unwrap();
        assert!(input.validate().is_ok());
        let registro = input.em_registro().unwrap();
        assert_eq!(registro.ativo, 1);
        assert_eq!(registro.vencimento, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn data_fora_do_formato_falha_na_desserializacao() {
        assert!(serde_json::from_str::<ValidadeInput>(r#"{"vencimento": "31/12/2025"}"#).is_err());
    }
}
