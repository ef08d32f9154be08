// src/models/contagem.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Leitura de inventário feita no coletor. Só é inserida, nunca alterada,
/// exceto pela marcação de sincronização.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Contagem {
    pub id: i32,
    pub cod_loja: i32,
    pub cod_usuario: i32,
    pub cod_produto: i32,
    pub qtde: Decimal,
    pub sincronizado: bool,
    pub lote: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemContagemPayload {
    pub cod_produto: Option<i32>,
    pub qtde: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SyncContagensPayload {
    #[validate(required(message = "cod_loja e cod_usuario sao obrigatorios."))]
    pub cod_loja: Option<i32>,

    #[validate(required(message = "cod_loja e cod_usuario sao obrigatorios."))]
    pub cod_usuario: Option<i32>,

    #[serde(default)]
    pub itens: Vec<ItemContagemPayload>,
}

/// Linha pronta para inserir.
#[derive(Debug, Clone, PartialEq)]
pub struct NovaContagem {
    pub cod_produto: i32,
    pub qtde: Decimal,
    pub created_at: DateTime<Utc>,
}

impl SyncContagensPayload {
    /// Itens sem `cod_produto` ou `qtde` são descartados.
    pub fn itens_validos(&self, agora: DateTime<Utc>) -> Vec<NovaContagem> {
        self.itens
            .iter()
            .filter_map(|item| {
                Some(NovaContagem {
                    cod_produto: item.cod_produto?,
                    qtde: item.qtde?,
                    created_at: item.created_at.unwrap_or(agora),
                })
            })
            .collect()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncContagensResponse {
    pub status: String,
    pub inseridos: usize,
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContagensPendentes {
    pub total: usize,
    pub lote: Option<Uuid>,
    pub data: Vec<Contagem>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MarcarSincronizadoPayload {
    #[validate(length(min = 1, message = "Informe ao menos um id."))]
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarcarSincronizadoResponse {
    pub message: String,
    pub total_atualizadas: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itens_incompletos_sao_ignorados() {
        let payload: SyncContagensPayload = serde_json::from_str(
            r#"{
                "cod_loja": 1,
                "cod_usuario": 2,
                "itens": [
                    {"cod_produto": 10, "qtde": 3},
                    {"cod_produto": 11},
                    {"qtde": 1},
                    {"cod_produto": 12, "qtde": 0.5, "created_at": "2024-05-01T10:00:00Z"}
                ]
            }"#,
        )
        .unwrap();

        let agora = Utc::now();
        let itens = payload.itens_validos(agora);
        assert_eq!(itens.len(), 2);
        assert_eq!(itens[0].cod_produto, 10);
        assert_eq!(itens[0].created_at, agora);
        assert_eq!(itens[1].created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn marcar_exige_ids() {
        let payload = MarcarSincronizadoPayload { ids: vec![] };
        assert!(payload.validate().is_err());
    }
}
