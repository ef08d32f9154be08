// src/models/pedido_restaurante.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::error::AppError;

// Status do pedido de restaurante.
pub const STATUS_LIBERADO: i32 = 0;
pub const STATUS_PROCESSADO: i32 = 1;
pub const STATUS_ALTERANDO: i32 = 2;
pub const STATUS_CANCELADO: i32 = 3;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PedidoRestaurante {
    pub id: i32,
    pub cod_loja: i32,
    pub cod_usuario: i32,
    pub codigo_cartao: Option<String>,
    pub data_hora: DateTime<Utc>,
    pub origem: String,
    pub status: i32,
    pub total_itens: Decimal,
    pub total_pedido: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ItemPedidoRestaurante {
    pub id: i32,
    pub pedido_id: i32,
    pub cod_produto: i32,
    pub descricao: String,
    pub quantidade: Decimal,
    pub pr_venda: Decimal,
    pub pr_custo: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PedidoRestauranteComItens {
    #[serde(flatten)]
    pub pedido: PedidoRestaurante,
    pub itens: Vec<ItemPedidoRestaurante>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemRestaurantePayload {
    pub cod_produto: Option<i32>,
    pub descricao: Option<String>,
    pub quantidade: Option<Decimal>,
    pub pr_venda: Option<Decimal>,
    pub pr_custo: Option<Decimal>,
    pub subtotal: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TotaisPayload {
    pub total_itens: Option<Decimal>,
    pub total_pedido: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CadastrarPedidoRestaurantePayload {
    /// Presente: substitui cabeçalho e itens do pedido existente.
    pub id: Option<i32>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, cod_usuario, data_hora, origem, totais e itens."))]
    pub cod_loja: Option<i32>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, cod_usuario, data_hora, origem, totais e itens."))]
    pub cod_usuario: Option<i32>,

    pub codigo_cartao: Option<String>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, cod_usuario, data_hora, origem, totais e itens."))]
    pub data_hora: Option<DateTime<Utc>>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, cod_usuario, data_hora, origem, totais e itens."),
        length(min = 1, message = "origem nao pode ser vazia.")
    )]
    pub origem: Option<String>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, cod_usuario, data_hora, origem, totais e itens."))]
    pub totais: Option<TotaisPayload>,

    #[validate(length(min = 1, message = "Pedido sem itens."))]
    #[serde(default)]
    pub itens: Vec<ItemRestaurantePayload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NovoItemRestaurante {
    pub cod_produto: i32,
    pub descricao: String,
    pub quantidade: Decimal,
    pub pr_venda: Decimal,
    pub pr_custo: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone)]
pub struct NovoPedidoRestaurante {
    pub id: Option<i32>,
    pub cod_loja: i32,
    pub cod_usuario: i32,
    pub codigo_cartao: Option<String>,
    pub data_hora: DateTime<Utc>,
    pub origem: String,
    pub total_itens: Decimal,
    pub total_pedido: Decimal,
    pub itens: Vec<NovoItemRestaurante>,
}

fn campos_obrigatorios() -> AppError {
    AppError::BadRequest(
        "Campos obrigatorios: cod_loja, cod_usuario, data_hora, origem, totais e itens.".into(),
    )
}

impl ItemRestaurantePayload {
    fn converter(&self, index: usize) -> Result<NovoItemRestaurante, AppError> {
        let invalido = |motivo: &str| AppError::ItemInvalido {
            index,
            message: format!("Item {index}: {motivo}"),
            details: serde_json::to_value(self).unwrap_or_default(),
        };

        let (Some(cod_produto), Some(descricao), Some(quantidade), Some(pr_venda), Some(pr_custo), Some(subtotal)) = (
            self.cod_produto,
            self.descricao.as_ref(),
            self.quantidade,
            self.pr_venda,
            self.pr_custo,
            self.subtotal,
        ) else {
            return Err(invalido(
                "campos obrigatorios: cod_produto, descricao, quantidade, pr_venda, pr_custo e subtotal.",
            ));
        };

        if quantidade <= Decimal::ZERO {
            return Err(invalido("quantidade deve ser maior que zero."));
        }
        if pr_venda.is_sign_negative() || pr_custo.is_sign_negative() || subtotal.is_sign_negative() {
            return Err(invalido("pr_venda, pr_custo e subtotal devem ser >= 0."));
        }

        Ok(NovoItemRestaurante {
            cod_produto,
            descricao: descricao.clone(),
            quantidade,
            pr_venda,
            pr_custo,
            subtotal,
        })
    }
}

impl CadastrarPedidoRestaurantePayload {
    pub fn converter(self) -> Result<NovoPedidoRestaurante, AppError> {
        self.validate()?;

        let itens = self
            .itens
            .iter()
            .enumerate()
            .map(|(index, item)| item.converter(index))
            .collect::<Result<Vec<_>, _>>()?;

        let totais = self.totais.ok_or_else(campos_obrigatorios)?;
        let (Some(total_itens), Some(total_pedido)) = (totais.total_itens, totais.total_pedido) else {
            return Err(AppError::BadRequest(
                "totais.total_itens e totais.total_pedido sao obrigatorios.".into(),
            ));
        };

        Ok(NovoPedidoRestaurante {
            id: self.id,
            cod_loja: self.cod_loja.ok_or_else(campos_obrigatorios)?,
            cod_usuario: self.cod_usuario.ok_or_else(campos_obrigatorios)?,
            codigo_cartao: self.codigo_cartao,
            data_hora: self.data_hora.ok_or_else(campos_obrigatorios)?,
            origem: self.origem.ok_or_else(campos_obrigatorios)?,
            total_itens,
            total_pedido,
            itens,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PedidoRestauranteRegistrado {
    pub message: String,
    pub id: i32,
    pub status: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LiberadosQuery {
    pub cod_loja: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StatusPedidoPayload {
    pub id: i32,
    #[validate(range(min = 0, max = 3, message = "status deve ser 0, 1, 2 ou 3."))]
    pub status: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> CadastrarPedidoRestaurantePayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn converte_pedido_completo() {
        let pedido = payload(
            r#"{
                "cod_loja": 1,
                "cod_usuario": 4,
                "codigo_cartao": "M12",
                "data_hora": "2024-06-01T20:15:00Z",
                "origem": "garcom",
                "totais": {"total_itens": 2, "total_pedido": 30},
                "itens": [{"cod_produto": 5, "descricao": "Pizza", "quantidade": 2, "pr_venda": 15, "pr_custo": 6, "subtotal": 30}]
            }"#,
        )
        .converter()
        .unwrap();

        assert_eq!(pedido.id, None);
        assert_eq!(pedido.itens.len(), 1);
        assert_eq!(pedido.origem, "garcom");
    }

    #[test]
    fn item_incompleto_informa_indice() {
        let err = payload(
            r#"{
                "cod_loja": 1,
                "cod_usuario": 4,
                "data_hora": "2024-06-01T20:15:00Z",
                "origem": "garcom",
                "totais": {"total_itens": 1, "total_pedido": 10},
                "itens": [
                    {"cod_produto": 5, "descricao": "Pizza", "quantidade": 1, "pr_venda": 10, "pr_custo": 4, "subtotal": 10},
                    {"cod_produto": 6, "descricao": "Suco"}
                ]
            }"#,
        )
        .converter()
        .unwrap_err();

        match err {
            AppError::ItemInvalido { index, details, .. } => {
                assert_eq!(index, 1);
                assert_eq!(details["descricao"], "Suco");
            }
            other => panic!("variante inesperada: {other:?}"),
        }
    }

    #[test]
    fn totais_sao_obrigatorios() {
        let sem_totais = payload(
            r#"{
                "cod_loja": 1,
                "cod_usuario": 4,
                "data_hora": "2024-06-01T20:15:00Z",
                "origem": "garcom",
                "itens": [{"cod_produto": 5, "descricao": "Pizza", "quantidade": 1, "pr_venda": 10, "pr_custo": 4, "subtotal": 10}]
            }"#,
        );
        let erros = sem_totais.validate().unwrap_err();
        assert!(erros.field_errors().contains_key("totais"));

        let com_totais = payload(
            r#"{
                "cod_loja": 1,
                "cod_usuario": 4,
                "data_hora": "2024-06-01T20:15:00Z",
                "origem": "garcom",
                "totais": {"total_itens": 1, "total_pedido": 10},
                "itens": [{"cod_produto": 5, "descricao": "Pizza", "quantidade": 1, "pr_venda": 10, "pr_custo": 4, "subtotal": 10}]
            }"#,
        );
        assert!(com_totais.validate().is_ok());
    }

    #[test]
    fn status_fora_da_faixa() {
        assert!(StatusPedidoPayload { id: 1, status: 4 }.validate().is_err());
        assert!(StatusPedidoPayload { id: 1, status: STATUS_CANCELADO }.validate().is_ok());
    }
}
