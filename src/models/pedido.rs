// src/models/pedido.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Pedido {
    pub id: i32,
    pub cod_loja: i32,
    pub cod_usuario: Option<i32>,
    pub cod_cliente: Option<i32>,
    pub tipo: Option<String>,
    pub cod_cond_pagto: Option<i32>,
    pub valor_frete: Option<Decimal>,
    pub nome_transportadora: Option<String>,
    pub tipo_frete: Option<String>,
    pub total_itens: i32,
    pub total_pedido: Decimal,
    pub observacao: Option<String>,
    pub origem: Option<String>,
    pub status: i32,
    pub data_hora: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemPedidoPayload {
    pub cod_produto: Option<i32>,
    pub descricao: Option<String>,
    pub quantidade: Option<Decimal>,
    pub pr_venda: Option<Decimal>,
    pub pr_custo: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub compl_item: Option<String>,
    pub perc_desconto: Option<Decimal>,
    pub vl_desconto: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EnviarPedidoPayload {
    #[validate(
        required(message = "cod_loja e obrigatorio."),
        range(min = 1, message = "cod_loja deve ser inteiro positivo.")
    )]
    pub cod_loja: Option<i32>,
    pub cod_usuario: Option<i32>,
    pub cod_cliente: Option<i32>,
    pub tipo: Option<String>,
    pub cod_cond_pagto: Option<i32>,
    pub valor_frete: Option<Decimal>,
    pub nome_transportadora: Option<String>,
    pub tipo_frete: Option<String>,
    pub total_itens: Option<i32>,
    pub total_pedido: Option<Decimal>,
    pub observacao: Option<String>,
    pub origem: Option<String>,
    pub status: Option<i32>,
    pub data_hora: Option<DateTime<Utc>>,

    #[validate(length(min = 1, message = "Pedido sem itens."))]
    #[serde(default)]
    pub itens: Vec<ItemPedidoPayload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemCalculado {
    pub cod_produto: i32,
    pub descricao: Option<String>,
    pub quantidade: Decimal,
    pub pr_venda: Option<Decimal>,
    pub pr_custo: Option<Decimal>,
    pub subtotal: Decimal,
    pub compl_item: Option<String>,
    pub perc_desconto: Option<Decimal>,
    pub vl_desconto: Option<Decimal>,
}

/// Cabeçalho e itens com totais já resolvidos.
#[derive(Debug, Clone)]
pub struct PedidoCalculado {
    pub cod_loja: i32,
    pub total_itens: i32,
    pub total_pedido: Decimal,
    pub status: i32,
    pub data_hora: DateTime<Utc>,
    pub itens: Vec<ItemCalculado>,
}

fn item_invalido(index: usize, item: &ItemPedidoPayload, motivo: &str) -> AppError {
    AppError::ItemInvalido {
        index,
        message: format!("Item {index}: {motivo}"),
        details: serde_json::to_value(item).unwrap_or_default(),
    }
}

impl ItemPedidoPayload {
    fn calcular(&self, index: usize) -> Result<ItemCalculado, AppError> {
        let cod_produto = self
            .cod_produto
            .filter(|c| *c > 0)
            .ok_or_else(|| item_invalido(index, self, "cod_produto obrigatorio."))?;

        let quantidade = self
            .quantidade
            .filter(|q| *q > Decimal::ZERO)
            .ok_or_else(|| item_invalido(index, self, "quantidade deve ser maior que zero."))?;

        for (campo, valor) in [
            ("pr_venda", self.pr_venda),
            ("pr_custo", self.pr_custo),
            ("subtotal", self.subtotal),
        ] {
            if valor.is_some_and(|v| v.is_sign_negative()) {
                return Err(item_invalido(index, self, &format!("{campo} deve ser numero >= 0.")));
            }
        }

        let subtotal = match (self.subtotal, self.pr_venda) {
            (Some(subtotal), _) => subtotal,
            (None, Some(pr_venda)) => quantidade * pr_venda,
            (None, None) => return Err(item_invalido(index, self, "informe subtotal ou pr_venda.")),
        };

        Ok(ItemCalculado {
            cod_produto,
            descricao: self.descricao.clone(),
            quantidade,
            pr_venda: self.pr_venda,
            pr_custo: self.pr_custo,
            subtotal,
            compl_item: self.compl_item.clone(),
            perc_desconto: self.perc_desconto,
            vl_desconto: self.vl_desconto,
        })
    }
}

impl EnviarPedidoPayload {
    /// Valida os itens e preenche subtotais e totais ausentes.
    pub fn calcular(&self, agora: DateTime<Utc>) -> Result<PedidoCalculado, AppError> {
        self.validate()?;
        let cod_loja = self
            .cod_loja
            .ok_or_else(|| AppError::BadRequest("cod_loja e obrigatorio.".into()))?;

        let itens = self
            .itens
            .iter()
            .enumerate()
            .map(|(index, item)| item.calcular(index))
            .collect::<Result<Vec<_>, _>>()?;

        let soma: Decimal = itens.iter().map(|i| i.subtotal).sum();

        Ok(PedidoCalculado {
            cod_loja,
            total_itens: self.total_itens.unwrap_or(itens.len() as i32),
            total_pedido: self.total_pedido.unwrap_or(soma),
            status: self.status.unwrap_or(0),
            data_hora: self.data_hora.unwrap_or(agora),
            itens,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PedidoRegistrado {
    pub mensagem: String,
    pub id_local: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> EnviarPedidoPayload {
        serde_json::from_str(json).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn subtotal_e_totais_calculados() {
        let pedido = payload(
            r#"{
                "cod_loja": 1,
                "itens": [
                    {"cod_produto": 10, "quantidade": 2, "pr_venda": 3.5},
                    {"cod_produto": 11, "quantidade": 1, "pr_venda": 9, "subtotal": 8}
                ]
            }"#,
        )
        .calcular(Utc::now())
        .unwrap();

        assert_eq!(pedido.itens[0].subtotal, dec("7"));
        assert_eq!(pedido.itens[1].subtotal, dec("8"));
        assert_eq!(pedido.total_pedido, dec("15"));
        assert_eq!(pedido.total_itens, 2);
        assert_eq!(pedido.status, 0);
    }

    #[test]
    fn totais_informados_prevalecem() {
        let pedido = payload(
            r#"{
                "cod_loja": 1,
                "total_itens": 5,
                "total_pedido": 100,
                "status": 2,
                "itens": [{"cod_produto": 10, "quantidade": 1, "pr_venda": 1}]
            }"#,
        )
        .calcular(Utc::now())
        .unwrap();

        assert_eq!(pedido.total_itens, 5);
        assert_eq!(pedido.total_pedido, dec("100"));
        assert_eq!(pedido.status, 2);
    }

    #[test]
    fn erro_informa_indice_do_item() {
        let err = payload(
            r#"{
                "cod_loja": 1,
                "itens": [
                    {"cod_produto": 10, "quantidade": 1, "pr_venda": 1},
                    {"cod_produto": 11, "quantidade": 0, "pr_venda": 1}
                ]
            }"#,
        )
        .calcular(Utc::now())
        .unwrap_err();

        match err {
            AppError::ItemInvalido { index, message, .. } => {
                assert_eq!(index, 1);
                assert!(message.contains("quantidade"));
            }
            other => panic!("variante inesperada: {other:?}"),
        }
    }

    #[test]
    fn item_sem_preco_nem_subtotal() {
        let err = payload(r#"{"cod_loja": 1, "itens": [{"cod_produto": 10, "quantidade": 1}]}"#)
            .calcular(Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::ItemInvalido { index: 0, .. }));
    }

    #[test]
    fn pedido_sem_itens() {
        let err = payload(r#"{"cod_loja": 1, "itens": []}"#).calcular(Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
