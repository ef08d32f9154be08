// src/models/estoque.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::reconcile::{Chave, EntradaCadastro, Reconciliavel};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Estoque {
    pub id: i32,
    pub cod_loja: i32,
    pub cod_produto: i32,
    pub quantidade: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EstoqueQuery {
    pub cod_loja: i32,
    pub cod_produto: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EstoqueAtualQuery {
    pub cod_loja: i32,
    pub cod_produto: i32,
}

/// Saldo de um produto; `quantidade` nula quando não há linha de estoque.
#[derive(Debug, Serialize, ToSchema)]
pub struct EstoqueAtual {
    pub cod_loja: i32,
    pub cod_produto: i32,
    pub quantidade: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EstoqueInput {
    #[validate(
        required(message = "Campos obrigatorios: cod_loja, cod_produto e quantidade."),
        range(min = 1, message = "cod_loja deve ser inteiro positivo.")
    )]
    pub cod_loja: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, cod_produto e quantidade."),
        range(min = 1, message = "cod_produto deve ser inteiro positivo.")
    )]
    pub cod_produto: Option<i32>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, cod_produto e quantidade."))]
    pub quantidade: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct EstoqueCadastro {
    pub cod_loja: i32,
    pub cod_produto: i32,
    pub quantidade: Decimal,
}

impl EntradaCadastro for EstoqueInput {
    type Registro = EstoqueCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = "Campos obrigatorios: cod_loja, cod_produto e quantidade.";
    const MENSAGEM_VAZIO: &'static str = "Nenhum estoque informado.";
    const MENSAGEM_SUCESSO: &'static str = "Estoque processado com sucesso.";

    fn em_registro(self) -> Option<EstoqueCadastro> {
        Some(EstoqueCadastro {
            cod_loja: self.cod_loja?,
            cod_produto: self.cod_produto?,
            quantidade: self.quantidade?,
        })
    }
}

impl Reconciliavel for EstoqueCadastro {
    type Existente = Estoque;
    const ENTIDADE: &'static str = "Estoque";
    const CAMPO_CODIGO: &'static str = "cod_produto";

    fn chave(&self) -> Chave {
        Chave::new(self.cod_loja, self.cod_produto)
    }

    fn chave_existente(existente: &Estoque) -> Chave {
        Chave::new(existente.cod_loja, existente.cod_produto)
    }

    fn difere(&self, existente: &Estoque) -> bool {
        self.quantidade != existente.quantidade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensagem_de_duplicado_usa_cod_produto() {
        assert_eq!(
            EstoqueCadastro::mensagem_duplicado(Chave::new(1, 55)),
            "Estoque duplicado no payload para cod_loja 1 e cod_produto 55."
        );
    }

    #[test]
    fn quantidade_negativa_e_aceita() {
        let input: EstoqueInput =
            serde_json::from_str(r#"{"cod_loja": 1, "cod_produto": 55, "quantidade": -3.5}"#).unwrap();
        assert!(input.validate().is_ok());
        assert!(input.em_registro().is_some());
    }
}
