// src/models/condicao_pagamento.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::{
    campo::{self, tri_state, Campo},
    reconcile::{Chave, EntradaCadastro, Reconciliavel},
};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CondicaoPagamento {
    pub id: i32,
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub prazo_dias: Option<i32>,
    pub ativo: bool,
}

fn validar_prazo(input: &CondicaoPagamentoInput) -> Result<(), ValidationError> {
    if let Some(Some(prazo)) = input.prazo_dias {
        if prazo < 0 {
            let mut err = ValidationError::new("range");
            err.message = Some("prazo_dias deve ser inteiro >= 0.".into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validar_prazo"))]
pub struct CondicaoPagamentoInput {
    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo e nome."),
        range(min = 1, message = "cod_loja deve ser inteiro positivo.")
    )]
    pub cod_loja: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo e nome."),
        range(min = 1, message = "codigo deve ser inteiro positivo.")
    )]
    pub codigo: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo e nome."),
        length(min = 1, message = "nome nao pode ser vazio.")
    )]
    pub nome: Option<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<i32>)]
    pub prazo_dias: Campo<i32>,

    pub ativo: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CondicaoPagamentoCadastro {
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub prazo_dias: Campo<i32>,
    pub ativo: Option<bool>,
}

impl EntradaCadastro for CondicaoPagamentoInput {
    type Registro = CondicaoPagamentoCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = "Campos obrigatorios: cod_loja, codigo e nome.";
    const MENSAGEM_VAZIO: &'static str = "Nenhuma condicao de pagamento informada.";
    const MENSAGEM_SUCESSO: &'static str = "Condicoes de pagamento processadas com sucesso.";

    fn em_registro(self) -> Option<CondicaoPagamentoCadastro> {
        Some(CondicaoPagamentoCadastro {
            cod_loja: self.cod_loja?,
            codigo: self.codigo?,
            nome: self.nome?,
            prazo_dias: self.prazo_dias,
            ativo: self.ativo,
        })
    }
}

impl Reconciliavel for CondicaoPagamentoCadastro {
    type Existente = CondicaoPagamento;
    const ENTIDADE: &'static str = "Condicao de pagamento";

    fn chave(&self) -> Chave {
        Chave::new(self.cod_loja, self.codigo)
    }

    fn chave_existente(existente: &CondicaoPagamento) -> Chave {
        Chave::new(existente.cod_loja, existente.codigo)
    }

    fn difere(&self, e: &CondicaoPagamento) -> bool {
        self.nome != e.nome
            || campo::alterado(&self.prazo_dias, &e.prazo_dias)
            || self.ativo.is_some_and(|ativo| ativo != e.ativo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prazo_negativo_e_rejeitado() {
        let input: CondicaoPagamentoInput =
            serde_json::from_str(r#"{"cod_loja": 1, "codigo": 2, "nome": "30 dias", "prazo_dias": -1}"#).unwrap();
        let erros = input.validate().unwrap_err();
        match crate::common::error::AppError::item_invalido(0, erros) {
            crate::common::error::AppError::ItemInvalido { message, .. } => {
                assert_eq!(message, "prazo_dias deve ser inteiro >= 0.")
            }
            other => panic!("variante inesperada: {other:?}"),
        }
    }

    #[test]
    fn prazo_nulo_limpa() {
        let atual = CondicaoPagamento {
            id: 1,
            cod_loja: 1,
            codigo: 2,
            nome: "30 dias".into(),
            prazo_dias: Some(30),
            ativo: true,
        };
        let input: CondicaoPagamentoInput =
            serde_json::from_str(r#"{"cod_loja": 1, "codigo": 2, "nome": "30 dias", "prazo_dias": null}"#).unwrap();
        assert!(input.em_registro().unwrap().difere(&atual));
    }
}
