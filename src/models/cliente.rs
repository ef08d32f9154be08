// src/models/cliente.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::{
    campo::{self, tri_state, Campo},
    reconcile::{Chave, EntradaCadastro, Reconciliavel},
};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Cliente {
    pub id: i32,
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub cpf_cnpj: Option<String>,
    pub inscricao_estadual: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuscaClienteQuery {
    pub cod_loja: i32,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validar_uf(input: &ClienteInput) -> Result<(), ValidationError> {
    if let Some(Some(uf)) = &input.uf {
        if uf.chars().count() != 2 {
            let mut err = ValidationError::new("length");
            err.message = Some("uf deve ter 2 caracteres.".into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validar_uf"))]
pub struct ClienteInput {
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
    #[schema(value_type = Option<String>)]
    pub cpf_cnpj: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub inscricao_estadual: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub telefone: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub email: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub endereco: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub cidade: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub uf: Campo<String>,

    /// Ausente mantém o atual (novos clientes nascem ativos).
    pub ativo: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ClienteCadastro {
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub cpf_cnpj: Campo<String>,
    pub inscricao_estadual: Campo<String>,
    pub telefone: Campo<String>,
    pub email: Campo<String>,
    pub endereco: Campo<String>,
    pub cidade: Campo<String>,
    pub uf: Campo<String>,
    pub ativo: Option<bool>,
}

impl EntradaCadastro for ClienteInput {
    type Registro = ClienteCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = "Campos obrigatorios: cod_loja, codigo e nome.";
    const MENSAGEM_VAZIO: &'static str = "Nenhum cliente informado.";
    const MENSAGEM_SUCESSO: &'static str = "Clientes processados com sucesso.";

    fn em_registro(self) -> Option<ClienteCadastro> {
        Some(ClienteCadastro {
            cod_loja: self.cod_loja?,
            codigo: self.codigo?,
            nome: self.nome?,
            cpf_cnpj: self.cpf_cnpj,
            inscricao_estadual: self.inscricao_estadual,
            telefone: self.telefone,
            email: self.email,
            endereco: self.endereco,
            cidade: self.cidade,
            uf: self.uf.map(|uf| uf.map(|v| v.to_uppercase())),
            ativo: self.ativo,
        })
    }
}

impl Reconciliavel for ClienteCadastro {
    type Existente = Cliente;
    const ENTIDADE: &'static str = "Cliente";

    fn chave(&self) -> Chave {
        Chave::new(self.cod_loja, self.codigo)
    }

    fn chave_existente(existente: &Cliente) -> Chave {
        Chave::new(existente.cod_loja, existente.codigo)
    }

    fn difere(&self, e: &Cliente) -> bool {
        self.nome != e.nome
            || campo::alterado(&self.cpf_cnpj, &e.cpf_cnpj)
            || campo::alterado(&self.inscricao_estadual, &e.inscricao_estadual)
            || campo::alterado(&self.telefone, &e.telefone)
            || campo::alterado(&self.email, &e.email)
            || campo::alterado(&self.endereco, &e.endereco)
            || campo::alterado(&self.cidade, &e.cidade)
            || campo::alterado(&self.uf, &e.uf)
            || self.ativo.is_some_and(|ativo| ativo != e.ativo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cliente() -> Cliente {
        Cliente {
            id: 1,
            cod_loja: 1,
            codigo: 9,
            nome: "Mercado Bom Preço".into(),
            cpf_cnpj: Some("12345678000199".into()),
            inscricao_estadual: None,
            telefone: None,
            email: None,
            endereco: None,
            cidade: Some("Recife".into()),
            uf: Some("PE".into()),
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(json: &str) -> ClienteInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn uf_normalizada_para_maiusculas() {
        let registro = input(r#"{"cod_loja": 1, "codigo": 9, "nome": "Mercado Bom Preço", "uf": "pe"}"#)
            .em_registro()
            .unwrap();
        assert!(!registro.difere(&cliente()));
    }

    #[test]
    fn uf_com_tamanho_errado_e_rejeitada() {
        assert!(input(r#"{"cod_loja": 1, "codigo": 9, "nome": "X", "uf": "PER"}"#).validate().is_err());
    }

    #[test]
    fn desativar_e_mudanca() {
        let registro = input(r#"{"cod_loja": 1, "codigo": 9, "nome": "Mercado Bom Preço", "ativo": false}"#)
            .em_registro()
            .unwrap();
        assert!(registro.difere(&cliente()));
    }
}
