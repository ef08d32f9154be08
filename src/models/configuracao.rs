// src/models/configuracao.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::{
    campo::{self, tri_state, Campo},
    reconcile::{Chave, EntradaCadastro, Reconciliavel},
};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Configuracao {
    pub id: i32,
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: Option<String>,
    pub valor: String,
}

/// O ERP manda `valor` como texto, número ou booleano; guardamos sempre texto.
pub fn valor_como_texto(valor: &Value) -> Option<String> {
    match valor {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        outro => Some(outro.to_string()),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfiguracaoInput {
    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo e valor."),
        range(min = 1, message = "cod_loja deve ser inteiro positivo.")
    )]
    pub cod_loja: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo e valor."),
        range(min = 1, message = "codigo deve ser inteiro positivo.")
    )]
    pub codigo: Option<i32>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, codigo e valor."))]
    #[schema(value_type = String)]
    pub valor: Option<Value>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub nome: Campo<String>,
}

#[derive(Debug, Clone)]
pub struct ConfiguracaoCadastro {
    pub cod_loja: i32,
    pub codigo: i32,
    pub valor: String,
    pub nome: Campo<String>,
}

impl EntradaCadastro for ConfiguracaoInput {
    type Registro = ConfiguracaoCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = "Campos obrigatorios: cod_loja, codigo e valor.";
    const MENSAGEM_VAZIO: &'static str = "Nenhuma configuracao informada.";
    const MENSAGEM_SUCESSO: &'static str = "Configuracoes processadas com sucesso.";

    fn em_registro(self) -> Option<ConfiguracaoCadastro> {
        Some(ConfiguracaoCadastro {
            cod_loja: self.cod_loja?,
            codigo: self.codigo?,
            valor: valor_como_texto(self.valor.as_ref()?)?,
            nome: self.nome,
        })
    }
}

impl Reconciliavel for ConfiguracaoCadastro {
    type Existente = Configuracao;
    const ENTIDADE: &'static str = "Configuracao";

    fn chave(&self) -> Chave {
        Chave::new(self.cod_loja, self.codigo)
    }

    fn chave_existente(existente: &Configuracao) -> Chave {
        Chave::new(existente.cod_loja, existente.codigo)
    }

    fn difere(&self, e: &Configuracao) -> bool {
        self.valor != e.valor || campo::alterado(&self.nome, &e.nome)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuscarConfiguracaoQuery {
    pub cod_loja: i32,
    pub codigo: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValorConfiguracao {
    pub valor: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AlterarConfiguracaoPayload {
    #[validate(required(message = "Campos obrigatorios: cod_loja, codigo e valor."))]
    pub cod_loja: Option<i32>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, codigo e valor."))]
    pub codigo: Option<i32>,

    #[validate(required(message = "Campos obrigatorios: cod_loja, codigo e valor."))]
    #[schema(value_type = String)]
    pub valor: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valor_sempre_vira_texto() {
        assert_eq!(valor_como_texto(&json!("S")), Some("S".to_string()));
        assert_eq!(valor_como_texto(&json!(15)), Some("15".to_string()));
        assert_eq!(valor_como_texto(&json!(true)), Some("true".to_string()));
        assert_eq!(valor_como_texto(&json!(null)), None);
    }

    #[test]
    fn valor_nulo_nao_converte() {
        let input: ConfiguracaoInput =
            serde_json::from_str(r#"{"cod_loja": 1, "codigo": 3, "valor": null}"#).unwrap();
        assert!(input.em_registro().is_none());
    }
}
