// src/models/usuario.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::{
    campo::{self, tri_state, Campo},
    reconcile::{Chave, EntradaCadastro, Reconciliavel},
};
use crate::models::loja::LojaResumo;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Usuario {
    pub id: i32,
    pub codigo: i32,
    pub cod_loja: i32,
    pub nome: String,
    pub email: Option<String>,
    pub telefone: Option<String>,
    // Digest calculado no cliente. Ausente = primeiro acesso.
    #[serde(skip_serializing)]
    pub senha_md5: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsuarioComLoja {
    #[serde(flatten)]
    pub usuario: Usuario,
    pub loja: Option<LojaResumo>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsuariosQuery {
    pub cod_loja: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UsuarioInput {
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
    pub email: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub telefone: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub senha_md5: Campo<String>,
}

#[derive(Debug, Clone)]
pub struct UsuarioCadastro {
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub email: Campo<String>,
    pub telefone: Campo<String>,
    pub senha_md5: Campo<String>,
}

impl EntradaCadastro for UsuarioInput {
    type Registro = UsuarioCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = "Campos obrigatorios: cod_loja, codigo e nome.";
    const MENSAGEM_VAZIO: &'static str = "Nenhum usuario informado.";
    const MENSAGEM_SUCESSO: &'static str = "Usuarios processados com sucesso.";

    fn em_registro(self) -> Option<UsuarioCadastro> {
        Some(UsuarioCadastro {
            cod_loja: self.cod_loja?,
            codigo: self.codigo?,
            nome: self.nome?,
            email: self.email,
            telefone: self.telefone,
            senha_md5: self.senha_md5,
        })
    }
}

impl Reconciliavel for UsuarioCadastro {
    type Existente = Usuario;
    const ENTIDADE: &'static str = "Usuario";

    fn chave(&self) -> Chave {
        Chave::new(self.cod_loja, self.codigo)
    }

    fn chave_existente(existente: &Usuario) -> Chave {
        Chave::new(existente.cod_loja, existente.codigo)
    }

    fn difere(&self, existente: &Usuario) -> bool {
        self.nome != existente.nome
            || campo::alterado(&self.email, &existente.email)
            || campo::alterado(&self.telefone, &existente.telefone)
            || campo::alterado(&self.senha_md5, &existente.senha_md5)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AtualizarUsuarioPayload {
    #[validate(length(min = 1, message = "nome nao pode ser vazio."))]
    pub nome: Option<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub email: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub telefone: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub senha_md5: Campo<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario() -> Usuario {
        Usuario {
            id: 7,
            codigo: 1,
            cod_loja: 10,
            nome: "Ana".into(),
            email: Some("ana@loja.com".into()),
            telefone: None,
            senha_md5: Some("e10adc3949ba59abbe56e057f20f883e".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn senha_ausente_no_lote_preserva_a_do_primeiro_acesso() {
        let cadastro = UsuarioCadastro {
            cod_loja: 10,
            codigo: 1,
            nome: "Ana".into(),
            email: None,
            telefone: None,
            senha_md5: None,
        };
        assert!(!cadastro.difere(&usuario()));
    }

    #[test]
    fn senha_nunca_e_serializada() {
        let json = serde_json::to_value(usuario()).unwrap();
        assert!(json.get("senha_md5").is_none());
    }

    #[test]
    fn converte_somente_com_obrigatorios() {
        let input: UsuarioInput = serde_json::from_str(r#"{"cod_loja": 10, "codigo": 1}"#).unwrap();
        assert!(input.validate().is_err());
        assert!(input.em_registro().is_none());
    }
}
