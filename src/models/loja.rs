// src/models/loja.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{
    campo::{self, tri_state, Campo},
    reconcile::{Chave, EntradaCadastro, Reconciliavel},
};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Loja {
    pub id: i32,
    pub codigo: i32,
    pub nome: String,
    pub cidade: String,
    pub evolution_url: Option<String>,
    pub evolution_instancia: Option<String>,
    // Credencial do webhook; nunca sai na resposta.
    #[serde(skip_serializing)]
    pub evolution_apikey: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resumo devolvido no login e na listagem de usuários.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LojaResumo {
    pub codigo: i32,
    pub nome: String,
    pub cidade: String,
}

impl From<&Loja> for LojaResumo {
    fn from(loja: &Loja) -> Self {
        Self {
            codigo: loja.codigo,
            nome: loja.nome.clone(),
            cidade: loja.cidade.clone(),
        }
    }
}

const OBRIGATORIOS_LOJA: &str = "Campos obrigatorios: codigo, nome e cidade.";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LojaInput {
    #[validate(
        required(message = "Campos obrigatorios: codigo, nome e cidade."),
        range(min = 1, message = "codigo deve ser inteiro positivo.")
    )]
    pub codigo: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: codigo, nome e cidade."),
        length(min = 1, message = "nome nao pode ser vazio.")
    )]
    pub nome: Option<String>,

    #[validate(
        required(message = "Campos obrigatorios: codigo, nome e cidade."),
        length(min = 1, message = "cidade nao pode ser vazia.")
    )]
    pub cidade: Option<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub evolution_url: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub evolution_instancia: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub evolution_apikey: Campo<String>,
}

#[derive(Debug, Clone)]
pub struct LojaCadastro {
    pub codigo: i32,
    pub nome: String,
    pub cidade: String,
    pub evolution_url: Campo<String>,
    pub evolution_instancia: Campo<String>,
    pub evolution_apikey: Campo<String>,
}

impl EntradaCadastro for LojaInput {
    type Registro = LojaCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = OBRIGATORIOS_LOJA;
    const MENSAGEM_VAZIO: &'static str = "Nenhuma loja informada.";
    const MENSAGEM_SUCESSO: &'static str = "Lojas processadas com sucesso.";

    fn em_registro(self) -> Option<LojaCadastro> {
        Some(LojaCadastro {
            codigo: self.codigo?,
            nome: self.nome?,
            cidade: self.cidade?,
            evolution_url: self.evolution_url,
            evolution_instancia: self.evolution_instancia,
            evolution_apikey: self.evolution_apikey,
        })
    }
}

// A loja é o próprio escopo: um array nunca remove lojas não citadas.
impl Reconciliavel for LojaCadastro {
    type Existente = Loja;
    const ENTIDADE: &'static str = "Loja";

    fn chave(&self) -> Chave {
        Chave::new(self.codigo, self.codigo)
    }

    fn chave_existente(existente: &Loja) -> Chave {
        Chave::new(existente.codigo, existente.codigo)
    }

    fn difere(&self, existente: &Loja) -> bool {
        self.nome != existente.nome
            || self.cidade != existente.cidade
            || campo::alterado(&self.evolution_url, &existente.evolution_url)
            || campo::alterado(&self.evolution_instancia, &existente.evolution_instancia)
            || campo::alterado(&self.evolution_apikey, &existente.evolution_apikey)
    }

    fn mensagem_duplicado(chave: Chave) -> String {
        format!("Loja duplicada no payload para codigo {}.", chave.codigo)
    }
}

/// `PUT /lojas/{id}`: campos ausentes mantêm o valor atual.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AtualizarLojaPayload {
    #[validate(length(min = 1, message = "nome nao pode ser vazio."))]
    pub nome: Option<String>,

    #[validate(length(min = 1, message = "cidade nao pode ser vazia."))]
    pub cidade: Option<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub evolution_url: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub evolution_instancia: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub evolution_apikey: Campo<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loja() -> Loja {
        Loja {
            id: 1,
            codigo: 10,
            nome: "Centro".into(),
            cidade: "Campinas".into(),
            evolution_url: Some("https://evo.local".into()),
            evolution_instancia: Some("loja10".into()),
            evolution_apikey: Some("chave".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cadastro() -> LojaCadastro {
        LojaCadastro {
            codigo: 10,
            nome: "Centro".into(),
            cidade: "Campinas".into(),
            evolution_url: None,
            evolution_instancia: None,
            evolution_apikey: None,
        }
    }

    #[test]
    fn campos_ausentes_nao_geram_atualizacao() {
        assert!(!cadastro().difere(&loja()));
    }

    #[test]
    fn nulo_explicito_limpa_credencial() {
        let mut c = cadastro();
        c.evolution_apikey = Some(None);
        assert!(c.difere(&loja()));
    }

    #[test]
    fn loja_e_seu_proprio_escopo() {
        assert_eq!(cadastro().chave(), Chave::new(10, 10));
        assert_eq!(
            LojaCadastro::mensagem_duplicado(Chave::new(10, 10)),
            "Loja duplicada no payload para codigo 10."
        );
    }

    #[test]
    fn apikey_nao_e_serializada() {
        let json = serde_json::to_value(loja()).unwrap();
        assert!(json.get("evolution_apikey").is_none());
        assert_eq!(json["codigo"], 10);
    }
}
