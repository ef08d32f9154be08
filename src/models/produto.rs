// src/models/produto.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::{
    campo::{self, tri_state, Campo},
    reconcile::{Chave, EntradaCadastro, Reconciliavel},
};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Produto {
    pub id: i32,
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub unidade_medida: String,
    pub codigo_barras: Option<String>,
    pub pr_venda: Option<Decimal>,
    pub pr_custo: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Código de barras secundário, ligado ao produto por (cod_loja, cod_produto).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Ean {
    pub id: i32,
    pub cod_loja: i32,
    pub cod_produto: i32,
    pub codigo_barras: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuscaProdutoQuery {
    pub cod_loja: i32,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LojaQuery {
    pub cod_loja: i32,
}

/// Consulta que parece leitura de scanner: só dígitos, de 8 a 14 (EAN-8 a GTIN-14).
pub fn parece_codigo_barras(q: &str) -> bool {
    (8..=14).contains(&q.len()) && q.bytes().all(|b| b.is_ascii_digit())
}

/// Remove espaços, vazios e repetidos, preservando a ordem.
pub fn normalizar_eans<I, S>(eans: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resultado: Vec<String> = Vec::new();
    for ean in eans {
        let ean = ean.as_ref().trim();
        if !ean.is_empty() && !resultado.iter().any(|e| e == ean) {
            resultado.push(ean.to_string());
        }
    }
    resultado
}

fn validar_precos(input: &ProdutoInput) -> Result<(), ValidationError> {
    validar_preco("pr_venda", &input.pr_venda)?;
    validar_preco("pr_custo", &input.pr_custo)
}

pub(crate) fn validar_preco(nome: &'static str, valor: &Campo<Decimal>) -> Result<(), ValidationError> {
    if let Some(Some(v)) = valor {
        if v.is_sign_negative() {
            let mut err = ValidationError::new("range");
            err.message = Some(format!("{nome} deve ser numero >= 0.").into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validar_precos"))]
pub struct ProdutoInput {
    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo, nome e unidade_medida."),
        range(min = 1, message = "cod_loja deve ser inteiro positivo.")
    )]
    pub cod_loja: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo, nome e unidade_medida."),
        range(min = 1, message = "codigo deve ser inteiro positivo.")
    )]
    pub codigo: Option<i32>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo, nome e unidade_medida."),
        length(min = 1, message = "nome nao pode ser vazio.")
    )]
    pub nome: Option<String>,

    #[validate(
        required(message = "Campos obrigatorios: cod_loja, codigo, nome e unidade_medida."),
        length(min = 1, message = "unidade_medida nao pode ser vazia.")
    )]
    pub unidade_medida: Option<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub codigo_barras: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<f64>)]
    pub pr_venda: Campo<Decimal>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<f64>)]
    pub pr_custo: Campo<Decimal>,

    /// Conjunto completo de EANs secundários; ausente equivale a vazio.
    #[serde(default)]
    pub eans: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProdutoCadastro {
    pub cod_loja: i32,
    pub codigo: i32,
    pub nome: String,
    pub unidade_medida: String,
    pub codigo_barras: Campo<String>,
    pub pr_venda: Campo<Decimal>,
    pub pr_custo: Campo<Decimal>,
    pub eans: Vec<String>,
}

/// Produto persistido junto com seus EANs atuais.
#[derive(Debug, Clone)]
pub struct ProdutoExistente {
    pub produto: Produto,
    pub eans: Vec<String>,
}

impl EntradaCadastro for ProdutoInput {
    type Registro = ProdutoCadastro;

    const CAMPOS_OBRIGATORIOS: &'static str = "Campos obrigatorios: cod_loja, codigo, nome e unidade_medida.";
    const MENSAGEM_VAZIO: &'static str = "Nenhum produto informado.";
    const MENSAGEM_SUCESSO: &'static str = "Produtos processados com sucesso.";

    fn em_registro(self) -> Option<ProdutoCadastro> {
        Some(ProdutoCadastro {
            cod_loja: self.cod_loja?,
            codigo: self.codigo?,
            nome: self.nome?,
            unidade_medida: self.unidade_medida?,
            codigo_barras: self.codigo_barras,
            pr_venda: self.pr_venda,
            pr_custo: self.pr_custo,
            eans: normalizar_eans(&self.eans),
        })
    }
}

impl Reconciliavel for ProdutoCadastro {
    type Existente = ProdutoExistente;
    const ENTIDADE: &'static str = "Produto";

    fn chave(&self) -> Chave {
        Chave::new(self.cod_loja, self.codigo)
    }

    fn chave_existente(existente: &ProdutoExistente) -> Chave {
        Chave::new(existente.produto.cod_loja, existente.produto.codigo)
    }

    fn difere(&self, existente: &ProdutoExistente) -> bool {
        let p = &existente.produto;
        self.nome != p.nome
            || self.unidade_medida != p.unidade_medida
            || campo::alterado(&self.codigo_barras, &p.codigo_barras)
            || campo::alterado(&self.pr_venda, &p.pr_venda)
            || campo::alterado(&self.pr_custo, &p.pr_custo)
            || !mesmo_conjunto(&self.eans, &existente.eans)
    }
}

fn mesmo_conjunto(a: &[String], b: &[String]) -> bool {
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort();
    b.sort();
    a.dedup();
    b.dedup();
    a == b
}

fn validar_precos_atualizacao(input: &AtualizarProdutoPayload) -> Result<(), ValidationError> {
    validar_preco("pr_venda", &input.pr_venda)?;
    validar_preco("pr_custo", &input.pr_custo)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validar_precos_atualizacao"))]
pub struct AtualizarProdutoPayload {
    #[validate(length(min = 1, message = "nome nao pode ser vazio."))]
    pub nome: Option<String>,

    #[validate(length(min = 1, message = "unidade_medida nao pode ser vazia."))]
    pub unidade_medida: Option<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<String>)]
    pub codigo_barras: Campo<String>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<f64>)]
    pub pr_venda: Campo<Decimal>,

    #[serde(default, deserialize_with = "tri_state")]
    #[schema(value_type = Option<f64>)]
    pub pr_custo: Campo<Decimal>,

    /// Quando presente, substitui o conjunto de EANs.
    pub eans: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn existente() -> ProdutoExistente {
        ProdutoExistente {
            produto: Produto {
                id: 1,
                cod_loja: 1,
                codigo: 100,
                nome: "Arroz 5kg".into(),
                unidade_medida: "UN".into(),
                codigo_barras: Some("7891234567895".into()),
                pr_venda: Some(dec("25.9000")),
                pr_custo: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            eans: vec!["111".into(), "222".into()],
        }
    }

    fn cadastro() -> ProdutoCadastro {
        ProdutoCadastro {
            cod_loja: 1,
            codigo: 100,
            nome: "Arroz 5kg".into(),
            unidade_medida: "UN".into(),
            codigo_barras: None,
            pr_venda: Some(Some(dec("25.9"))),
            pr_custo: None,
            eans: vec!["222".into(), "111".into()],
        }
    }

    #[test]
    fn detecta_codigo_de_barras() {
        assert!(parece_codigo_barras("78912345"));
        assert!(parece_codigo_barras("7891234567895"));
        assert!(!parece_codigo_barras("1234567"));
        assert!(!parece_codigo_barras("123456789012345"));
        assert!(!parece_codigo_barras("7891234a67895"));
        assert!(!parece_codigo_barras("arroz"));
    }

    #[test]
    fn eans_normalizados() {
        let eans = normalizar_eans([" 111 ", "", "222", "111", "   "]);
        assert_eq!(eans, vec!["111".to_string(), "222".to_string()]);
    }

    #[test]
    fn mesma_escala_decimal_e_ordem_de_eans_nao_sao_mudanca() {
        assert!(!cadastro().difere(&existente()));
    }

    #[test]
    fn troca_de_eans_e_mudanca() {
        let mut c = cadastro();
        c.eans = vec!["111".into()];
        assert!(c.difere(&existente()));
    }

    #[test]
    fn limpar_preco_e_mudanca() {
        let mut c = cadastro();
        c.pr_venda = Some(None);
        assert!(c.difere(&existente()));
    }

    #[test]
    fn preco_negativo_e_rejeitado() {
        let input: ProdutoInput = serde_json::from_str(
            r#"{"cod_loja": 1, "codigo": 100, "nome": "X", "unidade_medida": "UN", "pr_venda": -1}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn eans_ausentes_viram_conjunto_vazio() {
        let input: ProdutoInput = serde_json::from_str(
            r#"{"cod_loja": 1, "codigo": 100, "nome": "X", "unidade_medida": "UN"}"#,
        )
        .unwrap();
        let registro = input.em_registro().unwrap();
        assert!(registro.eans.is_empty());
        assert_eq!(registro.codigo_barras, None);
    }
}
