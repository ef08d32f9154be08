// src/common/reconcile.rs
//
// Planejamento dos endpoints `cadastrar`: compara o lote recebido do ERP com
// as linhas existentes das lojas envolvidas e decide o que inserir, atualizar
// e remover. Nada aqui toca o banco; a execução fica no CadastroService.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

/// Chave de negócio: (loja, código). Códigos só são únicos dentro da loja.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chave {
    pub cod_loja: i32,
    pub codigo: i32,
}

impl Chave {
    pub fn new(cod_loja: i32, codigo: i32) -> Self {
        Self { cod_loja, codigo }
    }
}

/// Registro validado que pode ser comparado com sua linha persistida.
pub trait Reconciliavel {
    type Existente;

    const ENTIDADE: &'static str;
    const CAMPO_CODIGO: &'static str = "codigo";

    fn chave(&self) -> Chave;
    fn chave_existente(existente: &Self::Existente) -> Chave;

    /// `true` quando aplicar este registro muda a linha existente.
    fn difere(&self, existente: &Self::Existente) -> bool;

    fn mensagem_duplicado(chave: Chave) -> String {
        format!(
            "{} duplicado no payload para cod_loja {} e {} {}.",
            Self::ENTIDADE,
            chave.cod_loja,
            Self::CAMPO_CODIGO,
            chave.codigo
        )
    }
}

/// DTO de entrada de um `cadastrar`: valida e converte para o registro tipado.
pub trait EntradaCadastro: Validate + Send {
    type Registro: Reconciliavel;

    const CAMPOS_OBRIGATORIOS: &'static str;
    const MENSAGEM_VAZIO: &'static str;
    const MENSAGEM_SUCESSO: &'static str;

    /// `None` quando falta campo obrigatório (já coberto por `validate`).
    fn em_registro(self) -> Option<Self::Registro>;
}

#[derive(Debug)]
pub struct Plano<T, E> {
    pub inserir: Vec<T>,
    pub atualizar: Vec<(T, E)>,
    pub remover: Vec<E>,
    pub inalterados: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResumoCadastro {
    pub message: String,
    pub inseridos: usize,
    pub atualizados: usize,
    pub removidos: usize,
}

/// Valida cada item na ordem recebida; o primeiro erro interrompe com o índice.
pub fn converter<I: EntradaCadastro>(itens: Vec<I>) -> Result<Vec<I::Registro>, AppError> {
    itens
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            item.validate()
                .map_err(|e| AppError::item_invalido(index, e))?;
            item.em_registro().ok_or_else(|| AppError::ItemInvalido {
                index,
                message: I::CAMPOS_OBRIGATORIOS.to_string(),
                details: serde_json::Value::Null,
            })
        })
        .collect()
}

/// Primeira chave repetida do lote, se houver.
pub fn duplicado<T: Reconciliavel>(itens: &[T]) -> Option<Chave> {
    let mut vistos = HashSet::with_capacity(itens.len());
    itens.iter().map(T::chave).find(|chave| !vistos.insert(*chave))
}

/// Lojas tocadas pelo lote, ordenadas e sem repetição.
pub fn escopos<T: Reconciliavel>(itens: &[T]) -> Vec<i32> {
    let mut lojas: Vec<i32> = itens.iter().map(|i| i.chave().cod_loja).collect();
    lojas.sort_unstable();
    lojas.dedup();
    lojas
}

/// Separa o lote em inserções, atualizações efetivas e remoções.
///
/// Com `autoritativo` (payload em array) as linhas existentes das lojas
/// presentes no lote cujo código não veio são removidas. Linhas de lojas que
/// não aparecem no lote nunca são tocadas.
pub fn planejar<T: Reconciliavel>(
    itens: Vec<T>,
    existentes: Vec<T::Existente>,
    autoritativo: bool,
) -> Plano<T, T::Existente> {
    let chaves: HashSet<Chave> = itens.iter().map(T::chave).collect();
    let lojas: HashSet<i32> = chaves.iter().map(|c| c.cod_loja).collect();

    let mut por_chave: HashMap<Chave, T::Existente> = HashMap::new();
    let mut remover = Vec::new();

    for existente in existentes {
        let chave = T::chave_existente(&existente);
        if chaves.contains(&chave) {
            por_chave.insert(chave, existente);
        } else if autoritativo && lojas.contains(&chave.cod_loja) {
            remover.push(existente);
        }
    }

    let mut inserir = Vec::new();
    let mut atualizar = Vec::new();
    let mut inalterados = 0;

    for item in itens {
        match por_chave.remove(&item.chave()) {
            None => inserir.push(item),
            Some(existente) if item.difere(&existente) => atualizar.push((item, existente)),
            Some(_) => inalterados += 1,
        }
    }

    Plano {
        inserir,
        atualizar,
        remover,
        inalterados,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        cod_loja: i32,
        codigo: i32,
        nome: String,
    }

    impl Reconciliavel for Item {
        type Existente = Item;
        const ENTIDADE: &'static str = "Item";

        fn chave(&self) -> Chave {
            Chave::new(self.cod_loja, self.codigo)
        }

        fn chave_existente(existente: &Item) -> Chave {
            existente.chave()
        }

        fn difere(&self, existente: &Item) -> bool {
            self.nome != existente.nome
        }
    }

    fn item(cod_loja: i32, codigo: i32, nome: &str) -> Item {
        Item {
            cod_loja,
            codigo,
            nome: nome.to_string(),
        }
    }

    #[test]
    fn array_remove_codigos_ausentes_da_mesma_loja() {
        let existentes = vec![item(1, 100, "A"), item(1, 101, "B"), item(2, 500, "Z")];
        let plano = planejar(vec![item(1, 100, "A")], existentes, true);

        assert!(plano.inserir.is_empty());
        assert!(plano.atualizar.is_empty());
        assert_eq!(plano.inalterados, 1);
        // loja 2 não estava no lote: intocada
        assert_eq!(plano.remover, vec![item(1, 101, "B")]);
    }

    #[test]
    fn objeto_unico_nunca_remove() {
        let existentes = vec![item(1, 100, "A"), item(1, 101, "B")];
        let plano = planejar(vec![item(1, 102, "C")], existentes, false);

        assert_eq!(plano.inserir, vec![item(1, 102, "C")]);
        assert!(plano.remover.is_empty());
    }

    #[test]
    fn atualizacao_sem_mudanca_e_ignorada() {
        let existentes = vec![item(1, 100, "A"), item(1, 101, "B")];
        let plano = planejar(vec![item(1, 100, "A"), item(1, 101, "B2")], existentes, true);

        assert_eq!(plano.inalterados, 1);
        assert_eq!(plano.atualizar.len(), 1);
        assert_eq!(plano.atualizar[0].0.nome, "B2");
        assert_eq!(plano.atualizar[0].1.nome, "B");
    }

    #[test]
    fn mesmo_codigo_em_lojas_diferentes_nao_conflita() {
        let existentes = vec![item(1, 100, "A")];
        let plano = planejar(vec![item(2, 100, "A")], existentes, true);

        assert_eq!(plano.inserir.len(), 1);
        assert!(plano.remover.is_empty());
    }

    #[test]
    fn detecta_duplicados_e_escopos() {
        let lote = vec![item(2, 1, "x"), item(1, 1, "y"), item(2, 1, "z")];
        assert_eq!(duplicado(&lote), Some(Chave::new(2, 1)));
        assert_eq!(escopos(&lote), vec![1, 2]);

        assert_eq!(duplicado(&[item(1, 1, "a"), item(2, 1, "b")]), None);
        assert_eq!(
            Item::mensagem_duplicado(Chave::new(2, 1)),
            "Item duplicado no payload para cod_loja 2 e codigo 1."
        );
    }
}
