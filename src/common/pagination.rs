use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const LIMITE_PADRAO: i64 = 100;
pub const LIMITE_MAXIMO: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginacao {
    pub limit: i64,
    pub offset: i64,
}

impl Paginacao {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(LIMITE_PADRAO).clamp(1, LIMITE_MAXIMO),
            offset: offset.unwrap_or(0).max(0),
        }
    }

    /// Offset da próxima página, ou `None` quando não há mais linhas.
    pub fn proximo_offset(&self, total: i64) -> Option<i64> {
        self.offset.checked_add(self.limit).filter(|proximo| *proximo < total)
    }
}

/// Resposta de listagem paginada.
#[derive(Debug, Serialize, ToSchema)]
pub struct Pagina<T> {
    pub total: i64,
    pub data: Vec<T>,
    #[serde(rename = "nextOffset")]
    pub next_offset: Option<i64>,
}

impl<T> Pagina<T> {
    pub fn new(total: i64, data: Vec<T>, paginacao: Paginacao) -> Self {
        Self {
            total,
            data,
            next_offset: paginacao.proximo_offset(total),
        }
    }

    /// Resultado completo, sem mais páginas.
    pub fn completa(data: Vec<T>) -> Self {
        Self {
            total: data.len() as i64,
            data,
            next_offset: None,
        }
    }
}

/// Resposta de listagem simples (`{ total, data }`).
#[derive(Debug, Serialize, ToSchema)]
pub struct Lista<T> {
    pub total: usize,
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for Lista<T> {
    fn from(data: Vec<T>) -> Self {
        Self { total: data.len(), data }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginacaoQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limite_e_offset_sao_normalizados() {
        assert_eq!(Paginacao::new(None, None), Paginacao { limit: 100, offset: 0 });
        assert_eq!(Paginacao::new(Some(0), Some(-5)), Paginacao { limit: 1, offset: 0 });
        assert_eq!(Paginacao::new(Some(10_000), Some(20)), Paginacao { limit: 500, offset: 20 });
    }

    #[test]
    fn proximo_offset_so_quando_ha_mais_linhas() {
        let p = Paginacao::new(Some(10), Some(0));
        assert_eq!(p.proximo_offset(25), Some(10));
        assert_eq!(p.proximo_offset(10), None);

        let ultima = Paginacao::new(Some(10), Some(20));
        assert_eq!(ultima.proximo_offset(25), None);
    }

    #[test]
    fn offset_no_limite_do_i64_nao_transborda() {
        let p = Paginacao::new(Some(100), Some(i64::MAX));
        assert_eq!(p.offset, i64::MAX);
        assert_eq!(p.proximo_offset(10), None);
        assert_eq!(p.proximo_offset(i64::MAX), None);

        let pagina = Pagina::new(10, Vec::<i32>::new(), p);
        assert_eq!(pagina.next_offset, None);
    }

    #[test]
    fn pagina_completa_nao_tem_proximo() {
        let pagina = Pagina::completa(vec![1, 2, 3]);
        assert_eq!(pagina.total, 3);
        assert_eq!(pagina.next_offset, None);
    }
}
