// src/db/validade_repo.rs

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    db::cadastro::LINHAS_POR_INSERT,
    models::validade::{NovaValidade, ProdutoValidade},
};

#[derive(Clone)]
pub struct ValidadeRepository {
    pool: PgPool,
}

impl ValidadeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn inserir(&self, validades: &[NovaValidade]) -> Result<Vec<ProdutoValidade>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut inseridas = Vec::with_capacity(validades.len());

        for lote in validades.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO produto_validade (cod_loja, cod_produto, vencimento, ativo) ");
            qb.push_values(lote, |mut b, v| {
                b.push_bind(v.cod_loja)
                    .push_bind(v.cod_produto)
                    .push_bind(v.vencimento)
                    .push_bind(v.ativo);
            });
            qb.push(" RETURNING *");

            let linhas: Vec<ProdutoValidade> = qb.build_query_as::<ProdutoValidade>().fetch_all(&mut *tx).await?;
            inseridas.extend(linhas);
        }

        tx.commit().await?;
        Ok(inseridas)
    }

    /// Lotes ativos, do vencimento mais próximo ao mais distante.
    /// `limite` ausente devolve todos.
    pub async fn proximos(
        &self,
        cod_loja: i32,
        cod_produto: Option<i32>,
        limite: Option<NaiveDate>,
    ) -> Result<Vec<ProdutoValidade>, AppError> {
        let validades = sqlx::query_as::<_, ProdutoValidade>(
            r#"
            SELECT * FROM produto_validade
            WHERE cod_loja = $1
              AND ativo = 1
              AND ($2::int4 IS NULL OR cod_produto = $2)
              AND ($3::date IS NULL OR vencimento <= $3)
            ORDER BY vencimento ASC, id ASC
            "#,
        )
        .bind(cod_loja)
        .bind(cod_produto)
        .bind(limite)
        .fetch_all(&self.pool)
        .await?;
        Ok(validades)
    }

    pub async fn inativar(&self, id: i32) -> Result<Option<ProdutoValidade>, AppError> {
        let validade = sqlx::query_as::<_, ProdutoValidade>(
            "UPDATE produto_validade SET ativo = 0 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(validade)
    }
}
