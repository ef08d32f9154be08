// src/db/estoque_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::estoque::{Estoque, EstoqueCadastro},
};

#[derive(Clone)]
pub struct EstoqueRepository {
    pool: PgPool,
}

impl EstoqueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn listar(&self, cod_loja: i32, cod_produto: Option<i32>) -> Result<Vec<Estoque>, AppError> {
        let estoque = sqlx::query_as::<_, Estoque>(
            r#"
            SELECT * FROM estoque
            WHERE cod_loja = $1 AND ($2::int4 IS NULL OR cod_produto = $2)
            ORDER BY cod_produto
            "#,
        )
        .bind(cod_loja)
        .bind(cod_produto)
        .fetch_all(&self.pool)
        .await?;
        Ok(estoque)
    }

    pub async fn quantidade_atual(&self, cod_loja: i32, cod_produto: i32) -> Result<Option<Decimal>, AppError> {
        let quantidade = sqlx::query_scalar::<_, Decimal>(
            "SELECT quantidade FROM estoque WHERE cod_loja = $1 AND cod_produto = $2",
        )
        .bind(cod_loja)
        .bind(cod_produto)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quantidade)
    }
}

#[async_trait]
impl CadastroRepository for EstoqueRepository {
    type Registro = EstoqueCadastro;
    type Existente = Estoque;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<Estoque>, AppError> {
        let existentes = sqlx::query_as::<_, Estoque>("SELECT * FROM estoque WHERE cod_loja = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;
        Ok(existentes)
    }

    async fn inserir(&self, conn: &mut PgConnection, registros: &[EstoqueCadastro]) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO estoque (cod_loja, cod_produto, quantidade) ");
            qb.push_values(lote, |mut b, e| {
                b.push_bind(e.cod_loja)
                    .push_bind(e.cod_produto)
                    .push_bind(e.quantidade);
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(EstoqueCadastro, Estoque)],
    ) -> Result<(), AppError> {
        if alteracoes.is_empty() {
            return Ok(());
        }
        // Lote inteiro numa instrução só.
        let ids: Vec<i32> = alteracoes.iter().map(|(_, atual)| atual.id).collect();
        let quantidades: Vec<Decimal> = alteracoes.iter().map(|(novo, _)| novo.quantidade).collect();
        sqlx::query(
            r#"
            UPDATE estoque AS e SET quantidade = v.quantidade, updated_at = NOW()
            FROM UNNEST($1::int4[], $2::numeric[]) AS v(id, quantidade)
            WHERE e.id = v.id
            "#,
        )
        .bind(&ids)
        .bind(&quantidades)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[Estoque]) -> Result<(), AppError> {
        let ids: Vec<i32> = existentes.iter().map(|e| e.id).collect();
        sqlx::query("DELETE FROM estoque WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
