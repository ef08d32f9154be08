// src/db/contagem_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::cadastro::LINHAS_POR_INSERT,
    models::contagem::{Contagem, NovaContagem},
};

#[derive(Clone)]
pub struct ContagemRepository {
    pool: PgPool,
}

impl ContagemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere as leituras em lotes e devolve os ids na ordem de entrada.
    pub async fn inserir(
        &self,
        cod_loja: i32,
        cod_usuario: i32,
        itens: &[NovaContagem],
    ) -> Result<Vec<i32>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(itens.len());

        for lote in itens.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO contagens (cod_loja, cod_usuario, cod_produto, qtde, created_at, updated_at) ",
            );
            qb.push_values(lote, |mut b, item| {
                b.push_bind(cod_loja)
                    .push_bind(cod_usuario)
                    .push_bind(item.cod_produto)
                    .push_bind(item.qtde)
                    .push_bind(item.created_at)
                    .push_bind(item.created_at);
            });
            qb.push(" RETURNING id");

            let inseridos: Vec<i32> = qb.build_query_scalar::<i32>().fetch_all(&mut *tx).await?;
            ids.extend(inseridos);
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Marca todas as pendentes da loja com um lote novo e as devolve.
    /// Leitura e marcação acontecem na mesma instrução.
    pub async fn reservar_pendentes(&self, cod_loja: i32, lote: Uuid) -> Result<Vec<Contagem>, AppError> {
        let mut contagens = sqlx::query_as::<_, Contagem>(
            r#"
            UPDATE contagens
            SET lote = $2, sincronizado = TRUE, updated_at = NOW()
            WHERE cod_loja = $1 AND sincronizado = FALSE
            RETURNING *
            "#,
        )
        .bind(cod_loja)
        .bind(lote)
        .fetch_all(&self.pool)
        .await?;

        contagens.sort_by_key(|c| (c.created_at, c.id));
        Ok(contagens)
    }

    pub async fn marcar_sincronizado(&self, ids: &[i32]) -> Result<u64, AppError> {
        let resultado = sqlx::query(
            "UPDATE contagens SET sincronizado = TRUE, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(resultado.rows_affected())
    }

    pub async fn listar(&self, cod_loja: i32) -> Result<Vec<Contagem>, AppError> {
        let contagens = sqlx::query_as::<_, Contagem>(
            "SELECT * FROM contagens WHERE cod_loja = $1 ORDER BY created_at, id",
        )
        .bind(cod_loja)
        .fetch_all(&self.pool)
        .await?;
        Ok(contagens)
    }
}
