// src/db/condicao_pagamento_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{campo, error::AppError},
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::condicao_pagamento::{CondicaoPagamento, CondicaoPagamentoCadastro},
};

#[derive(Clone)]
pub struct CondicaoPagamentoRepository {
    pool: PgPool,
}

impl CondicaoPagamentoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn listar(&self, cod_loja: i32) -> Result<Vec<CondicaoPagamento>, AppError> {
        let condicoes = sqlx::query_as::<_, CondicaoPagamento>(
            "SELECT * FROM condicoes_pagamento WHERE cod_loja = $1 ORDER BY nome",
        )
        .bind(cod_loja)
        .fetch_all(&self.pool)
        .await?;
        Ok(condicoes)
    }

    pub async fn buscar_por_id(&self, id: i32) -> Result<Option<CondicaoPagamento>, AppError> {
        let condicao = sqlx::query_as::<_, CondicaoPagamento>("SELECT * FROM condicoes_pagamento WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(condicao)
    }
}

#[async_trait]
impl CadastroRepository for CondicaoPagamentoRepository {
    type Registro = CondicaoPagamentoCadastro;
    type Existente = CondicaoPagamento;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<CondicaoPagamento>, AppError> {
        let existentes =
            sqlx::query_as::<_, CondicaoPagamento>("SELECT * FROM condicoes_pagamento WHERE cod_loja = ANY($1)")
                .bind(lojas)
                .fetch_all(&mut *conn)
                .await?;
        Ok(existentes)
    }

    async fn inserir(
        &self,
        conn: &mut PgConnection,
        registros: &[CondicaoPagamentoCadastro],
    ) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO condicoes_pagamento (cod_loja, codigo, nome, prazo_dias, ativo) ");
            qb.push_values(lote, |mut b, c| {
                b.push_bind(c.cod_loja)
                    .push_bind(c.codigo)
                    .push_bind(c.nome.clone())
                    .push_bind(campo::inicial(&c.prazo_dias))
                    .push_bind(c.ativo.unwrap_or(true));
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(CondicaoPagamentoCadastro, CondicaoPagamento)],
    ) -> Result<(), AppError> {
        for (novo, atual) in alteracoes {
            sqlx::query("UPDATE condicoes_pagamento SET nome = $2, prazo_dias = $3, ativo = $4 WHERE id = $1")
                .bind(atual.id)
                .bind(&novo.nome)
                .bind(campo::resolver(&novo.prazo_dias, &atual.prazo_dias))
                .bind(novo.ativo.unwrap_or(atual.ativo))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[CondicaoPagamento]) -> Result<(), AppError> {
        let ids: Vec<i32> = existentes.iter().map(|c| c.id).collect();
        sqlx::query("DELETE FROM condicoes_pagamento WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
