// src/db/configuracao_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{campo, error::AppError},
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::configuracao::{Configuracao, ConfiguracaoCadastro},
};

#[derive(Clone)]
pub struct ConfiguracaoRepository {
    pool: PgPool,
}

impl ConfiguracaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn buscar(&self, cod_loja: i32, codigo: i32) -> Result<Option<Configuracao>, AppError> {
        let configuracao = sqlx::query_as::<_, Configuracao>(
            "SELECT * FROM configuracoes WHERE cod_loja = $1 AND codigo = $2",
        )
        .bind(cod_loja)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(configuracao)
    }

    pub async fn alterar_valor(
        &self,
        cod_loja: i32,
        codigo: i32,
        valor: &str,
    ) -> Result<Option<Configuracao>, AppError> {
        let configuracao = sqlx::query_as::<_, Configuracao>(
            "UPDATE configuracoes SET valor = $3 WHERE cod_loja = $1 AND codigo = $2 RETURNING *",
        )
        .bind(cod_loja)
        .bind(codigo)
        .bind(valor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(configuracao)
    }
}

#[async_trait]
impl CadastroRepository for ConfiguracaoRepository {
    type Registro = ConfiguracaoCadastro;
    type Existente = Configuracao;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<Configuracao>, AppError> {
        let existentes = sqlx::query_as::<_, Configuracao>("SELECT * FROM configuracoes WHERE cod_loja = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;
        Ok(existentes)
    }

    async fn inserir(&self, conn: &mut PgConnection, registros: &[ConfiguracaoCadastro]) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO configuracoes (cod_loja, codigo, nome, valor) ");
            qb.push_values(lote, |mut b, c| {
                b.push_bind(c.cod_loja)
                    .push_bind(c.codigo)
                    .push_bind(campo::inicial(&c.nome))
                    .push_bind(c.valor.clone());
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(ConfiguracaoCadastro, Configuracao)],
    ) -> Result<(), AppError> {
        for (novo, atual) in alteracoes {
            sqlx::query("UPDATE configuracoes SET nome = $2, valor = $3 WHERE id = $1")
                .bind(atual.id)
                .bind(campo::resolver(&novo.nome, &atual.nome))
                .bind(&novo.valor)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[Configuracao]) -> Result<(), AppError> {
        let ids: Vec<i32> = existentes.iter().map(|c| c.id).collect();
        sqlx::query("DELETE FROM configuracoes WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
