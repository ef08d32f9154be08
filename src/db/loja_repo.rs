// src/db/loja_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{campo, error::AppError},
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::loja::{AtualizarLojaPayload, Loja, LojaCadastro},
};

#[derive(Clone)]
pub struct LojaRepository {
    pool: PgPool,
}

impl LojaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn listar(&self) -> Result<Vec<Loja>, AppError> {
        let lojas = sqlx::query_as::<_, Loja>("SELECT * FROM lojas ORDER BY nome ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(lojas)
    }

    pub async fn buscar_por_codigo(&self, codigo: i32) -> Result<Option<Loja>, AppError> {
        let loja = sqlx::query_as::<_, Loja>("SELECT * FROM lojas WHERE codigo = $1")
            .bind(codigo)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loja)
    }

    pub async fn buscar_por_codigos(&self, codigos: &[i32]) -> Result<Vec<Loja>, AppError> {
        let lojas = sqlx::query_as::<_, Loja>("SELECT * FROM lojas WHERE codigo = ANY($1)")
            .bind(codigos)
            .fetch_all(&self.pool)
            .await?;
        Ok(lojas)
    }

    /// Resolução do webhook pela chave da API de mensagens.
    pub async fn buscar_por_apikey(&self, apikey: &str) -> Result<Option<Loja>, AppError> {
        let loja = sqlx::query_as::<_, Loja>("SELECT * FROM lojas WHERE evolution_apikey = $1")
            .bind(apikey)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loja)
    }

    /// Resolução do webhook por instância + URL do servidor (barra final ignorada).
    pub async fn buscar_por_instancia(
        &self,
        instancia: &str,
        server_url: &str,
    ) -> Result<Option<Loja>, AppError> {
        let loja = sqlx::query_as::<_, Loja>(
            r#"
            SELECT * FROM lojas
            WHERE evolution_instancia = $1
              AND rtrim(evolution_url, '/') = $2
            LIMIT 1
            "#,
        )
        .bind(instancia)
        .bind(server_url.trim_end_matches('/'))
        .fetch_optional(&self.pool)
        .await?;
        Ok(loja)
    }

    // ---
    // Escrita pontual
    // ---

    pub async fn atualizar_por_id(
        &self,
        id: i32,
        payload: &AtualizarLojaPayload,
    ) -> Result<Option<Loja>, AppError> {
        // $n booleano indica se o campo de três estados veio no corpo.
        let loja = sqlx::query_as::<_, Loja>(
            r#"
            UPDATE lojas SET
                nome = COALESCE($2, nome),
                cidade = COALESCE($3, cidade),
                evolution_url = CASE WHEN $4 THEN $5 ELSE evolution_url END,
                evolution_instancia = CASE WHEN $6 THEN $7 ELSE evolution_instancia END,
                evolution_apikey = CASE WHEN $8 THEN $9 ELSE evolution_apikey END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.nome.as_deref())
        .bind(payload.cidade.as_deref())
        .bind(payload.evolution_url.is_some())
        .bind(campo::inicial(&payload.evolution_url))
        .bind(payload.evolution_instancia.is_some())
        .bind(campo::inicial(&payload.evolution_instancia))
        .bind(payload.evolution_apikey.is_some())
        .bind(campo::inicial(&payload.evolution_apikey))
        .fetch_optional(&self.pool)
        .await?;
        Ok(loja)
    }

    pub async fn remover_por_id(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lojas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CadastroRepository for LojaRepository {
    type Registro = LojaCadastro;
    type Existente = Loja;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<Loja>, AppError> {
        let existentes = sqlx::query_as::<_, Loja>("SELECT * FROM lojas WHERE codigo = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;
        Ok(existentes)
    }

    async fn inserir(&self, conn: &mut PgConnection, registros: &[LojaCadastro]) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO lojas (codigo, nome, cidade, evolution_url, evolution_instancia, evolution_apikey) ",
            );
            qb.push_values(lote, |mut b, l| {
                b.push_bind(l.codigo)
                    .push_bind(l.nome.clone())
                    .push_bind(l.cidade.clone())
                    .push_bind(campo::inicial(&l.evolution_url))
                    .push_bind(campo::inicial(&l.evolution_instancia))
                    .push_bind(campo::inicial(&l.evolution_apikey));
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(LojaCadastro, Loja)],
    ) -> Result<(), AppError> {
        for (novo, atual) in alteracoes {
            sqlx::query(
                r#"
                UPDATE lojas SET
                    nome = $2, cidade = $3,
                    evolution_url = $4, evolution_instancia = $5, evolution_apikey = $6,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(atual.id)
            .bind(&novo.nome)
            .bind(&novo.cidade)
            .bind(campo::resolver(&novo.evolution_url, &atual.evolution_url))
            .bind(campo::resolver(&novo.evolution_instancia, &atual.evolution_instancia))
            .bind(campo::resolver(&novo.evolution_apikey, &atual.evolution_apikey))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[Loja]) -> Result<(), AppError> {
        let ids: Vec<i32> = existentes.iter().map(|l| l.id).collect();
        sqlx::query("DELETE FROM lojas WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
