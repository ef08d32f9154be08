// src/db/cliente_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{campo, error::AppError, pagination::Paginacao},
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::cliente::{Cliente, ClienteCadastro},
};

#[derive(Clone)]
pub struct ClienteRepository {
    pool: PgPool,
}

impl ClienteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca por nome, documento ou código. `q` vazio lista todos.
    pub async fn buscar(
        &self,
        cod_loja: i32,
        q: &str,
        paginacao: Paginacao,
    ) -> Result<(i64, Vec<Cliente>), AppError> {
        let q = q.trim();
        let padrao = format!("%{}%", q.replace('%', "\\%").replace('_', "\\_"));
        let codigo: Option<i32> = q.parse().ok();
        let documento: String = q.chars().filter(|c| c.is_ascii_digit()).collect();

        const FILTRO: &str = r#"
            cod_loja = $1 AND (
                $2 = '%%'
                OR nome ILIKE $2
                OR codigo = $3
                OR ($4 <> '' AND regexp_replace(coalesce(cpf_cnpj, ''), '\D', '', 'g') = $4)
            )
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM clientes WHERE {FILTRO}"))
            .bind(cod_loja)
            .bind(&padrao)
            .bind(codigo)
            .bind(&documento)
            .fetch_one(&self.pool)
            .await?;

        let clientes = sqlx::query_as::<_, Cliente>(&format!(
            "SELECT * FROM clientes WHERE {FILTRO} ORDER BY nome ASC LIMIT $5 OFFSET $6"
        ))
        .bind(cod_loja)
        .bind(&padrao)
        .bind(codigo)
        .bind(&documento)
        .bind(paginacao.limit)
        .bind(paginacao.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, clientes))
    }
}

#[async_trait]
impl CadastroRepository for ClienteRepository {
    type Registro = ClienteCadastro;
    type Existente = Cliente;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<Cliente>, AppError> {
        let existentes = sqlx::query_as::<_, Cliente>("SELECT * FROM clientes WHERE cod_loja = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;
        Ok(existentes)
    }

    async fn inserir(&self, conn: &mut PgConnection, registros: &[ClienteCadastro]) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                r#"INSERT INTO clientes (
                    cod_loja, codigo, nome, cpf_cnpj, inscricao_estadual,
                    telefone, email, endereco, cidade, uf, ativo
                ) "#,
            );
            qb.push_values(lote, |mut b, c| {
                b.push_bind(c.cod_loja)
                    .push_bind(c.codigo)
                    .push_bind(c.nome.clone())
                    .push_bind(campo::inicial(&c.cpf_cnpj))
                    .push_bind(campo::inicial(&c.inscricao_estadual))
                    .push_bind(campo::inicial(&c.telefone))
                    .push_bind(campo::inicial(&c.email))
                    .push_bind(campo::inicial(&c.endereco))
                    .push_bind(campo::inicial(&c.cidade))
                    .push_bind(campo::inicial(&c.uf))
                    .push_bind(c.ativo.unwrap_or(true));
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(ClienteCadastro, Cliente)],
    ) -> Result<(), AppError> {
        for (novo, atual) in alteracoes {
            sqlx::query(
                r#"
                UPDATE clientes SET
                    nome = $2, cpf_cnpj = $3, inscricao_estadual = $4, telefone = $5,
                    email = $6, endereco = $7, cidade = $8, uf = $9, ativo = $10,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(atual.id)
            .bind(&novo.nome)
            .bind(campo::resolver(&novo.cpf_cnpj, &atual.cpf_cnpj))
            .bind(campo::resolver(&novo.inscricao_estadual, &atual.inscricao_estadual))
            .bind(campo::resolver(&novo.telefone, &atual.telefone))
            .bind(campo::resolver(&novo.email, &atual.email))
            .bind(campo::resolver(&novo.endereco, &atual.endereco))
            .bind(campo::resolver(&novo.cidade, &atual.cidade))
            .bind(campo::resolver(&novo.uf, &atual.uf))
            .bind(novo.ativo.unwrap_or(atual.ativo))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[Cliente]) -> Result<(), AppError> {
        let ids: Vec<i32> = existentes.iter().map(|c| c.id).collect();
        sqlx::query("DELETE FROM clientes WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
