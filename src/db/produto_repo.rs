// src/db/produto_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{campo, error::AppError, pagination::Paginacao},
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::produto::{AtualizarProdutoPayload, Ean, Produto, ProdutoCadastro, ProdutoExistente},
};

#[derive(Clone)]
pub struct ProdutoRepository {
    pool: PgPool,
}

/// Escapa curingas do ILIKE para buscar o texto literal.
fn padrao_ilike(q: &str) -> String {
    let escapado = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escapado}%")
}

impl ProdutoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn listar(&self, cod_loja: i32, paginacao: Paginacao) -> Result<(i64, Vec<Produto>), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM produtos WHERE cod_loja = $1")
            .bind(cod_loja)
            .fetch_one(&self.pool)
            .await?;

        let produtos = sqlx::query_as::<_, Produto>(
            "SELECT * FROM produtos WHERE cod_loja = $1 ORDER BY nome ASC, codigo ASC LIMIT $2 OFFSET $3",
        )
        .bind(cod_loja)
        .bind(paginacao.limit)
        .bind(paginacao.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, produtos))
    }

    pub async fn listar_todos(&self, cod_loja: i32) -> Result<Vec<Produto>, AppError> {
        let produtos = sqlx::query_as::<_, Produto>("SELECT * FROM produtos WHERE cod_loja = $1 ORDER BY codigo")
            .bind(cod_loja)
            .fetch_all(&self.pool)
            .await?;
        Ok(produtos)
    }

    /// Código de barras principal primeiro; se nada casar, os EANs secundários.
    pub async fn buscar_por_codigo_barras(&self, cod_loja: i32, codigo_barras: &str) -> Result<Vec<Produto>, AppError> {
        let principais = sqlx::query_as::<_, Produto>(
            "SELECT * FROM produtos WHERE cod_loja = $1 AND codigo_barras = $2 ORDER BY codigo",
        )
        .bind(cod_loja)
        .bind(codigo_barras)
        .fetch_all(&self.pool)
        .await?;

        if !principais.is_empty() {
            return Ok(principais);
        }

        let secundarios = sqlx::query_as::<_, Produto>(
            r#"
            SELECT DISTINCT p.* FROM produtos p
            JOIN eans e ON e.cod_loja = p.cod_loja AND e.cod_produto = p.codigo
            WHERE e.cod_loja = $1 AND e.codigo_barras = $2
            ORDER BY p.codigo
            "#,
        )
        .bind(cod_loja)
        .bind(codigo_barras)
        .fetch_all(&self.pool)
        .await?;
        Ok(secundarios)
    }

    /// Nome contendo o texto (sem diferenciar maiúsculas) ou código exato.
    pub async fn buscar_por_texto(
        &self,
        cod_loja: i32,
        q: &str,
        paginacao: Paginacao,
    ) -> Result<(i64, Vec<Produto>), AppError> {
        let padrao = padrao_ilike(q);
        let codigo: Option<i32> = q.parse().ok();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM produtos WHERE cod_loja = $1 AND (nome ILIKE $2 OR codigo = $3)",
        )
        .bind(cod_loja)
        .bind(&padrao)
        .bind(codigo)
        .fetch_one(&self.pool)
        .await?;

        let produtos = sqlx::query_as::<_, Produto>(
            r#"
            SELECT * FROM produtos
            WHERE cod_loja = $1 AND (nome ILIKE $2 OR codigo = $3)
            ORDER BY (codigo = $3) DESC NULLS LAST, nome ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(cod_loja)
        .bind(&padrao)
        .bind(codigo)
        .bind(paginacao.limit)
        .bind(paginacao.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, produtos))
    }

    pub async fn buscar_por_id(&self, id: i32) -> Result<Option<Produto>, AppError> {
        let produto = sqlx::query_as::<_, Produto>("SELECT * FROM produtos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(produto)
    }

    pub async fn listar_eans(&self, cod_loja: i32) -> Result<Vec<Ean>, AppError> {
        let eans = sqlx::query_as::<_, Ean>(
            "SELECT * FROM eans WHERE cod_loja = $1 ORDER BY cod_produto, codigo_barras",
        )
        .bind(cod_loja)
        .fetch_all(&self.pool)
        .await?;
        Ok(eans)
    }

    // ---
    // Escrita (sempre dentro de transação)
    // ---

    pub async fn travar_por_id(&self, conn: &mut PgConnection, id: i32) -> Result<Option<Produto>, AppError> {
        let produto = sqlx::query_as::<_, Produto>("SELECT * FROM produtos WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(produto)
    }

    pub async fn atualizar_por_id(
        &self,
        conn: &mut PgConnection,
        atual: &Produto,
        payload: &AtualizarProdutoPayload,
    ) -> Result<Produto, AppError> {
        let produto = sqlx::query_as::<_, Produto>(
            r#"
            UPDATE produtos SET
                nome = $2, unidade_medida = $3, codigo_barras = $4,
                pr_venda = $5, pr_custo = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(atual.id)
        .bind(payload.nome.as_deref().unwrap_or(&atual.nome))
        .bind(payload.unidade_medida.as_deref().unwrap_or(&atual.unidade_medida))
        .bind(campo::resolver(&payload.codigo_barras, &atual.codigo_barras))
        .bind(campo::resolver(&payload.pr_venda, &atual.pr_venda))
        .bind(campo::resolver(&payload.pr_custo, &atual.pr_custo))
        .fetch_one(&mut *conn)
        .await?;
        Ok(produto)
    }

    pub async fn remover_por_id(&self, conn: &mut PgConnection, produto: &Produto) -> Result<(), AppError> {
        sqlx::query("DELETE FROM eans WHERE cod_loja = $1 AND cod_produto = $2")
            .bind(produto.cod_loja)
            .bind(produto.codigo)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM produtos WHERE id = $1")
            .bind(produto.id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Apaga os EANs dos produtos informados por (cod_loja, codigo).
    async fn remover_eans(&self, conn: &mut PgConnection, chaves: &[(i32, i32)]) -> Result<(), AppError> {
        if chaves.is_empty() {
            return Ok(());
        }
        let (lojas, codigos): (Vec<i32>, Vec<i32>) = chaves.iter().copied().unzip();
        sqlx::query(
            r#"
            DELETE FROM eans
            WHERE (cod_loja, cod_produto) IN (
                SELECT * FROM UNNEST($1::int4[], $2::int4[])
            )
            "#,
        )
        .bind(&lojas)
        .bind(&codigos)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Troca o conjunto de EANs de cada produto: apaga tudo e insere de novo.
    pub async fn substituir_eans(
        &self,
        conn: &mut PgConnection,
        conjuntos: &[(i32, i32, &[String])],
    ) -> Result<(), AppError> {
        let chaves: Vec<(i32, i32)> = conjuntos.iter().map(|(l, c, _)| (*l, *c)).collect();
        self.remover_eans(conn, &chaves).await?;

        let linhas: Vec<(i32, i32, String)> = conjuntos
            .iter()
            .flat_map(|(l, c, eans)| eans.iter().map(move |e| (*l, *c, e.clone())))
            .collect();

        for lote in linhas.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO eans (cod_loja, cod_produto, codigo_barras) ");
            qb.push_values(lote, |mut b, (loja, produto, ean)| {
                b.push_bind(*loja).push_bind(*produto).push_bind(ean.clone());
            });
            qb.push(" ON CONFLICT DO NOTHING");
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CadastroRepository for ProdutoRepository {
    type Registro = ProdutoCadastro;
    type Existente = ProdutoExistente;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<ProdutoExistente>, AppError> {
        let produtos = sqlx::query_as::<_, Produto>("SELECT * FROM produtos WHERE cod_loja = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;

        let eans = sqlx::query_as::<_, Ean>("SELECT * FROM eans WHERE cod_loja = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;

        let mut por_produto: HashMap<(i32, i32), Vec<String>> = HashMap::new();
        for ean in eans {
            por_produto
                .entry((ean.cod_loja, ean.cod_produto))
                .or_default()
                .push(ean.codigo_barras);
        }

        Ok(produtos
            .into_iter()
            .map(|produto| {
                let eans = por_produto
                    .remove(&(produto.cod_loja, produto.codigo))
                    .unwrap_or_default();
                ProdutoExistente { produto, eans }
            })
            .collect())
    }

    async fn inserir(&self, conn: &mut PgConnection, registros: &[ProdutoCadastro]) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO produtos (cod_loja, codigo, nome, unidade_medida, codigo_barras, pr_venda, pr_custo) ",
            );
            qb.push_values(lote, |mut b, p| {
                b.push_bind(p.cod_loja)
                    .push_bind(p.codigo)
                    .push_bind(p.nome.clone())
                    .push_bind(p.unidade_medida.clone())
                    .push_bind(campo::inicial(&p.codigo_barras))
                    .push_bind(campo::inicial(&p.pr_venda))
                    .push_bind(campo::inicial(&p.pr_custo));
            });
            qb.build().execute(&mut *conn).await?;
        }

        let conjuntos: Vec<(i32, i32, &[String])> = registros
            .iter()
            .map(|p| (p.cod_loja, p.codigo, p.eans.as_slice()))
            .collect();
        self.substituir_eans(conn, &conjuntos).await
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(ProdutoCadastro, ProdutoExistente)],
    ) -> Result<(), AppError> {
        for (novo, existente) in alteracoes {
            let atual = &existente.produto;
            sqlx::query(
                r#"
                UPDATE produtos SET
                    nome = $2, unidade_medida = $3, codigo_barras = $4,
                    pr_venda = $5, pr_custo = $6, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(atual.id)
            .bind(&novo.nome)
            .bind(&novo.unidade_medida)
            .bind(campo::resolver(&novo.codigo_barras, &atual.codigo_barras))
            .bind(campo::resolver(&novo.pr_venda, &atual.pr_venda))
            .bind(campo::resolver(&novo.pr_custo, &atual.pr_custo))
            .execute(&mut *conn)
            .await?;
        }

        let conjuntos: Vec<(i32, i32, &[String])> = alteracoes
            .iter()
            .map(|(p, _)| (p.cod_loja, p.codigo, p.eans.as_slice()))
            .collect();
        self.substituir_eans(conn, &conjuntos).await
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[ProdutoExistente]) -> Result<(), AppError> {
        let chaves: Vec<(i32, i32)> = existentes
            .iter()
            .map(|e| (e.produto.cod_loja, e.produto.codigo))
            .collect();
        self.remover_eans(conn, &chaves).await?;

        let ids: Vec<i32> = existentes.iter().map(|e| e.produto.id).collect();
        sqlx::query("DELETE FROM produtos WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curingas_do_ilike_sao_escapados() {
        assert_eq!(padrao_ilike("arroz"), "%arroz%");
        assert_eq!(padrao_ilike("50%"), "%50\\%%");
        assert_eq!(padrao_ilike("a_b"), "%a\\_b%");
    }
}
