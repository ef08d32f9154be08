// src/db/usuario_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{campo, error::AppError},
    db::cadastro::{CadastroRepository, LINHAS_POR_INSERT},
    models::{
        auth::TokenRecuperacao,
        usuario::{AtualizarUsuarioPayload, Usuario, UsuarioCadastro},
    },
};

// O repositório de usuários, responsável pelas tabelas 'usuarios' e 'tokens_recuperacao'
#[derive(Clone)]
pub struct UsuarioRepository {
    pool: PgPool,
}

impl UsuarioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn listar(&self, cod_loja: Option<i32>) -> Result<Vec<Usuario>, AppError> {
        let usuarios = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT * FROM usuarios
            WHERE ($1::int4 IS NULL OR cod_loja = $1)
            ORDER BY cod_loja, nome
            "#,
        )
        .bind(cod_loja)
        .fetch_all(&self.pool)
        .await?;
        Ok(usuarios)
    }

    pub async fn buscar_por_id(&self, id: i32) -> Result<Option<Usuario>, AppError> {
        let usuario = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(usuario)
    }

    /// Busca por e-mail (sem diferenciar maiúsculas) ou telefone (comparando só dígitos).
    pub async fn buscar_por_login(&self, login: &str) -> Result<Option<Usuario>, AppError> {
        let login = login.trim();
        let digitos: String = login.chars().filter(|c| c.is_ascii_digit()).collect();

        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT * FROM usuarios
            WHERE lower(email) = lower($1)
               OR ($2 <> '' AND regexp_replace(telefone, '\D', '', 'g') = $2)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(login)
        .bind(digitos)
        .fetch_optional(&self.pool)
        .await?;
        Ok(usuario)
    }

    pub async fn definir_senha<'e, E>(&self, executor: E, id: i32, senha_md5: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE usuarios SET senha_md5 = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(senha_md5)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn atualizar_por_id(
        &self,
        id: i32,
        payload: &AtualizarUsuarioPayload,
    ) -> Result<Option<Usuario>, AppError> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            UPDATE usuarios SET
                nome = COALESCE($2, nome),
                email = CASE WHEN $3 THEN $4 ELSE email END,
                telefone = CASE WHEN $5 THEN $6 ELSE telefone END,
                senha_md5 = CASE WHEN $7 THEN $8 ELSE senha_md5 END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.nome.as_deref())
        .bind(payload.email.is_some())
        .bind(campo::inicial(&payload.email))
        .bind(payload.telefone.is_some())
        .bind(campo::inicial(&payload.telefone))
        .bind(payload.senha_md5.is_some())
        .bind(campo::inicial(&payload.senha_md5))
        .fetch_optional(&self.pool)
        .await?;
        Ok(usuario)
    }

    pub async fn remover_por_id(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Tokens de recuperação de senha
    // ---

    /// Emite um código para o usuário, apagando os anteriores dele e os expirados.
    /// `None` quando o código já pertence a outro token ativo.
    pub async fn criar_token(
        &self,
        id_usuario: i32,
        token: &str,
        expira_em: DateTime<Utc>,
    ) -> Result<Option<TokenRecuperacao>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tokens_recuperacao WHERE id_usuario = $1 OR expira_em <= NOW()")
            .bind(id_usuario)
            .execute(&mut *tx)
            .await?;

        let criado = sqlx::query_as::<_, TokenRecuperacao>(
            r#"
            INSERT INTO tokens_recuperacao (id_usuario, token, expira_em)
            VALUES ($1, $2, $3)
            ON CONFLICT (token) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(id_usuario)
        .bind(token)
        .bind(expira_em)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(criado)
    }

    /// Token com esse código (pode estar expirado).
    pub async fn buscar_token<'e, E>(&self, executor: E, token: &str) -> Result<Option<TokenRecuperacao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let encontrado = sqlx::query_as::<_, TokenRecuperacao>(
            r#"
            SELECT * FROM tokens_recuperacao
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;
        Ok(encontrado)
    }

    pub async fn remover_token<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM tokens_recuperacao WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CadastroRepository for UsuarioRepository {
    type Registro = UsuarioCadastro;
    type Existente = Usuario;

    async fn carregar(&self, conn: &mut PgConnection, lojas: &[i32]) -> Result<Vec<Usuario>, AppError> {
        let existentes = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE cod_loja = ANY($1)")
            .bind(lojas)
            .fetch_all(&mut *conn)
            .await?;
        Ok(existentes)
    }

    async fn inserir(&self, conn: &mut PgConnection, registros: &[UsuarioCadastro]) -> Result<(), AppError> {
        for lote in registros.chunks(LINHAS_POR_INSERT) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO usuarios (cod_loja, codigo, nome, email, telefone, senha_md5) ");
            qb.push_values(lote, |mut b, u| {
                b.push_bind(u.cod_loja)
                    .push_bind(u.codigo)
                    .push_bind(u.nome.clone())
                    .push_bind(campo::inicial(&u.email))
                    .push_bind(campo::inicial(&u.telefone))
                    .push_bind(campo::inicial(&u.senha_md5));
            });
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(UsuarioCadastro, Usuario)],
    ) -> Result<(), AppError> {
        for (novo, atual) in alteracoes {
            sqlx::query(
                r#"
                UPDATE usuarios SET
                    nome = $2, email = $3, telefone = $4, senha_md5 = $5,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(atual.id)
            .bind(&novo.nome)
            .bind(campo::resolver(&novo.email, &atual.email))
            .bind(campo::resolver(&novo.telefone, &atual.telefone))
            .bind(campo::resolver(&novo.senha_md5, &atual.senha_md5))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    async fn remover(&self, conn: &mut PgConnection, existentes: &[Usuario]) -> Result<(), AppError> {
        let ids: Vec<i32> = existentes.iter().map(|u| u.id).collect();
        sqlx::query("DELETE FROM usuarios WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
