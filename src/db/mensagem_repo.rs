// src/db/mensagem_repo.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    common::{error::AppError, pagination::Paginacao},
    models::mensagens::{Atendimento, AtendimentoResumo, Contato, Mensagem, NovaMensagem, StatusAtendimento},
};

pub const NOME_CONTATO_PADRAO: &str = "Contato WhatsApp";

// Atendimento visível para o usuário informado em $2 (pode ser NULL).
const FILTRO_VISIVEL: &str =
    "(a.status <> 'em_atendimento' OR a.usuario_id IS NULL OR a.usuario_id = $2)";

#[derive(Clone)]
pub struct MensagemRepository {
    pool: PgPool,
}

impl MensagemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Contatos
    // ---

    /// Busca ou cria o contato pelo telefone. Com `atualizar_nome`, um nome
    /// informado substitui o atual.
    pub async fn garantir_contato(
        &self,
        conn: &mut PgConnection,
        cod_loja: i32,
        telefone: &str,
        nome: Option<&str>,
        atualizar_nome: bool,
    ) -> Result<Contato, AppError> {
        let contato = sqlx::query_as::<_, Contato>(
            r#"
            INSERT INTO contatos (cod_loja, telefone, contato)
            VALUES ($1, $2, COALESCE($3, $5))
            ON CONFLICT (cod_loja, telefone) DO UPDATE SET
                contato = CASE WHEN $4 AND $3 IS NOT NULL THEN $3 ELSE contatos.contato END,
                updated_at = CASE WHEN $4 AND $3 IS NOT NULL THEN NOW() ELSE contatos.updated_at END
            RETURNING *
            "#,
        )
        .bind(cod_loja)
        .bind(telefone)
        .bind(nome)
        .bind(atualizar_nome)
        .bind(NOME_CONTATO_PADRAO)
        .fetch_one(&mut *conn)
        .await?;
        Ok(contato)
    }

    pub async fn buscar_contato(&self, cod_loja: i32, id: i32) -> Result<Option<Contato>, AppError> {
        let contato = sqlx::query_as::<_, Contato>("SELECT * FROM contatos WHERE cod_loja = $1 AND id = $2")
            .bind(cod_loja)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contato)
    }

    // ---
    // Atendimentos
    // ---

    /// Atendimento ativo do contato, ou um novo `aberto`. O booleano indica criação.
    pub async fn garantir_atendimento(
        &self,
        conn: &mut PgConnection,
        contato: &Contato,
    ) -> Result<(Atendimento, bool), AppError> {
        let ativo = sqlx::query_as::<_, Atendimento>(
            r#"
            SELECT * FROM atendimentos
            WHERE cod_loja = $1 AND contato_id = $2 AND status <> 'finalizado'
            ORDER BY aberto_em DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(contato.cod_loja)
        .bind(contato.id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(atendimento) = ativo {
            return Ok((atendimento, false));
        }

        let criado = sqlx::query_as::<_, Atendimento>(
            r#"
            INSERT INTO atendimentos (cod_loja, contato_id, cliente_codigo, status)
            VALUES ($1, $2, $3, 'aberto')
            ON CONFLICT (contato_id) WHERE status <> 'finalizado' DO NOTHING
            RETURNING *
            "#,
        )
        .bind(contato.cod_loja)
        .bind(contato.id)
        .bind(contato.cliente_codigo)
        .fetch_optional(&mut *conn)
        .await?;

        match criado {
            Some(atendimento) => Ok((atendimento, true)),
            // Outra requisição criou o atendimento entre a busca e o insert.
            None => {
                let atendimento = sqlx::query_as::<_, Atendimento>(
                    "SELECT * FROM atendimentos WHERE contato_id = $1 AND status <> 'finalizado' FOR UPDATE",
                )
                .bind(contato.id)
                .fetch_one(&mut *conn)
                .await?;
                Ok((atendimento, false))
            }
        }
    }

    pub async fn buscar_atendimento(&self, cod_loja: i32, id: i32) -> Result<Option<Atendimento>, AppError> {
        let atendimento =
            sqlx::query_as::<_, Atendimento>("SELECT * FROM atendimentos WHERE cod_loja = $1 AND id = $2")
                .bind(cod_loja)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(atendimento)
    }

    /// Trava a linha até o fim da transação.
    pub async fn travar_atendimento(
        &self,
        conn: &mut PgConnection,
        cod_loja: i32,
        id: i32,
    ) -> Result<Option<Atendimento>, AppError> {
        let atendimento = sqlx::query_as::<_, Atendimento>(
            "SELECT * FROM atendimentos WHERE cod_loja = $1 AND id = $2 FOR UPDATE",
        )
        .bind(cod_loja)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(atendimento)
    }

    pub async fn salvar_estado(&self, conn: &mut PgConnection, atendimento: &Atendimento) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE atendimentos
            SET status = $2, usuario_id = $3, iniciado_em = $4, finalizado_em = $5
            WHERE id = $1
            "#,
        )
        .bind(atendimento.id)
        .bind(atendimento.status)
        .bind(atendimento.usuario_id)
        .bind(atendimento.iniciado_em)
        .bind(atendimento.finalizado_em)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Atendimentos visíveis, do mais recente ao mais antigo.
    pub async fn listar_atendimentos(
        &self,
        cod_loja: i32,
        cod_usuario: Option<i32>,
        status: Option<StatusAtendimento>,
        paginacao: Paginacao,
    ) -> Result<(i64, Vec<AtendimentoResumo>), AppError> {
        let filtro = format!(
            "a.cod_loja = $1 AND {FILTRO_VISIVEL} AND ($3::status_atendimento IS NULL OR a.status = $3)"
        );

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM atendimentos a WHERE {filtro}"))
            .bind(cod_loja)
            .bind(cod_usuario)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let atendimentos = sqlx::query_as::<_, AtendimentoResumo>(&format!(
            r#"
            SELECT a.*, c.contato AS contato_nome, c.telefone,
                   (SELECT MAX(m.criado_em) FROM mensagens m WHERE m.atendimento_id = a.id) AS ultima_mensagem_em
            FROM atendimentos a
            JOIN contatos c ON c.id = a.contato_id
            WHERE {filtro}
            ORDER BY a.aberto_em DESC, a.id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(cod_loja)
        .bind(cod_usuario)
        .bind(status)
        .bind(paginacao.limit)
        .bind(paginacao.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, atendimentos))
    }

    // ---
    // Mensagens
    // ---

    pub async fn inserir_mensagem(
        &self,
        conn: &mut PgConnection,
        atendimento: &Atendimento,
        mensagem: &NovaMensagem,
    ) -> Result<Mensagem, AppError> {
        let mensagem = sqlx::query_as::<_, Mensagem>(
            r#"
            INSERT INTO mensagens (
                cod_loja, atendimento_id, contato_id, usuario_id, direcao, tipo,
                texto, midia_base64, mimetype, id_externo, payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(atendimento.cod_loja)
        .bind(atendimento.id)
        .bind(atendimento.contato_id)
        .bind(mensagem.usuario_id)
        .bind(mensagem.direcao)
        .bind(mensagem.tipo)
        .bind(&mensagem.texto)
        .bind(&mensagem.midia_base64)
        .bind(&mensagem.mimetype)
        .bind(&mensagem.id_externo)
        .bind(&mensagem.payload)
        .fetch_one(&mut *conn)
        .await?;
        Ok(mensagem)
    }

    /// Mensagens do atendimento em ordem cronológica. `apos_id` limita às mais novas.
    pub async fn listar_por_atendimento(
        &self,
        cod_loja: i32,
        atendimento_id: i32,
        apos_id: Option<i32>,
        paginacao: Paginacao,
    ) -> Result<(i64, Vec<Mensagem>), AppError> {
        const FILTRO: &str =
            "cod_loja = $1 AND atendimento_id = $2 AND ($3::int4 IS NULL OR id > $3)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM mensagens WHERE {FILTRO}"))
            .bind(cod_loja)
            .bind(atendimento_id)
            .bind(apos_id)
            .fetch_one(&self.pool)
            .await?;

        let mensagens = sqlx::query_as::<_, Mensagem>(&format!(
            "SELECT * FROM mensagens WHERE {FILTRO} ORDER BY criado_em ASC, id ASC LIMIT $4 OFFSET $5"
        ))
        .bind(cod_loja)
        .bind(atendimento_id)
        .bind(apos_id)
        .bind(paginacao.limit)
        .bind(paginacao.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, mensagens))
    }

    /// Mensagens do contato restritas aos atendimentos visíveis para `cod_usuario`.
    pub async fn listar_por_contato(
        &self,
        cod_loja: i32,
        contato_id: i32,
        cod_usuario: Option<i32>,
        apos_id: Option<i32>,
        paginacao: Paginacao,
    ) -> Result<(i64, Vec<Mensagem>), AppError> {
        let filtro = format!(
            "m.cod_loja = $1 AND m.contato_id = $3 AND ($4::int4 IS NULL OR m.id > $4) AND {FILTRO_VISIVEL}"
        );

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM mensagens m JOIN atendimentos a ON a.id = m.atendimento_id WHERE {filtro}"
        ))
        .bind(cod_loja)
        .bind(cod_usuario)
        .bind(contato_id)
        .bind(apos_id)
        .fetch_one(&self.pool)
        .await?;

        let mensagens = sqlx::query_as::<_, Mensagem>(&format!(
            r#"
            SELECT m.* FROM mensagens m
            JOIN atendimentos a ON a.id = m.atendimento_id
            WHERE {filtro}
            ORDER BY m.criado_em ASC, m.id ASC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(cod_loja)
        .bind(cod_usuario)
        .bind(contato_id)
        .bind(apos_id)
        .bind(paginacao.limit)
        .bind(paginacao.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, mensagens))
    }
}
