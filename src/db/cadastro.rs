// src/db/cadastro.rs

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::common::{error::AppError, reconcile::Reconciliavel};

/// Linhas por INSERT em lote (fica bem abaixo do limite de binds do Postgres).
pub const LINHAS_POR_INSERT: usize = 1000;

/// Persistência de uma entidade dos endpoints `cadastrar`.
///
/// Todos os métodos recebem a conexão da transação aberta pelo
/// `CadastroService`; nenhum deles faz commit.
#[async_trait]
pub trait CadastroRepository: Send + Sync {
    type Registro: Reconciliavel<Existente = Self::Existente> + Send + Sync;
    type Existente: Send + Sync;

    /// Linhas atuais das lojas informadas.
    async fn carregar(
        &self,
        conn: &mut PgConnection,
        lojas: &[i32],
    ) -> Result<Vec<Self::Existente>, AppError>;

    async fn inserir(
        &self,
        conn: &mut PgConnection,
        registros: &[Self::Registro],
    ) -> Result<(), AppError>;

    async fn atualizar(
        &self,
        conn: &mut PgConnection,
        alteracoes: &[(Self::Registro, Self::Existente)],
    ) -> Result<(), AppError>;

    async fn remover(
        &self,
        conn: &mut PgConnection,
        existentes: &[Self::Existente],
    ) -> Result<(), AppError>;
}
