// src/services/cadastro_service.rs

use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        extract::OneOrMany,
        reconcile::{self, EntradaCadastro, Reconciliavel, ResumoCadastro},
    },
    db::cadastro::CadastroRepository,
};

/// Executa os endpoints `cadastrar`: valida o lote, planeja as mudanças e
/// aplica tudo numa única transação.
#[derive(Clone)]
pub struct CadastroService {
    pool: PgPool,
}

impl CadastroService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn processar<R, I>(&self, repo: &R, corpo: OneOrMany<I>) -> Result<ResumoCadastro, AppError>
    where
        R: CadastroRepository,
        I: EntradaCadastro<Registro = R::Registro>,
    {
        // Array é autoritativo para as lojas presentes; objeto único nunca remove.
        let autoritativo = corpo.is_many();
        let itens = corpo.into_vec();
        if itens.is_empty() {
            return Err(AppError::BadRequest(I::MENSAGEM_VAZIO.to_string()));
        }

        let registros = reconcile::converter(itens)?;
        if let Some(chave) = reconcile::duplicado(&registros) {
            return Err(AppError::BadRequest(
                <R::Registro as Reconciliavel>::mensagem_duplicado(chave),
            ));
        }
        let lojas = reconcile::escopos(&registros);

        let mut tx = self.pool.begin().await?;

        let existentes = repo.carregar(&mut *tx, &lojas).await?;
        let plano = reconcile::planejar(registros, existentes, autoritativo);

        if !plano.inserir.is_empty() {
            repo.inserir(&mut *tx, &plano.inserir).await?;
        }
        if !plano.atualizar.is_empty() {
            repo.atualizar(&mut *tx, &plano.atualizar).await?;
        }
        if !plano.remover.is_empty() {
            repo.remover(&mut *tx, &plano.remover).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "📦 {}: {} inseridos, {} atualizados, {} removidos, {} inalterados (lojas {:?})",
            <R::Registro as Reconciliavel>::ENTIDADE,
            plano.inserir.len(),
            plano.atualizar.len(),
            plano.remover.len(),
            plano.inalterados,
            lojas
        );

        Ok(ResumoCadastro {
            message: I::MENSAGEM_SUCESSO.to_string(),
            inseridos: plano.inserir.len(),
            atualizados: plano.atualizar.len(),
            removidos: plano.remover.len(),
        })
    }
}
