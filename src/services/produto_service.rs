// src/services/produto_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::ProdutoRepository,
    models::produto::{normalizar_eans, AtualizarProdutoPayload, Produto},
};

/// Edição e remoção avulsas de produto. Produto e EANs mudam juntos.
#[derive(Clone)]
pub struct ProdutoService {
    pool: PgPool,
    produto_repo: ProdutoRepository,
}

impl ProdutoService {
    pub fn new(pool: PgPool, produto_repo: ProdutoRepository) -> Self {
        Self { pool, produto_repo }
    }

    pub async fn atualizar(&self, id: i32, payload: &AtualizarProdutoPayload) -> Result<Produto, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self
            .produto_repo
            .travar_por_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado.".into()))?;

        let produto = self.produto_repo.atualizar_por_id(&mut *tx, &atual, payload).await?;

        if let Some(eans) = &payload.eans {
            let eans = normalizar_eans(eans);
            self.produto_repo
                .substituir_eans(&mut *tx, &[(produto.cod_loja, produto.codigo, eans.as_slice())])
                .await?;
        }

        tx.commit().await?;
        Ok(produto)
    }

    pub async fn remover(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let produto = self
            .produto_repo
            .travar_por_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado.".into()))?;

        self.produto_repo.remover_por_id(&mut *tx, &produto).await?;

        tx.commit().await?;
        tracing::info!("🗑️ Produto {} (loja {}) removido com seus EANs.", produto.codigo, produto.cod_loja);
        Ok(())
    }
}
