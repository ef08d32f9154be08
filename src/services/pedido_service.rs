// src/services/pedido_service.rs

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::PedidoRepository,
    models::{
        pedido::{EnviarPedidoPayload, PedidoRegistrado},
        pedido_restaurante::{CadastrarPedidoRestaurantePayload, PedidoRestauranteRegistrado, STATUS_LIBERADO},
    },
};

#[derive(Clone)]
pub struct PedidoService {
    pool: PgPool,
    pedido_repo: PedidoRepository,
}

impl PedidoService {
    pub fn new(pool: PgPool, pedido_repo: PedidoRepository) -> Self {
        Self { pool, pedido_repo }
    }

    /// Cabeçalho e itens na mesma transação.
    pub async fn enviar(&self, payload: &EnviarPedidoPayload) -> Result<PedidoRegistrado, AppError> {
        let calculado = payload.calcular(Utc::now())?;

        let mut tx = self.pool.begin().await?;
        let id = self.pedido_repo.inserir_pedido(&mut *tx, payload, &calculado).await?;
        tx.commit().await?;

        tracing::info!(
            "🧾 Pedido {} recebido (loja {}, {} itens, total {})",
            id,
            calculado.cod_loja,
            calculado.itens.len(),
            calculado.total_pedido
        );

        Ok(PedidoRegistrado {
            mensagem: "Pedido recebido com sucesso.".into(),
            id_local: id,
        })
    }

    /// Cria o pedido ou, com `id`, substitui cabeçalho e itens. Volta sempre a liberado.
    pub async fn cadastrar_restaurante(
        &self,
        payload: CadastrarPedidoRestaurantePayload,
    ) -> Result<PedidoRestauranteRegistrado, AppError> {
        let pedido = payload.converter()?;

        let mut tx = self.pool.begin().await?;
        let (id, message) = match pedido.id {
            Some(id) => {
                if !self.pedido_repo.substituir_restaurante(&mut *tx, id, &pedido).await? {
                    return Err(AppError::NotFound("Pedido nao encontrado.".into()));
                }
                (id, "Pedido atualizado com sucesso.")
            }
            None => {
                let id = self.pedido_repo.criar_restaurante(&mut *tx, &pedido).await?;
                (id, "Pedido cadastrado com sucesso.")
            }
        };
        tx.commit().await?;

        Ok(PedidoRestauranteRegistrado {
            message: message.into(),
            id,
            status: STATUS_LIBERADO,
        })
    }
}
