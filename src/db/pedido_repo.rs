// src/db/pedido_repo.rs

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::{
        pedido::{EnviarPedidoPayload, PedidoCalculado},
        pedido_restaurante::{
            ItemPedidoRestaurante, NovoItemRestaurante, NovoPedidoRestaurante, PedidoRestaurante,
            PedidoRestauranteComItens, STATUS_LIBERADO,
        },
    },
};

#[derive(Clone)]
pub struct PedidoRepository {
    pool: PgPool,
}

impl PedidoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Pedidos de venda
    // ---

    /// Grava cabeçalho e itens. Devolve o id gerado.
    pub async fn inserir_pedido(
        &self,
        conn: &mut PgConnection,
        payload: &EnviarPedidoPayload,
        calculado: &PedidoCalculado,
    ) -> Result<i32, AppError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO pedidos (
                cod_loja, cod_usuario, cod_cliente, tipo, cod_cond_pagto, valor_frete,
                nome_transportadora, tipo_frete, total_itens, total_pedido, observacao,
                origem, status, data_hora
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(calculado.cod_loja)
        .bind(payload.cod_usuario)
        .bind(payload.cod_cliente)
        .bind(&payload.tipo)
        .bind(payload.cod_cond_pagto)
        .bind(payload.valor_frete)
        .bind(&payload.nome_transportadora)
        .bind(&payload.tipo_frete)
        .bind(calculado.total_itens)
        .bind(calculado.total_pedido)
        .bind(&payload.observacao)
        .bind(&payload.origem)
        .bind(calculado.status)
        .bind(calculado.data_hora)
        .fetch_one(&mut *conn)
        .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"INSERT INTO pedido_itens (
                id_pedido, cod_produto, descricao, quantidade, pr_venda, pr_custo,
                subtotal, compl_item, perc_desconto, vl_desconto
            ) "#,
        );
        qb.push_values(&calculado.itens, |mut b, item| {
            b.push_bind(id)
                .push_bind(item.cod_produto)
                .push_bind(item.descricao.clone())
                .push_bind(item.quantidade)
                .push_bind(item.pr_venda)
                .push_bind(item.pr_custo)
                .push_bind(item.subtotal)
                .push_bind(item.compl_item.clone())
                .push_bind(item.perc_desconto)
                .push_bind(item.vl_desconto);
        });
        qb.build().execute(&mut *conn).await?;

        Ok(id)
    }

    // ---
    // Pedidos de restaurante
    // ---

    pub async fn criar_restaurante(
        &self,
        conn: &mut PgConnection,
        pedido: &NovoPedidoRestaurante,
    ) -> Result<i32, AppError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO pedidos_restaurante (
                cod_loja, cod_usuario, codigo_cartao, data_hora, origem, status, total_itens, total_pedido
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(pedido.cod_loja)
        .bind(pedido.cod_usuario)
        .bind(&pedido.codigo_cartao)
        .bind(pedido.data_hora)
        .bind(&pedido.origem)
        .bind(STATUS_LIBERADO)
        .bind(pedido.total_itens)
        .bind(pedido.total_pedido)
        .fetch_one(&mut *conn)
        .await?;

        Self::inserir_itens_restaurante(conn, id, &pedido.itens).await?;
        Ok(id)
    }

    /// Substitui cabeçalho e itens. O status volta para liberado.
    /// Retorna `false` se o pedido não existe.
    pub async fn substituir_restaurante(
        &self,
        conn: &mut PgConnection,
        id: i32,
        pedido: &NovoPedidoRestaurante,
    ) -> Result<bool, AppError> {
        let resultado = sqlx::query(
            r#"
            UPDATE pedidos_restaurante SET
                cod_loja = $2, cod_usuario = $3, codigo_cartao = $4, data_hora = $5,
                origem = $6, status = $7, total_itens = $8, total_pedido = $9,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(pedido.cod_loja)
        .bind(pedido.cod_usuario)
        .bind(&pedido.codigo_cartao)
        .bind(pedido.data_hora)
        .bind(&pedido.origem)
        .bind(STATUS_LIBERADO)
        .bind(pedido.total_itens)
        .bind(pedido.total_pedido)
        .execute(&mut *conn)
        .await?;

        if resultado.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM pedido_restaurante_itens WHERE pedido_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Self::inserir_itens_restaurante(conn, id, &pedido.itens).await?;
        Ok(true)
    }

    async fn inserir_itens_restaurante(
        conn: &mut PgConnection,
        pedido_id: i32,
        itens: &[NovoItemRestaurante],
    ) -> Result<(), AppError> {
        if itens.is_empty() {
            return Ok(());
        }
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO pedido_restaurante_itens (pedido_id, cod_produto, descricao, quantidade, pr_venda, pr_custo, subtotal) ",
        );
        qb.push_values(itens, |mut b, item| {
            b.push_bind(pedido_id)
                .push_bind(item.cod_produto)
                .push_bind(item.descricao.clone())
                .push_bind(item.quantidade)
                .push_bind(item.pr_venda)
                .push_bind(item.pr_custo)
                .push_bind(item.subtotal);
        });
        qb.build().execute(&mut *conn).await?;
        Ok(())
    }

    /// Pedidos liberados da loja com seus itens, mais antigos primeiro.
    pub async fn listar_liberados(&self, cod_loja: i32) -> Result<Vec<PedidoRestauranteComItens>, AppError> {
        let pedidos = sqlx::query_as::<_, PedidoRestaurante>(
            "SELECT * FROM pedidos_restaurante WHERE cod_loja = $1 AND status = $2 ORDER BY data_hora, id",
        )
        .bind(cod_loja)
        .bind(STATUS_LIBERADO)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = pedidos.iter().map(|p| p.id).collect();
        let itens = sqlx::query_as::<_, ItemPedidoRestaurante>(
            "SELECT * FROM pedido_restaurante_itens WHERE pedido_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut por_pedido: HashMap<i32, Vec<ItemPedidoRestaurante>> = HashMap::new();
        for item in itens {
            por_pedido.entry(item.pedido_id).or_default().push(item);
        }

        Ok(pedidos
            .into_iter()
            .map(|pedido| {
                let itens = por_pedido.remove(&pedido.id).unwrap_or_default();
                PedidoRestauranteComItens { pedido, itens }
            })
            .collect())
    }

    pub async fn alterar_status_restaurante(
        &self,
        id: i32,
        status: i32,
    ) -> Result<Option<PedidoRestaurante>, AppError> {
        let pedido = sqlx::query_as::<_, PedidoRestaurante>(
            "UPDATE pedidos_restaurante SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pedido)
    }
}
