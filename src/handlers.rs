pub mod auth;
pub mod clientes;
pub mod condicao_pagamento;
pub mod configuracao;
pub mod contagens;
pub mod estoque;
pub mod lojas;
pub mod mensagens;
pub mod pedidos;
pub mod produtos;
pub mod sync;
pub mod usuarios;
pub mod validade;
