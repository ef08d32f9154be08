pub mod auth;
pub mod cliente;
pub mod condicao_pagamento;
pub mod configuracao;
pub mod contagem;
pub mod estoque;
pub mod loja;
pub mod mensagens;
pub mod pedido;
pub mod pedido_restaurante;
pub mod produto;
pub mod usuario;
pub mod validade;
