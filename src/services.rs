pub mod auth;
pub mod cadastro_service;
pub mod mensagens_service;
pub mod notificacao;
pub mod pedido_service;
pub mod produto_service;
pub mod webhook;
