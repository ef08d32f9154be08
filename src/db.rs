pub mod cadastro;

pub mod loja_repo;
pub use loja_repo::LojaRepository;
pub mod usuario_repo;
pub use usuario_repo::UsuarioRepository;
pub mod produto_repo;
pub use produto_repo::ProdutoRepository;
pub mod estoque_repo;
pub use estoque_repo::EstoqueRepository;
pub mod cliente_repo;
pub use cliente_repo::ClienteRepository;
pub mod condicao_pagamento_repo;
pub use condicao_pagamento_repo::CondicaoPagamentoRepository;
pub mod configuracao_repo;
pub use configuracao_repo::ConfiguracaoRepository;
pub mod contagem_repo;
pub use contagem_repo::ContagemRepository;
pub mod pedido_repo;
pub use pedido_repo::PedidoRepository;
pub mod validade_repo;
pub use validade_repo::ValidadeRepository;
pub mod mensagem_repo;
pub use mensagem_repo::MensagemRepository;
