pub mod campo;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod reconcile;
