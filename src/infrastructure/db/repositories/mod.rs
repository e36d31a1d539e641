pub mod client_repository;
pub mod factory;

pub use factory::Repositories;
