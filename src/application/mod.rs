pub mod client_registry;
pub mod context;
pub mod shared;
