pub mod client_store;
