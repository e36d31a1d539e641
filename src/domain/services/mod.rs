pub mod client_validation;
