pub mod api;
pub mod config;
pub mod data_models;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod rebuilder;
pub mod upstream;
pub mod validator;
