pub mod api_spec;
pub mod config;
pub mod llm_clients;
pub mod response;
