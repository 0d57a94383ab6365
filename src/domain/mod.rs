pub mod coverage;
pub mod error;
pub mod generation_request;
pub mod llm_config;
pub mod schema;
pub mod test_case;
