pub mod catalog_port;
pub mod event_port;
pub mod prompt_port;
