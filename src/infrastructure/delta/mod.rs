pub mod profile;
pub mod rest_client;
