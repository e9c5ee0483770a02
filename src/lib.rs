pub mod client;
pub mod logger;
pub mod settings;

pub mod application_impl;
pub mod application_port;
pub mod domain_model;
pub mod domain_port;
pub mod infra_fake;
pub mod infra_http;
pub mod infra_storage;
pub mod routing;
pub mod session;
pub mod store;
