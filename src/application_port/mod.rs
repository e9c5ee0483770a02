mod api_error;
mod api_key_service;
mod auth_service;
mod bucket_item_service;
mod bucket_service;
mod public_service;
mod user_service;

pub use api_error::*;
pub use api_key_service::*;
pub use auth_service::*;
pub use bucket_item_service::*;
pub use bucket_service::*;
pub use public_service::*;
pub use user_service::*;
