mod api_key_service_impl;
mod auth_service_impl;
mod bucket_item_service_impl;
mod bucket_service_impl;
mod public_service_impl;
mod user_service_impl;

pub use api_key_service_impl::*;
pub use auth_service_impl::*;
pub use bucket_item_service_impl::*;
pub use bucket_service_impl::*;
pub use public_service_impl::*;
pub use user_service_impl::*;
