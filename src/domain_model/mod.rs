mod api_key;
mod bucket;
mod bucket_item;
mod envelope;
mod permission;
mod token;
mod user;

pub use api_key::*;
pub use bucket::*;
pub use bucket_item::*;
pub use envelope::*;
pub use permission::*;
pub use token::*;
pub use user::*;
