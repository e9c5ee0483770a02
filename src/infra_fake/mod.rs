mod fake_api;
mod recording;
mod token_codec;

pub use fake_api::*;
pub use recording::*;
pub use token_codec::*;
