mod console_notifier;
mod keeper_client;

pub use console_notifier::*;
pub use keeper_client::*;
