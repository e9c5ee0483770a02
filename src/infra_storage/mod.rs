mod cookie_store;
mod file_store;
mod memory_store;
mod persist;

pub use cookie_store::*;
pub use file_store::*;
pub use memory_store::*;
