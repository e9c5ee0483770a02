mod guard;
mod route;
mod router;

pub use guard::*;
pub use route::*;
pub use router::*;
