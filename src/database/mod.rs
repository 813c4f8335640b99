pub mod models;
pub mod router;

pub use router::{ConnectionRouter, RouterError, ScopedSession};
