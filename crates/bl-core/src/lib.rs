//! rusty-blog/crates/bl-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Blog:
//! who may read which posts, and who may change them.

pub mod authorization;
pub mod clock;
pub mod error;
pub mod models;
pub mod query;
pub mod traits;
pub mod visibility;

// Re-exporting for easier access in other crates
pub use authorization::*;
pub use clock::*;
pub use error::*;
pub use models::*;
pub use query::*;
pub use traits::*;
pub use visibility::*;
