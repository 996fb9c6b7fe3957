//! # bl-pages
//!
//! The page-flow layer for Rusty-Blog. Every listing, detail page and
//! create/edit/delete action lives here, free of any web framework: flows
//! return view structs and `Redirect` targets for whatever renders them.

pub mod forms;
pub mod handlers;
pub mod pagination;

use std::sync::Arc;

use bl_core::clock::Clock;
use bl_core::traits::BlogRepo;

pub use handlers::*;
pub use pagination::Page;

/// State shared across all requests.
pub struct AppState {
    pub repo: Box<dyn BlogRepo>,
    pub clock: Arc<dyn Clock>,
    /// Fixed page size for every listing
    pub posts_per_page: u32,
}
