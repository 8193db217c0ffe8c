//! Shared state handed to every handler through `web::Data`.

use crate::db::Store;

pub struct AppState {
    pub store: Store,
    /// Number of reviews served by `/featured-reviews`.
    pub featured_limit: usize,
}

impl AppState {
    pub fn new(store: Store, featured_limit: usize) -> Self {
        Self {
            store,
            featured_limit,
        }
    }
}
