//! Backend for the Local Food Lovers Network: users, food reviews and
//! favorites stored as JSON documents and served over a small REST API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod utils;

pub use config::Config;
pub use db::{Database, Store};
pub use error::AppError;
pub use state::AppState;
