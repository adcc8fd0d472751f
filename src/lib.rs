//! Tessera Multi-Branch Library Circulation Server
//!
//! A Rust implementation of the Tessera consortium circulation engine,
//! providing a REST JSON API for borrows, returns, reservations, fine
//! policies, inventory rebalancing and inter-library shipments.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
