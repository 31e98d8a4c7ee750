// src/lib.rs

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod models;
pub mod session;
pub mod utils;

// Re-export specific items for convenience if needed
pub use client::SyncClient;
pub use error::AppError;
pub use session::{Session, SessionManager};
