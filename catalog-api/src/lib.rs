pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod server;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::AppError;
pub use server::{create_app, AppState};
