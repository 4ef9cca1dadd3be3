pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod report;
pub mod service;
pub mod upload;

pub use config::RelayConfig;
pub use error::RelayError;
pub use normalize::Analysis;
pub use service::{AppState, build_router, create_app};
pub use models::*;
