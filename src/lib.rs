pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod repositories;
pub mod services;
pub mod tls;

pub use config::Config;
pub use error::{AppError, Result};
pub use parser::parse;
