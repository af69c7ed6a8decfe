pub mod error;
pub mod types;
pub mod config;
pub mod session;
pub mod gateway;
pub mod repository;
pub mod auth;
pub mod view;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const LOGO: &str = "🎬";
