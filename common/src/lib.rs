pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use self::config::*;
pub use self::error::*;
pub use self::utils::*;
