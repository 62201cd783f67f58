pub mod config;
pub mod error;
pub mod types;

pub use config::SleuthConfig;
pub use error::{Result, SleuthError};
pub use types::*;
