pub mod aggregate;
pub mod coin;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod input;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
