pub mod config;
pub mod error;
pub mod types;

pub use config::{LuluConfig, ModelApi};
pub use error::{LuluError, Result};
pub use types::*;
