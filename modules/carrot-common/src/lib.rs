pub mod config;
pub mod domain;
pub mod error;
pub mod safety;

pub use config::AppConfig;
pub use domain::*;
pub use error::CarrotError;
pub use safety::*;
