pub mod config;
pub mod error;
pub mod subject;
pub mod value;

pub use config::EngineConfig;
pub use error::*;
pub use subject::Subject;
pub use value::Value;
