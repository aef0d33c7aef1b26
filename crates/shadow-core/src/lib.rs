pub mod chunker;
pub mod clearance;
pub mod config;
pub mod data_processor;
pub mod decoder;
pub mod error;
pub mod similarity;
pub mod tagging;
pub mod traits;
pub mod types;

pub use clearance::ClearanceLevel;
pub use error::{Error, Result};
