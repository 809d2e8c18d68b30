pub mod config;
pub mod domain;
pub mod output;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use config::OutputConfig;
pub use domain::{FieldValue, OutboundEvent, RawEvent, Value};
pub use output::{OutputStats, RiemannOutput};
pub use utils::errors::{OutputError, Result};
