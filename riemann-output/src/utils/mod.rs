pub mod errors;
pub mod hostname;
