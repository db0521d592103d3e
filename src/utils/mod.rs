pub mod discovery;
pub mod error;
pub mod logger;
pub mod validation;
