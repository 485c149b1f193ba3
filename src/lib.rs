// ScannerDB Library
// Re-export modules for use in main.rs

pub mod error;
pub mod export;
pub mod favorites;
pub mod hpdb;
pub mod import;
pub mod record;

pub use error::ImportError;
