pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod matrix;
pub mod model;
pub mod on_error;
pub mod query;
pub mod results;
pub mod storage;

pub use errors::{Result, SweepError};
