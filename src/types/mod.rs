//! Common types for Greenway

pub mod error;

pub use error::{GreenwayError, Result};
