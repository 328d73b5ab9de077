//! Contract opportunities dashboard: load a SAM.gov CSV extract, apply the
//! business filters, and let the user narrow the result by status, NAICS
//! category and set-aside type.

pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use error::{Error, ErrorKind, Result};
