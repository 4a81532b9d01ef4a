//! Application-level utilities.
//!
//! ## Modules
//!
//! - [`app_data`] - Config file and store directory management (XDG-compliant)
//! - [`progress`] - Progress bars that compile away without the `progress` feature

pub mod app_data;
pub mod progress;

pub use app_data::*;
