//! Core abstractions for diagram processing
//!
//! This module defines the traits every diagram type implements, the shared
//! value types, errors, id allocation and logging.

pub mod chumsky_utils;
mod database;
mod detector;
mod diagram;
mod error;
mod ids;
mod layout;
pub mod logging;
mod parser;
mod renderer;
mod text;
mod types;

pub use database::*;
pub use detector::*;
pub use diagram::*;
pub use error::*;
pub use ids::*;
pub use layout::*;
pub use logging::*;
pub use parser::*;
pub use renderer::*;
pub use text::*;
pub use types::*;
