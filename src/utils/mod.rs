// Utility functions
pub mod error;
pub mod text;

pub use error::*;
pub use text::*;
