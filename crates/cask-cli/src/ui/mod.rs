//! Terminal presentation: theme, the live reporter and tabular listings.

pub mod output;
pub mod table;
pub mod theme;

pub use output::Output;
pub use theme::{Theme, format_size};
