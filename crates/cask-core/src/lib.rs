pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod install;
pub mod io;
pub mod outdated;
pub mod paths;
pub mod registry;
pub mod state;
pub mod uninstall;
pub mod zap;

pub mod reporter;

#[cfg(test)]
mod test_support;

pub use context::Context;
pub use error::InstallError;
pub use paths::*;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("cask-core/", env!("CARGO_PKG_VERSION"));
