//! Bookshelf application library
//!
//! The `books` module (authors and books over REST) and the bootstrap
//! shared by the `bookshelf-app` and `bookshelf` binaries.

pub mod bootstrap;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use bootstrap::{migrate, registry, run};
pub use modules::*;
