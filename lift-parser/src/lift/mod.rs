//! Core of the LIFT toolchain.
//!
//! See the crate documentation for the module layout.

pub mod diagnostics;
pub mod error;
pub mod lexicon;
pub mod loader;
pub mod mapping;
pub mod markup;
pub mod model;
pub mod scalar;
pub mod schema;
pub mod serializing;
pub mod testing;
pub mod util;
pub mod version;
