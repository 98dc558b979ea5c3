//! Local classification catalog.
//!
//! Loads a validated JSON snapshot of the classification tree and answers
//! tree fetches and ranked searches from memory.

mod catalog;
mod loader;
pub mod rank;

pub use catalog::Catalog;
pub use loader::{build_catalog, load_catalog, parse_catalog};
pub use rank::MatchKind;
