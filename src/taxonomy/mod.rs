//! Configuration taxonomies: the static catalog of list-valued documents
//! and the pure mutation semantics shared by the API and the CLI.

pub mod catalog;
pub mod lists;

pub use catalog::{ConfigDocument, ListResource};
pub use lists::{Lists, TaxonomyError};
