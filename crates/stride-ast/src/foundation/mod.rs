//! Foundation types shared across the tree model.

pub mod location;

pub use location::Location;
