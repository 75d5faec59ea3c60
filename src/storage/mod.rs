//! Storage layer
//!
//! The in-memory tree behind every database.

pub mod path_tree;

pub use path_tree::PathTree;
