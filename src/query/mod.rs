//! Query algebra: a single-field equality filter.

/// Query shape carried by a reference
pub mod shape;

/// Filter evaluation shared by reads and event dispatch
pub mod filter;

pub use shape::QueryShape;
