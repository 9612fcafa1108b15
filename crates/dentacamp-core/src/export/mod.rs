//! Printable output derived from screening records.

mod document;

pub use document::*;
