//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{format_bytes, format_date, format_relative, initials, truncate_string};
