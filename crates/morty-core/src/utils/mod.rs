//! Utility functions for date and string formatting.

pub mod format;

pub use format::{format_date, format_relative, format_timestamp, or_unknown, truncate_string};
